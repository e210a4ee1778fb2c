mod tracked;
mod wait_queue;

use std::sync::{Mutex, MutexGuard};

use tokio::{sync::oneshot, time::Instant};
use tracked::TrackedResources;
use wait_queue::WaitQueue;

use crate::{PoolStatus, Resource};

pub use tracked::Lease;
pub use wait_queue::WaiterId;

const POISONED_MUTEX_ERROR: &str = "Pool registry mutex should not be poisoned";

/// Outcome of [`Registry::acquire`].
pub enum Acquired<R> {
    /// An idle handle was moved to in-use.
    Now(R, Lease),
    /// Nothing was idle, the caller was queued.
    Queued(WaiterId, oneshot::Receiver<(R, Lease)>),
}

/// All bookkeeping of a pool behind a single lock.
pub struct Registry<R> {
    state: Mutex<RegistryState<R>>,
}

struct RegistryState<R> {
    tracked: TrackedResources<R>,
    waiters: WaitQueue<R>,
}

impl<R: Resource> Registry<R> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                tracked: TrackedResources::new(),
                waiters: WaitQueue::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState<R>> {
        self.state.lock().expect(POISONED_MUTEX_ERROR)
    }

    pub fn add(&self, resource: R) -> bool {
        let mut state = self.lock();
        if state.tracked.contains(&resource) {
            return false;
        }
        state.hand_over(resource);
        tracing::debug!(
            available = state.tracked.idle(),
            in_use = state.tracked.in_use(),
            "resource added to pool"
        );
        true
    }

    pub fn remove(&self, resource: &R) -> bool {
        let mut state = self.lock();
        let removed = state.tracked.remove(resource);
        if removed {
            tracing::debug!(
                available = state.tracked.idle(),
                in_use = state.tracked.in_use(),
                "resource removed from pool"
            );
        }
        removed
    }

    pub fn acquire(&self, deadline: Option<Instant>) -> Acquired<R> {
        let mut state = self.lock();
        match state.tracked.take_idle() {
            Some((resource, lease)) => {
                tracing::trace!(available = state.tracked.idle(), "acquired idle resource");
                Acquired::Now(resource, lease)
            }
            None => {
                let (id, receiver) = state.waiters.enqueue(deadline);
                tracing::trace!(waiting = state.waiters.len(), "no idle resource, queued");
                Acquired::Queued(id, receiver)
            }
        }
    }

    /// Removes a queued waiter. Returns false if it was already fulfilled
    /// or dropped for being past its deadline.
    pub fn withdraw(&self, id: WaiterId) -> bool {
        self.lock().waiters.withdraw(id)
    }

    /// Returns an in-use handle. Untracked handles are ignored.
    pub fn release(&self, resource: R) -> bool {
        let mut state = self.lock();
        if !state.tracked.unmark_in_use(&resource) {
            return false;
        }
        state.hand_over(resource);
        true
    }

    /// Returns a handle only if it is still held under `lease`, so a stale
    /// acquisition cannot free a handle that was re-added and re-acquired.
    pub fn release_leased(&self, resource: R, lease: Lease) -> bool {
        let mut state = self.lock();
        if !state.tracked.unmark_leased(&resource, lease) {
            return false;
        }
        state.hand_over(resource);
        true
    }

    pub fn contains(&self, resource: &R) -> bool {
        self.lock().tracked.contains(resource)
    }

    pub fn status(&self) -> PoolStatus {
        let mut state = self.lock();
        state.waiters.prune_expired(Instant::now());
        let available = state.tracked.idle();
        let in_use = state.tracked.in_use();
        PoolStatus {
            size: available + in_use,
            available,
            in_use,
            waiting: state.waiters.len(),
        }
    }
}

impl<R: Resource> RegistryState<R> {
    /// Gives the handle to the oldest waiter that is still listening and
    /// within its deadline, otherwise makes it idle. The handle is in-use
    /// before the waiter can see it.
    fn hand_over(&mut self, mut resource: R) {
        let now = Instant::now();
        while let Some(waiter) = self.waiters.pop_oldest(now) {
            let lease = self.tracked.mark_in_use(resource.clone());
            match waiter.fulfill(resource, lease) {
                Ok(()) => {
                    tracing::trace!(waiting = self.waiters.len(), "resource handed to waiter");
                    return;
                }
                Err(returned) => {
                    self.tracked.unmark_in_use(&returned);
                    resource = returned;
                }
            }
        }
        self.tracked.push_idle(resource);
    }
}
