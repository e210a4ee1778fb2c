use std::{
    future::Future,
    mem,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, ready},
};

use tokio::{
    sync::oneshot,
    time::{Instant, Sleep},
};

use super::{
    PoolInner,
    error::{PoolError, PoolResult},
};
use crate::{
    Resource,
    registry::{Lease, WaiterId},
};

const POLLED_AFTER_COMPLETION: &str = "Acquire should not be polled after it completed";

/// Future returned by [`crate::Pool::acquire`]. Resolves to the acquired
/// resource, or to [`PoolError::Timeout`] once the pool's
/// [`crate::PoolConfig::acquire_timeout`] has elapsed.
///
/// The pool's bookkeeping is already updated when this future is created:
/// either a resource was moved to in-use, or a waiter was queued. Dropping
/// the future before it completes withdraws the waiter, and any resource it
/// was given but never returned is released back to the pool, unless the
/// resource has since been removed.
///
/// A queued waiter whose deadline has passed is never given a resource,
/// even if this future has not been polled since.
#[must_use = "dropping an Acquire gives its resource back to the pool"]
pub struct Acquire<R: Resource> {
    pool: Arc<PoolInner<R>>,
    state: AcquireState<R>,
}

enum AcquireState<R> {
    Ready(R, Lease),
    Waiting(Waiting<R>),
    Done,
}

struct Waiting<R> {
    id: WaiterId,
    receiver: oneshot::Receiver<(R, Lease)>,
    deadline: Option<Instant>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl<R: Resource> Acquire<R> {
    pub(super) fn ready(pool: Arc<PoolInner<R>>, resource: R, lease: Lease) -> Self {
        Self {
            pool,
            state: AcquireState::Ready(resource, lease),
        }
    }

    pub(super) fn waiting(
        pool: Arc<PoolInner<R>>,
        id: WaiterId,
        receiver: oneshot::Receiver<(R, Lease)>,
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            pool,
            state: AcquireState::Waiting(Waiting {
                id,
                receiver,
                deadline,
                sleep: None,
            }),
        }
    }
}

impl<R: Resource> Waiting<R> {
    fn poll_outcome(&mut self, pool: &PoolInner<R>, cx: &mut Context<'_>) -> Poll<PoolResult<R>> {
        if let Poll::Ready(received) = Pin::new(&mut self.receiver).poll(cx) {
            // A closed channel means the registry dropped the waiter as expired.
            return Poll::Ready(
                received
                    .map(|(resource, _)| resource)
                    .map_err(|_| timed_out()),
            );
        }

        let Some(deadline) = self.deadline else {
            return Poll::Pending;
        };
        let sleep = self
            .sleep
            .get_or_insert_with(|| Box::pin(tokio::time::sleep_until(deadline)));
        ready!(sleep.as_mut().poll(cx));

        if pool.registry.withdraw(self.id) {
            return Poll::Ready(Err(timed_out()));
        }
        // Either fulfilled after the receiver was polled, or already dropped
        // by the registry as expired.
        Poll::Ready(
            self.receiver
                .try_recv()
                .map(|(resource, _)| resource)
                .map_err(|_| timed_out()),
        )
    }
}

fn timed_out() -> PoolError {
    tracing::debug!("timed out waiting for a resource");
    PoolError::Timeout
}

impl<R: Resource> Future for Acquire<R> {
    type Output = PoolResult<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        match mem::replace(&mut this.state, AcquireState::Done) {
            AcquireState::Ready(resource, _) => Poll::Ready(Ok(resource)),
            AcquireState::Waiting(mut waiting) => {
                let outcome = waiting.poll_outcome(&this.pool, cx);
                if outcome.is_pending() {
                    this.state = AcquireState::Waiting(waiting);
                }
                outcome
            }
            AcquireState::Done => panic!("{POLLED_AFTER_COMPLETION}"),
        }
    }
}

impl<R: Resource> Unpin for Acquire<R> {}

impl<R: Resource> Drop for Acquire<R> {
    fn drop(&mut self) {
        let unclaimed = match mem::replace(&mut self.state, AcquireState::Done) {
            AcquireState::Ready(resource, lease) => Some((resource, lease)),
            AcquireState::Waiting(mut waiting) => {
                if self.pool.registry.withdraw(waiting.id) {
                    None
                } else {
                    waiting.receiver.try_recv().ok()
                }
            }
            AcquireState::Done => None,
        };
        if let Some((resource, lease)) = unclaimed {
            tracing::trace!("acquire dropped before completion, releasing its resource");
            self.pool.registry.release_leased(resource, lease);
        }
    }
}

impl<R: Resource> std::fmt::Debug for Acquire<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            AcquireState::Ready(..) => "Ready",
            AcquireState::Waiting(_) => "Waiting",
            AcquireState::Done => "Done",
        };
        write!(f, "Acquire {{ state: {state} }}")
    }
}
