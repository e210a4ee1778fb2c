use std::collections::VecDeque;

use tokio::{sync::oneshot, time::Instant};

use super::tracked::Lease;

/// Identifies a queued waiter so its future can withdraw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaiterId(u64);

/// A pending acquisition. Owns the sending half of the channel its
/// future is listening on.
pub struct Waiter<R> {
    id: WaiterId,
    deadline: Option<Instant>,
    sender: oneshot::Sender<(R, Lease)>,
}

impl<R> Waiter<R> {
    /// Hands the resource to the waiting future, or gives it back if the
    /// future has gone away.
    pub fn fulfill(self, resource: R, lease: Lease) -> Result<(), R> {
        self.sender
            .send((resource, lease))
            .map_err(|(resource, _)| resource)
    }

    fn has_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }
}

pub struct WaitQueue<R> {
    waiters: VecDeque<Waiter<R>>,
    next_id: u64,
}

impl<R> WaitQueue<R> {
    pub fn new() -> Self {
        Self {
            waiters: VecDeque::new(),
            next_id: 0,
        }
    }

    pub fn enqueue(
        &mut self,
        deadline: Option<Instant>,
    ) -> (WaiterId, oneshot::Receiver<(R, Lease)>) {
        let id = WaiterId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let (sender, receiver) = oneshot::channel();
        self.waiters.push_back(Waiter {
            id,
            deadline,
            sender,
        });
        (id, receiver)
    }

    /// Pops the oldest waiter whose deadline has not passed. Expired waiters
    /// are dropped on the way, their futures see the closed channel.
    pub fn pop_oldest(&mut self, now: Instant) -> Option<Waiter<R>> {
        while let Some(waiter) = self.waiters.pop_front() {
            if !waiter.has_expired(now) {
                return Some(waiter);
            }
        }
        None
    }

    /// Drops every waiter whose deadline has passed.
    pub fn prune_expired(&mut self, now: Instant) {
        self.waiters.retain(|waiter| !waiter.has_expired(now));
    }

    /// Removes the waiter if it is still queued. Returns false once it has
    /// been popped or pruned.
    pub fn withdraw(&mut self, id: WaiterId) -> bool {
        match self.waiters.iter().position(|waiter| waiter.id == id) {
            Some(index) => {
                self.waiters.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use googletest::prelude::*;

    use super::*;

    const LEASE: Lease = Lease(0);

    #[googletest::test]
    fn waiters_are_popped_in_enqueue_order() {
        let mut queue: WaitQueue<usize> = WaitQueue::new();
        let (_first, mut first_receiver) = queue.enqueue(None);
        let (_second, mut second_receiver) = queue.enqueue(None);
        let now = Instant::now();

        expect_that!(queue.pop_oldest(now).unwrap().fulfill(1, LEASE), ok(anything()));
        expect_that!(queue.pop_oldest(now).unwrap().fulfill(2, LEASE), ok(anything()));

        expect_that!(first_receiver.try_recv().ok().map(|(resource, _)| resource), some(eq(1)));
        expect_that!(second_receiver.try_recv().ok().map(|(resource, _)| resource), some(eq(2)));
        expect_that!(queue.len(), eq(0));
    }

    #[googletest::test]
    fn pop_oldest_skips_expired_waiters() {
        let mut queue: WaitQueue<usize> = WaitQueue::new();
        let now = Instant::now();
        let (_expired, mut expired_receiver) = queue.enqueue(Some(now));
        let (live, _live_receiver) = queue.enqueue(Some(now + Duration::from_secs(60)));

        expect_that!(queue.pop_oldest(now).map(|waiter| waiter.id), some(eq(live)));
        expect_that!(expired_receiver.try_recv().is_err(), eq(true));
        expect_that!(queue.len(), eq(0));
    }

    #[googletest::test]
    fn prune_expired_keeps_waiters_without_deadline() {
        let mut queue: WaitQueue<usize> = WaitQueue::new();
        let now = Instant::now();
        let (_expired, _expired_receiver) = queue.enqueue(Some(now));
        let (forever, _forever_receiver) = queue.enqueue(None);

        queue.prune_expired(now);

        expect_that!(queue.len(), eq(1));
        expect_that!(queue.withdraw(forever), eq(true));
    }

    #[googletest::test]
    fn withdraw_removes_only_the_matching_waiter() {
        let mut queue: WaitQueue<usize> = WaitQueue::new();
        let (first, _first_receiver) = queue.enqueue(None);
        let (second, _second_receiver) = queue.enqueue(None);

        expect_that!(queue.withdraw(first), eq(true));
        expect_that!(queue.withdraw(first), eq(false));
        expect_that!(queue.len(), eq(1));
        expect_that!(
            queue.pop_oldest(Instant::now()).map(|waiter| waiter.id),
            some(eq(second))
        );
        expect_that!(queue.withdraw(second), eq(false));
    }

    #[googletest::test]
    fn fulfill_gives_the_resource_back_if_the_receiver_is_gone() {
        let mut queue: WaitQueue<&str> = WaitQueue::new();
        let (_id, receiver) = queue.enqueue(None);
        drop(receiver);

        expect_that!(
            queue.pop_oldest(Instant::now()).unwrap().fulfill("conn", LEASE),
            err(eq("conn"))
        );
    }
}
