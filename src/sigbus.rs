//! The injected SIGBUS-queue capability.
//!
//! Installing the actual signal handler that captures faulting addresses is
//! not this crate's job; `process_sigbus` only ever consumes a pop-queue
//! interface, so the cache stays testable without ever touching
//! `sigaction`.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;

/// Something that can hand back faulting addresses captured by an external
/// SIGBUS handler, one at a time.
pub trait SigbusQueue {
    /// Pops one faulting address, if any is queued.
    fn pop(&self) -> Result<Option<usize>>;
}

/// A fixed-capacity, single-producer/single-consumer ring buffer of
/// faulting addresses, safe to push into from signal context.
///
/// This is the production-shaped implementation of [`SigbusQueue`]: the
/// (external, out-of-scope) signal handler calls [`push`](Self::push), and
/// [`crate::Cache::process_sigbus`] calls [`pop`](SigbusQueue::pop) from
/// ordinary thread context. No locks, no allocation after construction.
pub struct AtomicRingQueue<const N: usize> {
    slots: [AtomicUsize; N],
    /// One more than the last occupied slot's sequence number; `EMPTY`
    /// marks a slot as not-yet-written.
    head: AtomicUsize,
    tail: AtomicUsize,
}

const EMPTY: usize = usize::MAX;

impl<const N: usize> AtomicRingQueue<N> {
    /// Creates an empty queue with capacity `N`.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| AtomicUsize::new(EMPTY)),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Pushes a faulting address. Returns `false` if the queue is full, in
    /// which case the address is dropped (matching the kernel's own
    /// bounded SIGBUS queue, which this mirrors).
    ///
    /// Safe to call from a signal handler: only atomic loads/stores, no
    /// allocation, no blocking.
    pub fn push(&self, addr: usize) -> bool {
        debug_assert_ne!(addr, EMPTY, "address collides with the empty sentinel");

        let tail = self.tail.load(Ordering::Relaxed);
        let slot = &self.slots[tail % N];

        if slot.load(Ordering::Acquire) != EMPTY {
            return false;
        }

        slot.store(addr, Ordering::Release);
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        true
    }
}

impl<const N: usize> Default for AtomicRingQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SigbusQueue for AtomicRingQueue<N> {
    fn pop(&self) -> Result<Option<usize>> {
        let head = self.head.load(Ordering::Relaxed);
        let slot = &self.slots[head % N];

        let addr = slot.load(Ordering::Acquire);
        if addr == EMPTY {
            return Ok(None);
        }

        slot.store(EMPTY, Ordering::Release);
        self.head.store(head.wrapping_add(1), Ordering::Release);
        Ok(Some(addr))
    }
}

/// A `SigbusQueue` that never has anything queued; useful when wiring up a
/// cache in contexts that don't care about fault recovery (e.g. read-only
/// workloads against files nobody else can truncate).
pub struct EmptyQueue;

impl SigbusQueue for EmptyQueue {
    fn pop(&self) -> Result<Option<usize>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_fifo() {
        let q: AtomicRingQueue<4> = AtomicRingQueue::new();
        assert!(q.push(10));
        assert!(q.push(20));
        assert_eq!(q.pop().unwrap(), Some(10));
        assert_eq!(q.pop().unwrap(), Some(20));
        assert_eq!(q.pop().unwrap(), None);
    }

    #[test]
    fn overflow_drops_and_reports_false() {
        let q: AtomicRingQueue<2> = AtomicRingQueue::new();
        assert!(q.push(1));
        assert!(q.push(2));
        assert!(!q.push(3));
        assert_eq!(q.pop().unwrap(), Some(1));
        assert!(q.push(3));
        assert_eq!(q.pop().unwrap(), Some(2));
        assert_eq!(q.pop().unwrap(), Some(3));
    }

    #[test]
    fn empty_queue_never_pops() {
        let q = EmptyQueue;
        assert_eq!(q.pop().unwrap(), None);
    }
}
