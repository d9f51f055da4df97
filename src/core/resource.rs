use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::process::ProcessId;

/// Handle to a resource pool registered with the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub(crate) usize);

/// Grant priority: lower values are served first. Ties resolve FIFO.
pub type Priority = u8;

#[derive(Debug)]
struct Waiter {
    priority: Priority,
    ticket: u64,
    process: ProcessId,
}

impl PartialEq for Waiter {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.ticket == other.ticket
    }
}

impl Eq for Waiter {}

impl PartialOrd for Waiter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Waiter {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap: lowest priority value first,
        // earliest ticket within a priority.
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.ticket.cmp(&self.ticket))
    }
}

/// Fixed-capacity mutual-exclusion pool with a priority wait queue.
///
/// A unit released while waiters queue is handed over directly, so the
/// in-use count never dips below the demand and never exceeds capacity.
#[derive(Debug)]
pub struct ResourcePool {
    name: String,
    capacity: usize,
    in_use: usize,
    peak_in_use: usize,
    waiters: BinaryHeap<Waiter>,
    ticket_counter: u64,
}

impl ResourcePool {
    pub(crate) fn new(name: &str, capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            in_use: 0,
            peak_in_use: 0,
            waiters: BinaryHeap::new(),
            ticket_counter: 0,
        }
    }

    /// Request one unit for `process`. Returns true when granted immediately;
    /// otherwise the process is queued and will be granted on a release.
    pub(crate) fn acquire(&mut self, process: ProcessId, priority: Priority) -> bool {
        if self.in_use < self.capacity {
            self.in_use += 1;
            if self.in_use > self.peak_in_use {
                self.peak_in_use = self.in_use;
            }
            true
        } else {
            self.waiters.push(Waiter {
                priority,
                ticket: self.ticket_counter,
                process,
            });
            self.ticket_counter += 1;
            false
        }
    }

    /// Give one unit back. If anyone is waiting, the unit transfers to the
    /// best-ranked waiter and that process is returned for rescheduling.
    pub(crate) fn release(&mut self) -> Option<ProcessId> {
        if let Some(next) = self.waiters.pop() {
            Some(next.process)
        } else {
            self.in_use = self.in_use.saturating_sub(1);
            None
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Units currently held.
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// High-water mark of concurrently held units over the run.
    pub fn peak_in_use(&self) -> usize {
        self.peak_in_use
    }

    pub fn queue_len(&self) -> usize {
        self.waiters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grants_up_to_capacity() {
        let mut pool = ResourcePool::new("oven", 2);
        assert!(pool.acquire(ProcessId(1), 2));
        assert!(pool.acquire(ProcessId(2), 2));
        assert!(!pool.acquire(ProcessId(3), 2));
        assert_eq!(pool.in_use(), 2);
        assert_eq!(pool.queue_len(), 1);
        assert_eq!(pool.peak_in_use(), 2);
    }

    #[test]
    fn test_release_hands_unit_to_best_waiter() {
        let mut pool = ResourcePool::new("drivers", 1);
        assert!(pool.acquire(ProcessId(1), 2));
        assert!(!pool.acquire(ProcessId(2), 2));
        assert!(!pool.acquire(ProcessId(3), 1));

        // The priority-1 waiter jumps the earlier priority-2 one.
        assert_eq!(pool.release(), Some(ProcessId(3)));
        assert_eq!(pool.in_use(), 1, "unit transfers without dropping in-use");
        assert_eq!(pool.release(), Some(ProcessId(2)));
        assert_eq!(pool.release(), None);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_equal_priority_is_fifo() {
        let mut pool = ResourcePool::new("workers", 1);
        assert!(pool.acquire(ProcessId(1), 2));
        assert!(!pool.acquire(ProcessId(2), 2));
        assert!(!pool.acquire(ProcessId(3), 2));
        assert!(!pool.acquire(ProcessId(4), 2));

        assert_eq!(pool.release(), Some(ProcessId(2)));
        assert_eq!(pool.release(), Some(ProcessId(3)));
        assert_eq!(pool.release(), Some(ProcessId(4)));
    }

    #[test]
    fn test_peak_tracks_high_water_mark() {
        let mut pool = ResourcePool::new("lines", 3);
        assert!(pool.acquire(ProcessId(1), 0));
        assert!(pool.acquire(ProcessId(2), 0));
        pool.release();
        pool.release();
        assert!(pool.acquire(ProcessId(3), 0));
        assert_eq!(pool.peak_in_use(), 2);
        assert_eq!(pool.in_use(), 1);
    }
}
