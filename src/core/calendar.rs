use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::process::ProcessId;

/// Continuous simulation time, in hours since midnight of day 0.
pub type SimTime = f64;

/// A pending wakeup for a suspended process.
#[derive(Debug)]
pub struct ScheduledWake {
    pub at: SimTime,
    pub sequence_num: u64,
    pub process: ProcessId,
}

impl PartialEq for ScheduledWake {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.sequence_num == other.sequence_num
    }
}

impl Eq for ScheduledWake {}

impl PartialOrd for ScheduledWake {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledWake {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default);
        // total_cmp gives a total order over the f64 timestamps.
        other
            .at
            .total_cmp(&self.at)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Min-queue of process wakeups ordered by time, FIFO within the same instant.
pub struct EventCalendar {
    queue: BinaryHeap<ScheduledWake>,
    sequence_counter: u64,
}

impl EventCalendar {
    /// Create an empty calendar.
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            sequence_counter: 0,
        }
    }

    /// Schedule a wakeup for `process` at absolute time `at`.
    pub fn schedule(&mut self, process: ProcessId, at: SimTime) {
        let wake = ScheduledWake {
            at,
            sequence_num: self.sequence_counter,
            process,
        };

        self.queue.push(wake);
        self.sequence_counter += 1;
    }

    /// Pop the earliest wakeup, if any.
    pub fn next(&mut self) -> Option<ScheduledWake> {
        self.queue.pop()
    }

    /// Check whether any wakeups remain.
    pub fn has_events(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Peek the time of the earliest wakeup without removing it.
    pub fn peek_next_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|wake| wake.at)
    }

    /// Number of pending wakeups.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for EventCalendar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_time_order() {
        let mut calendar = EventCalendar::new();
        calendar.schedule(ProcessId(1), 5.0);
        calendar.schedule(ProcessId(2), 1.5);
        calendar.schedule(ProcessId(3), 3.25);

        let order: Vec<u64> = std::iter::from_fn(|| calendar.next())
            .map(|w| w.process.0)
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_same_instant_is_fifo() {
        let mut calendar = EventCalendar::new();
        calendar.schedule(ProcessId(10), 2.0);
        calendar.schedule(ProcessId(11), 2.0);
        calendar.schedule(ProcessId(12), 2.0);

        let order: Vec<u64> = std::iter::from_fn(|| calendar.next())
            .map(|w| w.process.0)
            .collect();
        assert_eq!(order, vec![10, 11, 12], "ties must resolve in schedule order");
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut calendar = EventCalendar::new();
        assert!(calendar.peek_next_time().is_none());
        calendar.schedule(ProcessId(1), 4.0);
        assert_eq!(calendar.peek_next_time(), Some(4.0));
        assert_eq!(calendar.len(), 1);
        assert!(calendar.has_events());
    }
}
