use std::collections::VecDeque;

use super::process::ProcessId;

/// Handle to a stock container registered with the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinId(pub(crate) usize);

#[derive(Debug)]
struct PendingTake {
    amount: f64,
    process: ProcessId,
}

/// Bounded numeric stock with blocking takes and a replenished broadcast.
///
/// Takes queue FIFO and are served from the head: a head that cannot be
/// satisfied blocks everyone behind it until a put raises the level. The
/// restock wait-list is a one-shot signal drained whenever a refill lands.
#[derive(Debug)]
pub struct StockBin {
    name: String,
    capacity: f64,
    level: f64,
    min_level: f64,
    max_level: f64,
    refilling: bool,
    take_queue: VecDeque<PendingTake>,
    restock_waiters: Vec<ProcessId>,
}

impl StockBin {
    pub(crate) fn new(name: &str, capacity: f64) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            level: capacity,
            min_level: capacity,
            max_level: capacity,
            refilling: false,
            take_queue: VecDeque::new(),
            restock_waiters: Vec::new(),
        }
    }

    /// Attempt to take `amount` for `process`. Returns true when the take
    /// completed immediately; otherwise the process queues until a put.
    /// Non-positive amounts complete immediately without touching the level.
    pub(crate) fn try_take(&mut self, process: ProcessId, amount: f64) -> bool {
        if amount <= 0.0 {
            return true;
        }
        if self.take_queue.is_empty() && self.level >= amount {
            self.deduct(amount);
            true
        } else {
            self.take_queue.push_back(PendingTake { amount, process });
            false
        }
    }

    /// Add stock (clamped to capacity) and serve queued takes from the head
    /// while they fit. Returns the processes whose takes completed.
    pub(crate) fn put(&mut self, amount: f64) -> Vec<ProcessId> {
        self.level = (self.level + amount.max(0.0)).min(self.capacity);
        if self.level > self.max_level {
            self.max_level = self.level;
        }

        let mut served = Vec::new();
        loop {
            match self.take_queue.front() {
                Some(front) if front.amount <= self.level => {
                    if let Some(take) = self.take_queue.pop_front() {
                        self.deduct(take.amount);
                        served.push(take.process);
                    }
                }
                _ => break,
            }
        }
        served
    }

    /// Park `process` until the next replenished signal.
    pub(crate) fn await_restock(&mut self, process: ProcessId) {
        self.restock_waiters.push(process);
    }

    /// Fire the one-shot replenished signal, waking every parked process.
    pub(crate) fn drain_restock_waiters(&mut self) -> Vec<ProcessId> {
        std::mem::take(&mut self.restock_waiters)
    }

    fn deduct(&mut self, amount: f64) {
        self.level -= amount;
        if self.level < self.min_level {
            self.min_level = self.level;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Lowest level observed over the run.
    pub fn min_level(&self) -> f64 {
        self.min_level
    }

    /// Highest level observed over the run.
    pub fn max_level(&self) -> f64 {
        self.max_level
    }

    pub fn is_refilling(&self) -> bool {
        self.refilling
    }

    pub(crate) fn set_refilling(&mut self, on: bool) {
        self.refilling = on;
    }

    pub fn queue_len(&self) -> usize {
        self.take_queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_deducts_when_available() {
        let mut bin = StockBin::new("sauce", 100.0);
        assert!(bin.try_take(ProcessId(1), 30.0));
        assert_eq!(bin.level(), 70.0);
        assert_eq!(bin.min_level(), 70.0);
    }

    #[test]
    fn test_insufficient_take_blocks() {
        let mut bin = StockBin::new("cheese", 50.0);
        assert!(bin.try_take(ProcessId(1), 40.0));
        assert!(!bin.try_take(ProcessId(2), 20.0));
        assert_eq!(bin.level(), 10.0, "blocked take must not touch the level");
        assert_eq!(bin.queue_len(), 1);

        let served = bin.put(40.0);
        assert_eq!(served, vec![ProcessId(2)]);
        assert_eq!(bin.level(), 30.0);
    }

    #[test]
    fn test_head_of_line_blocking() {
        let mut bin = StockBin::new("meat", 10.0);
        assert!(bin.try_take(ProcessId(1), 10.0));
        assert!(!bin.try_take(ProcessId(2), 8.0));
        // Process 3 asks for less than a future put will cover, but it sits
        // behind process 2 and must not be served out of order.
        assert!(!bin.try_take(ProcessId(3), 1.0));

        let served = bin.put(5.0);
        assert!(served.is_empty(), "head needs 8, only 5 available");
        assert_eq!(bin.level(), 5.0);

        let served = bin.put(5.0);
        assert_eq!(served, vec![ProcessId(2), ProcessId(3)]);
        assert_eq!(bin.level(), 1.0);
    }

    #[test]
    fn test_put_clamps_to_capacity() {
        let mut bin = StockBin::new("sauce", 100.0);
        assert!(bin.try_take(ProcessId(1), 20.0));
        bin.put(500.0);
        assert_eq!(bin.level(), 100.0);
        assert_eq!(bin.max_level(), 100.0);
    }

    #[test]
    fn test_zero_amount_take_is_noop() {
        let mut bin = StockBin::new("pepperoni", 10.0);
        assert!(bin.try_take(ProcessId(1), 0.0));
        assert_eq!(bin.level(), 10.0);
        assert_eq!(bin.queue_len(), 0);
    }

    #[test]
    fn test_restock_waiters_drain_once() {
        let mut bin = StockBin::new("cheese", 10.0);
        bin.await_restock(ProcessId(4));
        bin.await_restock(ProcessId(5));
        assert_eq!(bin.drain_restock_waiters(), vec![ProcessId(4), ProcessId(5)]);
        assert!(bin.drain_restock_waiters().is_empty());
    }
}
