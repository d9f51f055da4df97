use std::collections::HashMap;

use log::debug;

use super::calendar::{EventCalendar, SimTime};
use super::container::{BinId, StockBin};
use super::process::{Flow, Process, ProcessId};
use super::resource::{Priority, ResourceId, ResourcePool};

/// How a run came to its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The terminal signal fired.
    Terminated,
    /// The calendar drained before any terminal signal; treated as natural
    /// completion, not an error.
    CalendarExhausted,
}

/// Registers the static facilities of a run before the model exists, so the
/// model can be constructed holding the handles it needs.
pub struct KernelBuilder {
    resources: Vec<ResourcePool>,
    bins: Vec<StockBin>,
}

impl KernelBuilder {
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
            bins: Vec::new(),
        }
    }

    /// Register a resource pool and get its handle.
    pub fn add_resource(&mut self, name: &str, capacity: usize) -> Result<ResourceId, String> {
        if capacity == 0 {
            return Err(format!("resource '{}' must have capacity > 0", name));
        }
        let id = ResourceId(self.resources.len());
        self.resources.push(ResourcePool::new(name, capacity));
        Ok(id)
    }

    /// Register a stock container (initially full) and get its handle.
    pub fn add_container(&mut self, name: &str, capacity: f64) -> Result<BinId, String> {
        if !(capacity > 0.0) || !capacity.is_finite() {
            return Err(format!(
                "container '{}' must have a positive finite capacity, got {}",
                name, capacity
            ));
        }
        let id = BinId(self.bins.len());
        self.bins.push(StockBin::new(name, capacity));
        Ok(id)
    }

    /// Finish construction, attaching the model state.
    pub fn build<M>(self, model: M) -> Kernel<M> {
        Kernel {
            clock: 0.0,
            calendar: EventCalendar::new(),
            resources: self.resources,
            bins: self.bins,
            table: HashMap::new(),
            watchers: HashMap::new(),
            join_pending: HashMap::new(),
            spawn_buf: Vec::new(),
            next_pid: 0,
            terminal: false,
            model,
        }
    }
}

impl Default for KernelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-threaded cooperative event kernel.
///
/// Owns the clock, the calendar, the facilities and every live process; all
/// model-state mutation happens inside `Process::resume` calls driven from
/// `run`, so a run needs no synchronization whatsoever.
pub struct Kernel<M> {
    clock: SimTime,
    calendar: EventCalendar,
    resources: Vec<ResourcePool>,
    bins: Vec<StockBin>,
    table: HashMap<ProcessId, Box<dyn Process<M>>>,
    /// child -> parents blocked on it via JoinAll
    watchers: HashMap<ProcessId, Vec<ProcessId>>,
    /// parent -> children still running
    join_pending: HashMap<ProcessId, usize>,
    spawn_buf: Vec<(ProcessId, Box<dyn Process<M>>)>,
    next_pid: u64,
    terminal: bool,
    model: M,
}

impl<M> Kernel<M> {
    /// Register a root process; its first resume happens at the current clock.
    pub fn spawn(&mut self, process: Box<dyn Process<M>>) -> ProcessId {
        let pid = ProcessId(self.next_pid);
        self.next_pid += 1;
        self.table.insert(pid, process);
        self.calendar.schedule(pid, self.clock);
        pid
    }

    /// Drive the run until the terminal signal or calendar exhaustion.
    pub fn run(&mut self) -> RunOutcome {
        while !self.terminal {
            let Some(wake) = self.calendar.next() else {
                debug!("[kernel] calendar exhausted at t={:.4}; ending run", self.clock);
                return RunOutcome::CalendarExhausted;
            };
            self.clock = wake.at;
            self.step(wake.process);
        }
        debug!("[kernel] terminal signal honored at t={:.4}", self.clock);
        RunOutcome::Terminated
    }

    fn step(&mut self, pid: ProcessId) {
        // A wake can outlive its target; stale wakeups are skipped.
        let Some(mut process) = self.table.remove(&pid) else {
            return;
        };

        let flow = {
            let mut sim = Sim {
                clock: self.clock,
                calendar: &mut self.calendar,
                resources: &mut self.resources,
                bins: &mut self.bins,
                spawn_buf: &mut self.spawn_buf,
                next_pid: &mut self.next_pid,
                terminal: &mut self.terminal,
                model: &mut self.model,
            };
            process.resume(&mut sim)
        };

        // Children spawned during the resume become joinable before the
        // parent's own flow request is interpreted.
        for (child_id, child) in self.spawn_buf.drain(..) {
            self.table.insert(child_id, child);
        }

        match flow {
            Flow::Hold(duration) => {
                self.calendar.schedule(pid, self.clock + duration.max(0.0));
                self.table.insert(pid, process);
            }
            Flow::Acquire(resource, priority) => {
                if self.resources[resource.0].acquire(pid, priority) {
                    self.calendar.schedule(pid, self.clock);
                }
                self.table.insert(pid, process);
            }
            Flow::TakeStock(bin, amount) => {
                if self.bins[bin.0].try_take(pid, amount) {
                    self.calendar.schedule(pid, self.clock);
                }
                self.table.insert(pid, process);
            }
            Flow::AwaitRestock(bin) => {
                self.bins[bin.0].await_restock(pid);
                self.table.insert(pid, process);
            }
            Flow::JoinAll(children) => {
                let alive: Vec<ProcessId> = children
                    .into_iter()
                    .filter(|child| self.table.contains_key(child))
                    .collect();
                if alive.is_empty() {
                    self.calendar.schedule(pid, self.clock);
                } else {
                    self.join_pending.insert(pid, alive.len());
                    for child in alive {
                        self.watchers.entry(child).or_default().push(pid);
                    }
                }
                self.table.insert(pid, process);
            }
            Flow::Done => {
                self.finish(pid);
            }
        }
    }

    /// Settle join bookkeeping for a completed process.
    fn finish(&mut self, pid: ProcessId) {
        let Some(parents) = self.watchers.remove(&pid) else {
            return;
        };
        for parent in parents {
            if let Some(pending) = self.join_pending.get_mut(&parent) {
                *pending -= 1;
                if *pending == 0 {
                    self.join_pending.remove(&parent);
                    self.calendar.schedule(parent, self.clock);
                }
            }
        }
    }

    pub fn now(&self) -> SimTime {
        self.clock
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn resources(&self) -> &[ResourcePool] {
        &self.resources
    }

    pub fn bins(&self) -> &[StockBin] {
        &self.bins
    }

    /// Live processes (suspended or about to wake).
    pub fn live_processes(&self) -> usize {
        self.table.len()
    }

    /// Tear the kernel down, releasing the model state.
    pub fn into_model(self) -> M {
        self.model
    }
}

/// The kernel view handed to a process while it resumes.
///
/// Suspending operations are requested through the returned `Flow`;
/// everything here completes synchronously at the current instant.
pub struct Sim<'a, M> {
    clock: SimTime,
    calendar: &'a mut EventCalendar,
    resources: &'a mut Vec<ResourcePool>,
    bins: &'a mut Vec<StockBin>,
    spawn_buf: &'a mut Vec<(ProcessId, Box<dyn Process<M>>)>,
    next_pid: &'a mut u64,
    terminal: &'a mut bool,
    pub model: &'a mut M,
}

impl<'a, M> Sim<'a, M> {
    pub fn now(&self) -> SimTime {
        self.clock
    }

    /// Start a child process; its first resume is scheduled at the current
    /// instant, after already-pending wakeups.
    pub fn spawn(&mut self, process: Box<dyn Process<M>>) -> ProcessId {
        let pid = ProcessId(*self.next_pid);
        *self.next_pid += 1;
        self.spawn_buf.push((pid, process));
        self.calendar.schedule(pid, self.clock);
        pid
    }

    /// Give back one unit of `resource`, waking the best-ranked waiter.
    pub fn release(&mut self, resource: ResourceId) {
        if let Some(next) = self.resources[resource.0].release() {
            self.calendar.schedule(next, self.clock);
        }
    }

    pub fn resource_in_use(&self, resource: ResourceId) -> usize {
        self.resources[resource.0].in_use()
    }

    pub fn resource_capacity(&self, resource: ResourceId) -> usize {
        self.resources[resource.0].capacity()
    }

    pub fn stock_level(&self, bin: BinId) -> f64 {
        self.bins[bin.0].level()
    }

    pub fn stock_capacity(&self, bin: BinId) -> f64 {
        self.bins[bin.0].capacity()
    }

    pub fn is_refilling(&self, bin: BinId) -> bool {
        self.bins[bin.0].is_refilling()
    }

    pub fn set_refilling(&mut self, bin: BinId, on: bool) {
        self.bins[bin.0].set_refilling(on);
    }

    /// Add stock, waking any takes the new level can serve (FIFO from the head).
    pub fn put_stock(&mut self, bin: BinId, amount: f64) {
        for pid in self.bins[bin.0].put(amount) {
            self.calendar.schedule(pid, self.clock);
        }
    }

    /// Fire the container's one-shot replenished signal.
    pub fn signal_restocked(&mut self, bin: BinId) {
        for pid in self.bins[bin.0].drain_restock_waiters() {
            self.calendar.schedule(pid, self.clock);
        }
    }

    /// Request run termination; the kernel stops before the next wakeup.
    pub fn signal_terminal(&mut self) {
        *self.terminal = true;
    }
}
