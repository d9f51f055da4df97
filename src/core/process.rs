use std::fmt;

use super::calendar::SimTime;
use super::container::BinId;
use super::kernel::Sim;
use super::resource::{Priority, ResourceId};

/// Identifier of a live process within one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// The suspension request a process hands back to the kernel when it yields.
#[derive(Debug, Clone)]
pub enum Flow {
    /// Sleep for a duration (hours), then resume.
    Hold(SimTime),
    /// Wait for one unit of a resource at the given priority.
    Acquire(ResourceId, Priority),
    /// Take an amount from a container, blocking until the level suffices.
    TakeStock(BinId, f64),
    /// Block until the container's next replenished signal fires.
    AwaitRestock(BinId),
    /// Block until every listed process has completed.
    JoinAll(Vec<ProcessId>),
    /// The process is finished.
    Done,
}

/// A resumable continuation driven by the kernel.
///
/// Each call to `resume` runs the process up to its next suspension point and
/// returns the corresponding `Flow` request. State between suspensions lives in
/// the implementing struct, typically as an explicit state enum.
pub trait Process<M> {
    fn resume(&mut self, sim: &mut Sim<'_, M>) -> Flow;
}
