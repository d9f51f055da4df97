pub mod calendar;
pub mod container;
pub mod kernel;
pub mod process;
pub mod resource;

pub use calendar::{EventCalendar, ScheduledWake, SimTime};
pub use container::{BinId, StockBin};
pub use kernel::{Kernel, KernelBuilder, RunOutcome, Sim};
pub use process::{Flow, Process, ProcessId};
pub use resource::{Priority, ResourceId, ResourcePool};
