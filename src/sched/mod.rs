pub mod driver;
pub mod observer;
pub mod policy;
pub mod state;

pub use driver::{SchedStats, SchedulerCore, SimulationResult};
pub use policy::{DEFAULT_QUANTUM, DispatchPolicy};
pub use state::{Process, ProcessSpec, ProcessState, ReadyQueue, SortKey, TimelineSlot};
