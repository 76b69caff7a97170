pub mod error;
pub mod mem;
pub mod sched;

/// Caller-supplied identity of a simulated process.
pub type ProcessId = String;

/// One discrete unit of virtual time.
pub type Ticks = u64;

pub use error::InputError;
pub use mem::{MemoryCore, PlacementPolicy};
pub use sched::{DispatchPolicy, SchedulerCore};
