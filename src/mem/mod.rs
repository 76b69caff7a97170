pub mod driver;
pub mod policy;
pub mod state;
pub mod stats;

pub use driver::{MemoryCore, MemorySnapshot};
pub use policy::PlacementPolicy;
pub use state::{
    BlockId, BlockState, HistoryAction, HistoryRecord, LayoutBlock, MemoryBlock, MemoryRequest,
    RequestId,
};
pub use stats::{
    EXTERNAL_FRAGMENTATION_THRESHOLD, external_fragmentation, internal_fragmentation, utilization,
};
