use crate::ProcessId;
use slotmap::new_key_type;

new_key_type! {
    /// Arena key of a memory block. Fresh keys are minted whenever a block
    /// is split or merged, so a block's identity never outlives its extent.
    pub struct BlockId;
}

/// Monotonic identity of an allocation request, assigned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Free,
    Allocated,
}

/// One contiguous region of the simulated address space. The full block set
/// always partitions `[0, total_size)` with no overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlock {
    pub id: BlockId,
    pub start: u64,
    pub size: u64,
    pub state: BlockState,
    pub owner: Option<ProcessId>,
    /// Bytes wasted inside the block: size minus the requested size, only
    /// ever non-zero while allocated.
    pub internal_fragmentation: u64,
}

impl MemoryBlock {
    pub fn free_at(id: BlockId, start: u64, size: u64) -> Self {
        Self {
            id,
            start,
            size,
            state: BlockState::Free,
            owner: None,
            internal_fragmentation: 0,
        }
    }

    /// Inclusive end address.
    pub fn end(&self) -> u64 {
        self.start + self.size - 1
    }

    pub fn can_fit(&self, size: u64) -> bool {
        self.state == BlockState::Free && self.size >= size
    }

    pub(crate) fn allocate(&mut self, owner: ProcessId, requested: u64) {
        debug_assert!(self.size >= requested);
        self.state = BlockState::Allocated;
        self.owner = Some(owner);
        self.internal_fragmentation = self.size - requested;
    }

    pub(crate) fn release(&mut self) {
        self.state = BlockState::Free;
        self.owner = None;
        self.internal_fragmentation = 0;
    }
}

/// One allocation demand, recorded on success and never deleted; the request
/// list doubles as the allocation history of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRequest {
    pub id: RequestId,
    pub process: ProcessId,
    pub size: u64,
    pub allocated: bool,
    pub block: Option<BlockId>,
}

impl MemoryRequest {
    pub(crate) fn new(id: RequestId, process: ProcessId, size: u64) -> Self {
        Self {
            id,
            process,
            size,
            allocated: false,
            block: None,
        }
    }

    pub(crate) fn mark_allocated(&mut self, block: BlockId) {
        self.allocated = true;
        self.block = Some(block);
    }

    pub(crate) fn mark_deallocated(&mut self) {
        self.allocated = false;
        self.block = None;
    }
}

/// Caller-described block in an initial layout. Blocks are laid out
/// contiguously from address 0 in list order; `owner == Some(_)` seeds the
/// block as allocated with zero internal fragmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutBlock {
    pub size: u64,
    pub owner: Option<ProcessId>,
}

impl LayoutBlock {
    pub fn free(size: u64) -> Self {
        Self { size, owner: None }
    }

    pub fn allocated(size: u64, owner: impl Into<ProcessId>) -> Self {
        Self {
            size,
            owner: Some(owner.into()),
        }
    }
}

/// Append-only record of one engine action. The stamp is a per-engine event
/// counter; the engines carry no wall clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub stamp: u64,
    pub action: HistoryAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    Allocate {
        request: RequestId,
        process: ProcessId,
        size: u64,
    },
    Deallocate {
        process: ProcessId,
    },
}
