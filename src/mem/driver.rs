use super::policy::PlacementPolicy;
use super::state::{
    BlockId, BlockState, HistoryAction, HistoryRecord, LayoutBlock, MemoryBlock, MemoryRequest,
    RequestId,
};
use crate::ProcessId;
use crate::error::InputError;
use slotmap::SlotMap;
use tracing::debug;

/// Cloned view of engine state; callers never see the internals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySnapshot {
    /// Blocks in ascending address order.
    pub blocks: Vec<MemoryBlock>,
    pub requests: Vec<MemoryRequest>,
    pub history: Vec<HistoryRecord>,
}

/// Contiguous-allocation engine: an address-ordered block arena, the active
/// placement policy, and the accumulated request/action history.
pub struct MemoryCore {
    policy: PlacementPolicy,
    total_size: u64,
    blocks: SlotMap<BlockId, MemoryBlock>,
    // Arena keys in ascending address order; every mutation preserves it.
    order: Vec<BlockId>,
    requests: Vec<MemoryRequest>,
    history: Vec<HistoryRecord>,
    next_request: u64,
    clock: u64,
}

impl MemoryCore {
    /// One FREE block spanning `[0, total_size)`.
    pub fn new(policy: PlacementPolicy, total_size: u64) -> Result<Self, InputError> {
        if total_size == 0 {
            return Err(InputError::ZeroMemory);
        }
        let mut blocks = SlotMap::with_key();
        let id = blocks.insert_with_key(|id| MemoryBlock::free_at(id, 0, total_size));
        Ok(Self {
            policy,
            total_size,
            blocks,
            order: vec![id],
            requests: Vec::new(),
            history: Vec::new(),
            next_request: 0,
            clock: 0,
        })
    }

    /// Build a caller-described partition, laid out contiguously from
    /// address 0 in list order. Adjacent FREE neighbors are merged so the
    /// no-two-adjacent-free invariant holds from the start.
    pub fn with_layout(
        policy: PlacementPolicy,
        layout: Vec<LayoutBlock>,
    ) -> Result<Self, InputError> {
        let mut blocks = SlotMap::with_key();
        let mut order = Vec::with_capacity(layout.len());
        let mut start = 0;
        for (index, piece) in layout.iter().enumerate() {
            if piece.size == 0 {
                return Err(InputError::ZeroLayoutBlock { index });
            }
            let id = blocks.insert_with_key(|id| {
                let mut block = MemoryBlock::free_at(id, start, piece.size);
                if let Some(owner) = &piece.owner {
                    block.allocate(owner.clone(), piece.size);
                }
                block
            });
            order.push(id);
            start += piece.size;
        }
        if start == 0 {
            return Err(InputError::ZeroMemory);
        }

        let mut core = Self {
            policy,
            total_size: start,
            blocks,
            order,
            requests: Vec::new(),
            history: Vec::new(),
            next_request: 0,
            clock: 0,
        };
        core.merge_adjacent_free_blocks();
        core.debug_check();
        Ok(core)
    }

    pub fn policy(&self) -> PlacementPolicy {
        self.policy
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Satisfy an allocation demand. `Ok(false)` means no FREE block can
    /// hold the request and nothing was mutated; the caller may retry after
    /// a deallocation elsewhere.
    pub fn allocate(
        &mut self,
        process: impl Into<ProcessId>,
        size: u64,
    ) -> Result<bool, InputError> {
        let process = process.into();
        if size == 0 {
            return Err(InputError::ZeroRequest { process });
        }

        let Some(chosen) = self.policy.choose(&self.blocks, &self.order, size) else {
            debug!(%process, size, "no suitable block");
            return Ok(false);
        };

        let mut request = MemoryRequest::new(RequestId(self.next_request), process.clone(), size);
        self.next_request += 1;

        let block = &self.blocks[chosen];
        if block.size == size {
            // Exact fit: flip in place, identity preserved.
            self.blocks[chosen].allocate(process.clone(), size);
            request.mark_allocated(chosen);
        } else {
            // Split into an allocated prefix and a free remainder.
            let pos = self.position(chosen);
            let (start, whole) = (block.start, block.size);
            let _ = self.blocks.remove(chosen);

            let allocated = self.blocks.insert_with_key(|id| {
                let mut block = MemoryBlock::free_at(id, start, size);
                block.allocate(process.clone(), size);
                block
            });
            let remainder = self
                .blocks
                .insert_with_key(|id| MemoryBlock::free_at(id, start + size, whole - size));

            self.order[pos] = allocated;
            self.order.insert(pos + 1, remainder);
            request.mark_allocated(allocated);
            debug!(%process, size, start, remainder = whole - size, "split");
        }

        let stamp = self.tick_clock();
        self.history.push(HistoryRecord {
            stamp,
            action: HistoryAction::Allocate {
                request: request.id,
                process,
                size,
            },
        });
        self.requests.push(request);
        self.debug_check();
        Ok(true)
    }

    /// Free every block owned by `process`, then merge. Returns whether
    /// anything was freed; a `deallocate` record is appended only then.
    pub fn deallocate(&mut self, process: &str) -> bool {
        let mut freed = false;
        for &id in &self.order {
            let block = &mut self.blocks[id];
            if block.state == BlockState::Allocated && block.owner.as_deref() == Some(process) {
                block.release();
                freed = true;
            }
        }

        for request in &mut self.requests {
            if request.allocated && request.process == process {
                request.mark_deallocated();
            }
        }

        self.merge_adjacent_free_blocks();

        if freed {
            let stamp = self.tick_clock();
            self.history.push(HistoryRecord {
                stamp,
                action: HistoryAction::Deallocate {
                    process: process.to_string(),
                },
            });
            debug!(process, "deallocated");
        }
        self.debug_check();
        freed
    }

    /// Coalesce every contiguous pair of FREE blocks, re-checking the same
    /// position after each merge. Afterwards no two adjacent blocks are
    /// both FREE.
    pub fn merge_adjacent_free_blocks(&mut self) {
        let mut i = 0;
        while i + 1 < self.order.len() {
            let (a, b) = (self.order[i], self.order[i + 1]);
            let (first, second) = (&self.blocks[a], &self.blocks[b]);
            let mergeable = first.state == BlockState::Free
                && second.state == BlockState::Free
                && first.end() + 1 == second.start;
            if !mergeable {
                i += 1;
                continue;
            }

            let (start, size) = (first.start, first.size + second.size);
            let _ = self.blocks.remove(a);
            let _ = self.blocks.remove(b);
            let merged = self
                .blocks
                .insert_with_key(|id| MemoryBlock::free_at(id, start, size));
            self.order[i] = merged;
            let _ = self.order.remove(i + 1);
            // Stay put: the merged block may be contiguous with the next.
        }
    }

    /// Deep-cloned blocks (address order), requests, and action history.
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            blocks: self.block_list(),
            requests: self.requests.clone(),
            history: self.history.clone(),
        }
    }

    /// Cloned blocks in ascending address order, for the fragmentation and
    /// utilization functions in [`crate::mem::stats`].
    pub fn block_list(&self) -> Vec<MemoryBlock> {
        self.order.iter().map(|&id| self.blocks[id].clone()).collect()
    }

    pub fn free_bytes(&self) -> u64 {
        self.order
            .iter()
            .map(|&id| &self.blocks[id])
            .filter(|b| b.state == BlockState::Free)
            .map(|b| b.size)
            .sum()
    }

    fn position(&self, id: BlockId) -> usize {
        self.order
            .iter()
            .position(|&other| other == id)
            .expect("Block missing from the address order")
    }

    fn tick_clock(&mut self) -> u64 {
        let stamp = self.clock;
        self.clock += 1;
        stamp
    }

    // The block set must partition [0, total_size) in address order.
    fn debug_check(&self) {
        debug_assert_eq!(self.order.len(), self.blocks.len());
        let mut next_start = 0;
        for &id in &self.order {
            let block = &self.blocks[id];
            debug_assert_eq!(
                block.start, next_start,
                "block arena has a gap or overlap at {next_start}"
            );
            next_start = block.start + block.size;
        }
        debug_assert_eq!(next_start, self.total_size, "blocks must sum to the total");
    }
}
