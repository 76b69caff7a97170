use super::state::{BlockId, MemoryBlock};
use slotmap::SlotMap;

/// Closed set of placement policies: given the address-ordered block list,
/// choose one FREE block able to hold the requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementPolicy {
    /// First fitting block in ascending address order.
    FirstFit,
    /// Smallest fitting block; first encountered wins ties.
    BestFit,
    /// Largest fitting block; first encountered wins ties.
    WorstFit,
}

impl PlacementPolicy {
    pub(crate) fn choose(
        &self,
        blocks: &SlotMap<BlockId, MemoryBlock>,
        order: &[BlockId],
        size: u64,
    ) -> Option<BlockId> {
        let mut candidates = order
            .iter()
            .map(|&id| &blocks[id])
            .filter(|b| b.can_fit(size));

        match self {
            Self::FirstFit => candidates.next().map(|b| b.id),
            // Strict comparisons keep the first encountered block on ties.
            Self::BestFit => candidates
                .fold(None::<&MemoryBlock>, |best, b| match best {
                    Some(best) if best.size <= b.size => Some(best),
                    _ => Some(b),
                })
                .map(|b| b.id),
            Self::WorstFit => candidates
                .fold(None::<&MemoryBlock>, |worst, b| match worst {
                    Some(worst) if worst.size >= b.size => Some(worst),
                    _ => Some(b),
                })
                .map(|b| b.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn arena(sizes: &[u64]) -> (SlotMap<BlockId, MemoryBlock>, Vec<BlockId>) {
        let mut blocks = SlotMap::with_key();
        let mut order = Vec::new();
        let mut start = 0;
        for &size in sizes {
            let id = blocks.insert_with_key(|id| MemoryBlock::free_at(id, start, size));
            order.push(id);
            start += size;
        }
        (blocks, order)
    }

    #[test]
    fn first_fit_takes_the_lowest_address() {
        let (blocks, order) = arena(&[10, 50, 20]);
        let chosen = PlacementPolicy::FirstFit.choose(&blocks, &order, 15).unwrap();
        assert_eq!(blocks[chosen].size, 50);
    }

    #[test]
    fn best_and_worst_fit_diverge() {
        let (blocks, order) = arena(&[10, 50, 20]);
        let best = PlacementPolicy::BestFit.choose(&blocks, &order, 10).unwrap();
        let worst = PlacementPolicy::WorstFit.choose(&blocks, &order, 10).unwrap();
        assert_eq!(blocks[best].size, 10);
        assert_eq!(blocks[worst].size, 50);
    }

    #[test]
    fn ties_go_to_the_first_encountered_block() {
        let (blocks, order) = arena(&[30, 30, 5, 30]);
        let best = PlacementPolicy::BestFit.choose(&blocks, &order, 20).unwrap();
        let worst = PlacementPolicy::WorstFit.choose(&blocks, &order, 20).unwrap();
        assert_eq!(blocks[best].start, 0);
        assert_eq!(blocks[worst].start, 0);
    }

    #[test]
    fn no_fitting_block_yields_none() {
        let (blocks, order) = arena(&[10, 20]);
        assert_eq!(PlacementPolicy::BestFit.choose(&blocks, &order, 21), None);
    }
}
