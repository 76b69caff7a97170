use super::state::{BlockState, MemoryBlock};

/// FREE blocks strictly smaller than this count toward external
/// fragmentation. An approximation of "too small for typical requests",
/// not a measure of true unusable space.
pub const EXTERNAL_FRAGMENTATION_THRESHOLD: u64 = 10;

/// Total bytes wasted inside allocated blocks.
pub fn internal_fragmentation(blocks: &[MemoryBlock]) -> u64 {
    blocks
        .iter()
        .filter(|b| b.state == BlockState::Allocated)
        .map(|b| b.internal_fragmentation)
        .sum()
}

/// Total size of FREE blocks below the smallness threshold.
pub fn external_fragmentation(blocks: &[MemoryBlock]) -> u64 {
    blocks
        .iter()
        .filter(|b| b.state == BlockState::Free && b.size < EXTERNAL_FRAGMENTATION_THRESHOLD)
        .map(|b| b.size)
        .sum()
}

/// Allocated bytes as a percentage of all bytes; 0.0 for an empty list.
pub fn utilization(blocks: &[MemoryBlock]) -> f64 {
    let total: u64 = blocks.iter().map(|b| b.size).sum();
    if total == 0 {
        return 0.0;
    }
    let used: u64 = blocks
        .iter()
        .filter(|b| b.state == BlockState::Allocated)
        .map(|b| b.size)
        .sum();
    used as f64 / total as f64 * 100.0
}
