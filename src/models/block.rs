use serde::Serialize;

/// Block heights the current and the 24h-prior snapshots are read at.
///
/// Built once per cycle by the reconciler, which guarantees `current >= prior`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockPair {
    pub current: u64,
    pub prior: u64,
}

impl BlockPair {
    pub fn new(current: u64, prior: u64) -> Self {
        Self { current, prior }
    }

    /// Blocks between the two snapshots.
    pub fn span(&self) -> u64 {
        self.current.saturating_sub(self.prior)
    }
}
