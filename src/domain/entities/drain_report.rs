use serde::{Deserialize, Serialize};

/// Aggregate tally of one drain pass. An individual mutation failure
/// never aborts the pass, so the caller only sees these counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrainReport {
    /// Mutations read from the queue at the start of the pass.
    pub processed: u32,
    /// Replayed successfully and removed.
    pub synced: u32,
    /// Failed this pass but still queued for the next one.
    pub failed: u32,
    /// Exhausted their retry budget and were dropped.
    pub dropped: u32,
    /// Left untouched because the circuit was open.
    pub skipped: u32,
}

impl DrainReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.dropped == 0 && self.skipped == 0
    }
}
