use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrainOutcomeStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DrainMetricsSnapshot {
    pub total_passes: u64,
    pub total_synced: u64,
    pub total_failed: u64,
    pub total_dropped: u64,
    pub consecutive_failed_passes: u64,
    pub last_pass_ms: Option<u64>,
    pub last_outcome: Option<DrainOutcomeStatus>,
    pub last_synced_count: Option<u32>,
    pub last_failed_count: Option<u32>,
    pub last_dropped_count: Option<u32>,
    pub last_trigger: Option<String>,
}

#[derive(Default, Clone)]
struct LastPass {
    outcome: Option<DrainOutcomeStatus>,
    synced: Option<u32>,
    failed: Option<u32>,
    dropped: Option<u32>,
    trigger: Option<String>,
}

/// Counters for drain passes. Owned by the sync service rather than held
/// in a process-wide static, so independent instances never share state.
pub struct DrainMetrics {
    passes: AtomicU64,
    synced: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    consecutive_failed_passes: AtomicU64,
    last_pass_ms: AtomicU64,
    last: Mutex<LastPass>,
}

impl DrainMetrics {
    pub fn new() -> Self {
        Self {
            passes: AtomicU64::new(0),
            synced: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            consecutive_failed_passes: AtomicU64::new(0),
            last_pass_ms: AtomicU64::new(0),
            last: Mutex::new(LastPass::default()),
        }
    }

    pub fn record_pass(
        &self,
        synced: u32,
        failed: u32,
        dropped: u32,
        trigger: &str,
    ) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.synced.fetch_add(u64::from(synced), Ordering::Relaxed);
        self.failed.fetch_add(u64::from(failed), Ordering::Relaxed);
        self.dropped.fetch_add(u64::from(dropped), Ordering::Relaxed);
        self.last_pass_ms.store(current_unix_ms(), Ordering::Relaxed);

        let outcome = if failed == 0 && dropped == 0 {
            self.consecutive_failed_passes.store(0, Ordering::Relaxed);
            DrainOutcomeStatus::Success
        } else {
            self.consecutive_failed_passes
                .fetch_add(1, Ordering::Relaxed);
            DrainOutcomeStatus::Failure
        };

        if let Ok(mut guard) = self.last.lock() {
            guard.outcome = Some(outcome);
            guard.synced = Some(synced);
            guard.failed = Some(failed);
            guard.dropped = Some(dropped);
            guard.trigger = Some(trigger.to_string());
        }
    }

    pub fn snapshot(&self) -> DrainMetricsSnapshot {
        let last = self
            .last
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        DrainMetricsSnapshot {
            total_passes: self.passes.load(Ordering::Relaxed),
            total_synced: self.synced.load(Ordering::Relaxed),
            total_failed: self.failed.load(Ordering::Relaxed),
            total_dropped: self.dropped.load(Ordering::Relaxed),
            consecutive_failed_passes: self.consecutive_failed_passes.load(Ordering::Relaxed),
            last_pass_ms: to_option(self.last_pass_ms.load(Ordering::Relaxed)),
            last_outcome: last.outcome,
            last_synced_count: last.synced,
            last_failed_count: last.failed,
            last_dropped_count: last.dropped,
            last_trigger: last.trigger,
        }
    }
}

impl Default for DrainMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 {
        None
    } else {
        Some(value)
    }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
