use crate::application::ports::{OfflineStore, RemoteDataService, RemoteOp};
use crate::domain::entities::{DrainReport, MutationPayload, PendingMutation, PendingMutationDraft};
use crate::domain::value_objects::{ConnectivityState, EntityKind, MutationAction, MutationId};
use crate::infrastructure::resilience::{retry_with_backoff, CircuitBreaker};
use crate::shared::config::{RetryConfig, SyncConfig};
use crate::shared::error::AppError;
use crate::shared::metrics::{DrainMetrics, DrainMetricsSnapshot};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What happened to a submitted mutation.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Applied remotely; carries the remote service's response record.
    Applied(Value),
    /// Deferred to the pending queue for a later drain pass.
    Queued(MutationId),
}

/// Write side of the offline layer: applies mutations remotely when the
/// network allows it, queues them otherwise, and drains the queue.
pub struct SyncService {
    store: Arc<dyn OfflineStore>,
    remote: Arc<dyn RemoteDataService>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryConfig,
    sync: SyncConfig,
    metrics: DrainMetrics,
    // Serializes drain passes; concurrent callers queue behind the gate
    // instead of replaying the same mutations twice.
    gate: Mutex<()>,
}

impl SyncService {
    pub fn new(
        store: Arc<dyn OfflineStore>,
        remote: Arc<dyn RemoteDataService>,
        breaker: Arc<CircuitBreaker>,
        retry: RetryConfig,
        sync: SyncConfig,
    ) -> Self {
        Self {
            store,
            remote,
            breaker,
            retry,
            sync,
            metrics: DrainMetrics::new(),
            gate: Mutex::new(()),
        }
    }

    pub fn metrics(&self) -> DrainMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Apply a mutation now if online; otherwise (or when the network
    /// path fails transiently) persist it to the queue. Fatal errors are
    /// propagated without queueing so the caller can surface them.
    pub async fn submit(
        &self,
        draft: PendingMutationDraft,
        connectivity: ConnectivityState,
        cancel: &CancellationToken,
    ) -> Result<SubmitOutcome, AppError> {
        if !connectivity.is_online() {
            let mutation = self.store.enqueue_mutation(draft).await?;
            debug!(
                target: "offline::sync",
                id = %mutation.id,
                action = %mutation.action,
                "offline; mutation queued"
            );
            return Ok(SubmitOutcome::Queued(mutation.id));
        }

        let (kind, op, body) = dispatch_parts(draft.action, &draft.payload)?;
        match self.apply_remote(kind, op, body, cancel).await {
            Ok(record) => Ok(SubmitOutcome::Applied(record)),
            Err(error) if error.is_circuit_open() || is_deferrable(&error, &self.retry) => {
                warn!(
                    target: "offline::sync",
                    error = %error,
                    "online submit failed transiently; queueing mutation"
                );
                let mutation = self.store.enqueue_mutation(draft).await?;
                Ok(SubmitOutcome::Queued(mutation.id))
            }
            Err(error) => Err(error),
        }
    }

    /// One drain pass over the whole queue, in enqueue order. Individual
    /// failures never abort the pass; the report carries the tally.
    pub async fn drain(
        &self,
        trigger: &str,
        cancel: &CancellationToken,
    ) -> Result<DrainReport, AppError> {
        let _guard = self.gate.lock().await;

        let pending = self.store.pending_mutations().await?;
        let mut report = DrainReport::default();

        for mutation in pending {
            if cancel.is_cancelled() {
                debug!(target: "offline::sync", trigger, "drain pass cancelled");
                break;
            }
            // counted per visited item so a cancelled pass reports only
            // what it actually reached
            report.processed += 1;
            match self.replay(&mutation, cancel).await {
                Ok(()) => {
                    self.store.remove_mutation(&mutation.id).await?;
                    report.synced += 1;
                }
                Err(error) if error.is_circuit_open() => {
                    // Left queued with attempts untouched; the next pass
                    // will retry once the circuit admits calls again.
                    debug!(
                        target: "offline::sync",
                        id = %mutation.id,
                        "circuit open; mutation skipped"
                    );
                    report.skipped += 1;
                }
                Err(AppError::Cancelled) => {
                    debug!(target: "offline::sync", trigger, "drain pass cancelled");
                    break;
                }
                Err(error) => {
                    let attempts = mutation.attempt_count + 1;
                    if attempts >= self.sync.max_attempts {
                        self.store.remove_mutation(&mutation.id).await?;
                        report.dropped += 1;
                        warn!(
                            target: "offline::sync",
                            id = %mutation.id,
                            action = %mutation.action,
                            attempts,
                            error = %error,
                            "retry budget exhausted; mutation dropped"
                        );
                    } else {
                        self.store.bump_attempts(&mutation.id, attempts).await?;
                        report.failed += 1;
                        warn!(
                            target: "offline::sync",
                            id = %mutation.id,
                            attempts,
                            error = %error,
                            "mutation replay failed; kept for next pass"
                        );
                    }
                }
            }
        }

        self.metrics
            .record_pass(report.synced, report.failed, report.dropped, trigger);
        info!(
            target: "offline::sync",
            trigger,
            processed = report.processed,
            synced = report.synced,
            failed = report.failed,
            dropped = report.dropped,
            skipped = report.skipped,
            "drain pass finished"
        );

        Ok(report)
    }

    async fn replay(
        &self,
        mutation: &PendingMutation,
        cancel: &CancellationToken,
    ) -> Result<(), AppError> {
        let (kind, op, body) = dispatch_parts(mutation.action, &mutation.payload)?;
        self.apply_remote(kind, op, body, cancel).await.map(|_| ())
    }

    async fn apply_remote(
        &self,
        kind: EntityKind,
        op: RemoteOp,
        body: Value,
        cancel: &CancellationToken,
    ) -> Result<Value, AppError> {
        self.breaker
            .execute(|| {
                retry_with_backoff(&self.retry, cancel, || {
                    self.remote.mutate(kind, op.clone(), body.clone())
                })
            })
            .await
    }
}

/// A submit-path failure worth queueing for a later drain instead of
/// surfacing to the caller.
fn is_deferrable(error: &AppError, retry: &RetryConfig) -> bool {
    crate::infrastructure::resilience::retry::is_retryable(error, retry)
}

/// Translate a mutation into the remote call it replays as. The match is
/// exhaustive so a new payload variant cannot be silently dropped.
fn dispatch_parts(
    action: MutationAction,
    payload: &MutationPayload,
) -> Result<(EntityKind, RemoteOp, Value), AppError> {
    let kind = payload.entity_kind();

    let body = match payload {
        MutationPayload::Post(write) => serde_json::to_value(write)?,
        MutationPayload::Message(write) => serde_json::to_value(write)?,
        MutationPayload::Trip(write) => serde_json::to_value(write)?,
        MutationPayload::Profile(write) => serde_json::to_value(write)?,
    };

    let op = match action {
        MutationAction::Create => RemoteOp::Create,
        MutationAction::Update | MutationAction::Delete => {
            let id = payload.remote_id().cloned().ok_or_else(|| {
                AppError::Validation(format!("{action} mutation without a remote id"))
            })?;
            if action == MutationAction::Update {
                RemoteOp::Update(id)
            } else {
                RemoteOp::Delete(id)
            }
        }
    };

    Ok((kind, op, body))
}
