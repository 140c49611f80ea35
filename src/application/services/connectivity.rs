use crate::application::services::{CacheService, SyncService};
use crate::domain::value_objects::{ConnectivityState, EntityKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Source of truth for the client's connectivity. The platform layer
/// calls `set_online`/`set_offline` from whatever signal it has (browser
/// events, socket probes); everything else observes the watch channel.
pub struct ConnectivityMonitor {
    sender: watch::Sender<ConnectivityState>,
}

impl ConnectivityMonitor {
    pub fn new(initial: ConnectivityState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn state(&self) -> ConnectivityState {
        *self.sender.borrow()
    }

    pub fn set_online(&self) {
        self.sender.send_replace(ConnectivityState::Online);
    }

    pub fn set_offline(&self) {
        self.sender.send_replace(ConnectivityState::Offline);
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.sender.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(ConnectivityState::Online)
    }
}

/// Reacts to connectivity transitions: going online drains the queue and
/// refreshes the configured collections; going offline raises the
/// degraded flag. Events are handled one by one without debouncing.
pub struct ConnectivityBridge {
    sync: Arc<SyncService>,
    cache: Arc<CacheService>,
    collections: Vec<EntityKind>,
    degraded: AtomicBool,
}

impl ConnectivityBridge {
    pub fn new(
        sync: Arc<SyncService>,
        cache: Arc<CacheService>,
        collections: Vec<EntityKind>,
    ) -> Self {
        Self {
            sync,
            cache,
            collections,
            degraded: AtomicBool::new(false),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    pub fn spawn(
        self: &Arc<Self>,
        receiver: watch::Receiver<ConnectivityState>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let bridge = Arc::clone(self);
        tokio::spawn(async move { bridge.run(receiver, cancel).await })
    }

    /// Consume connectivity events until cancelled or the monitor is
    /// dropped. The initial state is handled before waiting for changes.
    pub async fn run(
        &self,
        mut receiver: watch::Receiver<ConnectivityState>,
        cancel: CancellationToken,
    ) {
        loop {
            let state = *receiver.borrow_and_update();
            self.handle(state, &cancel).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = receiver.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    }

    async fn handle(&self, state: ConnectivityState, cancel: &CancellationToken) {
        match state {
            ConnectivityState::Offline => {
                self.degraded.store(true, Ordering::SeqCst);
                info!(target: "offline::sync", "connectivity lost; degraded mode on");
            }
            ConnectivityState::Online => {
                self.degraded.store(false, Ordering::SeqCst);
                info!(target: "offline::sync", "connectivity restored; draining queue");

                if let Err(err) = self.sync.drain("reconnect", cancel).await {
                    error!(target: "offline::sync", error = %err, "reconnect drain failed");
                }
                for kind in &self.collections {
                    if let Err(err) = self.cache.refresh_collection(*kind, cancel).await {
                        error!(
                            target: "offline::cache",
                            kind = %kind,
                            error = %err,
                            "reconnect refresh failed"
                        );
                    }
                }
            }
        }
    }
}
