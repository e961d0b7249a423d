//! Filesystem watcher: keeps external observers consistent with the
//! on-disk task/initiative directories. An eventual-consistency helper —
//! every failure is logged and swallowed, never propagated.

pub mod classify;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher as NotifyWatcherTrait};
use sha2::{Digest, Sha256};
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, trace, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::config::Config;
use crate::domain::models::{Plan, TaskID, Weight};
use crate::domain::ports::{PlanGenerator, TaskStore};
use crate::worker_pool::WorkerPool;
use classify::{classify, Classified, EntityKind, FileKind};

const DELETE_VERIFICATION_DELAY: Duration = Duration::from_millis(100);
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub enum Change {
    Upserted { path: PathBuf },
    Deleted,
}

#[derive(Debug, Clone)]
pub struct WatcherEvent {
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub file_kind: FileKind,
    pub change: Change,
}

type DebounceKey = (String, FileKind);

struct PendingWrite {
    latest_path: PathBuf,
}

pub struct Watcher {
    root: PathBuf,
    debounce: Duration,
    events: broadcast::Sender<WatcherEvent>,
    pending_writes: Mutex<HashMap<DebounceKey, PendingWrite>>,
    pending_deletes: Mutex<HashMap<DebounceKey, watch::Sender<bool>>>,
    content_hashes: Mutex<HashMap<PathBuf, String>>,
    task_weights: Mutex<HashMap<TaskID, Weight>>,
    plan_generator: Arc<dyn PlanGenerator>,
    task_store: Arc<dyn TaskStore>,
    worker_pool: Arc<WorkerPool>,
}

impl Watcher {
    pub fn new(
        root: impl Into<PathBuf>,
        config: &Config,
        plan_generator: Arc<dyn PlanGenerator>,
        task_store: Arc<dyn TaskStore>,
        worker_pool: Arc<WorkerPool>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            root: root.into(),
            debounce: Duration::from_millis(config.debounce_ms),
            events,
            pending_writes: Mutex::new(HashMap::new()),
            pending_deletes: Mutex::new(HashMap::new()),
            content_hashes: Mutex::new(HashMap::new()),
            task_weights: Mutex::new(HashMap::new()),
            plan_generator,
            task_store,
            worker_pool,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WatcherEvent> {
        self.events.subscribe()
    }

    /// Runs the watcher until `shutdown` fires. Subscribes to `root`
    /// recursively, and to `root`'s parent (non-recursively) so that the
    /// root directory's own creation is observed.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> DomainResult<()> {
        let (raw_tx, mut raw_rx) = tokio::sync::mpsc::unbounded_channel::<NotifyEvent>();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<NotifyEvent>| match res {
            Ok(event) => {
                let _ = raw_tx.send(event);
            }
            Err(err) => warn!(%err, "watcher backend error"),
        })
        .map_err(|e| crate::domain::errors::DomainError::Observability(format!("watcher init: {e}")))?;

        if let Err(e) = watcher.watch(&self.root, RecursiveMode::Recursive) {
            warn!(root = %self.root.display(), %e, "failed to watch root");
        }
        if let Some(parent) = self.root.parent() {
            if let Err(e) = watcher.watch(parent, RecursiveMode::NonRecursive) {
                warn!(parent = %parent.display(), %e, "failed to watch root's parent");
            }
        }

        info!(root = %self.root.display(), "watcher started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("watcher shutting down");
                    return Ok(());
                }
                Some(event) = raw_rx.recv() => {
                    self.clone().handle_raw_event(event).await;
                }
            }
        }
    }

    async fn handle_raw_event(self: Arc<Self>, event: NotifyEvent) {
        for path in &event.paths {
            let Some(classified) = classify(&self.root, path) else { continue };
            match &event.kind {
                EventKind::Create(_) | EventKind::Modify(_) => {
                    self.clone().handle_write(classified, path.clone()).await;
                }
                EventKind::Remove(_) => {
                    self.clone().handle_remove(classified, path.clone()).await;
                }
                _ => {}
            }
        }
    }

    async fn handle_write(self: Arc<Self>, classified: Classified, path: PathBuf) {
        // A create/write for the canonical file cancels any pending delete
        // verification — this is what distinguishes an atomic
        // remove+rename save from a true deletion.
        if classified.file_kind.is_canonical_for(classified.entity_kind) {
            let key = (classified.entity_id.clone(), classified.file_kind);
            if let Some(cancel_tx) = self.pending_deletes.lock().await.remove(&key) {
                let _ = cancel_tx.send(true);
                trace!(entity_id = %classified.entity_id, "cancelled pending delete verification");
            }
        }

        let key = (classified.entity_id.clone(), classified.file_kind);
        let mut pending = self.pending_writes.lock().await;
        match pending.get_mut(&key) {
            Some(entry) => {
                entry.latest_path = path;
            }
            None => {
                pending.insert(key.clone(), PendingWrite { latest_path: path });
                drop(pending);
                let watcher = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(watcher.debounce).await;
                    watcher.fire_debounced_write(key).await;
                });
            }
        }
    }

    async fn fire_debounced_write(self: Arc<Self>, key: DebounceKey) {
        let path = {
            let mut pending = self.pending_writes.lock().await;
            match pending.remove(&key) {
                Some(entry) => entry.latest_path,
                None => return,
            }
        };

        let contents = match tokio::fs::read(&path).await {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %path.display(), %e, "debounced write fired but file is already gone");
                return;
            }
        };

        let hash = hex::encode(Sha256::digest(&contents));
        let is_new = {
            let mut hashes = self.content_hashes.lock().await;
            let changed = hashes.get(&path) != Some(&hash);
            if changed {
                hashes.insert(path.clone(), hash);
            }
            changed
        };

        if !is_new {
            trace!(path = %path.display(), "content unchanged, suppressing publish");
            return;
        }

        let (entity_id, file_kind) = key;
        if file_kind == FileKind::Task {
            if let Ok(task_id) = TaskID::parse(&entity_id) {
                self.handle_possible_weight_change(&task_id, &contents).await;
            }
        }

        let _ = self.events.send(WatcherEvent {
            entity_kind: if entity_id.starts_with("TASK-") || entity_id.starts_with("AUTO-") {
                EntityKind::Task
            } else {
                EntityKind::Initiative
            },
            entity_id,
            file_kind,
            change: Change::Upserted { path },
        });
    }

    async fn handle_possible_weight_change(&self, task_id: &TaskID, task_contents: &[u8]) {
        let Ok(text) = std::str::from_utf8(task_contents) else { return };
        let Ok(value) = serde_yaml::from_str::<serde_yaml::Value>(text) else { return };
        let Some(new_weight) = value.get("weight").and_then(|w| serde_yaml::from_value::<Weight>(w.clone()).ok())
        else {
            return;
        };

        let changed = {
            let mut weights = self.task_weights.lock().await;
            let changed = weights.get(task_id) != Some(&new_weight);
            weights.insert(task_id.clone(), new_weight);
            changed
        };
        if !changed {
            return;
        }

        let running = matches!(
            self.worker_pool.get_worker(task_id).await.map(|w| w.status),
            Some(crate::domain::models::WorkerStatus::Running)
        );
        if running {
            debug!(%task_id, "weight changed but task is running, deferring plan regeneration");
            return;
        }

        match self.plan_generator.generate(new_weight).await {
            Ok(new_phases) => {
                let plan_path = self.root.join("tasks").join(task_id.as_str()).join("plan.yaml");
                let mut plan = tokio::fs::read_to_string(&plan_path)
                    .await
                    .ok()
                    .and_then(|s| serde_yaml::from_str::<Plan>(&s).ok())
                    .unwrap_or_default();
                plan.regenerate(new_phases);
                if let Err(e) = self.task_store.save_plan(task_id, &plan).await {
                    warn!(%task_id, %e, "failed to persist regenerated plan");
                } else {
                    info!(%task_id, ?new_weight, "plan regenerated for weight change");
                }
            }
            Err(e) => warn!(%task_id, %e, "plan generator failed"),
        }
    }

    async fn handle_remove(self: Arc<Self>, classified: Classified, path: PathBuf) {
        if !classified.file_kind.is_canonical_for(classified.entity_kind) {
            return;
        }

        let key = (classified.entity_id.clone(), classified.file_kind);
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        self.pending_deletes.lock().await.insert(key.clone(), cancel_tx);

        let watcher = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel_rx.changed() => {
                    trace!(entity_id = %key.0, "delete verification cancelled");
                }
                () = tokio::time::sleep(DELETE_VERIFICATION_DELAY) => {
                    let still_pending = watcher.pending_deletes.lock().await.remove(&key).is_some();
                    if !still_pending {
                        return;
                    }
                    match tokio::fs::try_exists(&path).await {
                        Ok(true) => trace!(path = %path.display(), "delete was a false positive (atomic save)"),
                        _ => {
                            let _ = watcher.events.send(WatcherEvent {
                                entity_kind: classified.entity_kind,
                                entity_id: key.0,
                                file_kind: key.1,
                                change: Change::Deleted,
                            });
                        }
                    }
                }
            }
        });
    }
}
