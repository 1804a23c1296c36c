use std::sync::Arc;

use tokio::{
    sync::{Mutex, broadcast, mpsc, oneshot},
    time::{Duration, Instant},
};
use tracing::{debug, warn};

pub use crate::config::RuntimeConfig;
use crate::{
    config::PlantConfig,
    core::{
        dataset::Dataset,
        store::{Confirmation, DeleteOutcome, EditOutcome, PlantStore, QcMeasurement, StoreError},
    },
    engine::{filter::FilterCriteria, integrity::DeleteProposal, stats::PlantSummary},
    entry::LogEntry,
    master::{MasterRef, User},
    op::StoredOp,
    persist::{self, PersistError, SnapshotGateway, memory::MemoryGateway, sqlite::SqliteGateway},
    types::{LogKind, OpSeq, RecordId},
};

use super::events::PlantEvent;

/// Failure of a runtime call.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The store refused the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A persistence call failed.
    #[error(transparent)]
    Persist(#[from] PersistError),
    /// The runtime task is gone.
    #[error("plant runtime is not running")]
    ChannelClosed,
}

type Apply = Box<dyn FnOnce(&mut PlantStore) + Send>;

/// Cloneable handle to a running plant session.
///
/// Calls from any number of tasks are applied to the store one at a time.
#[derive(Clone)]
pub struct PlantHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<PlantEvent>,
}

enum Command {
    Apply(Apply),
    Flush {
        resp: oneshot::Sender<Result<OpSeq, RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
}

enum PersistMsg {
    Save {
        dataset: Box<Dataset>,
        ops: Vec<StoredOp>,
        op_seq: OpSeq,
    },
    Flush {
        resp: oneshot::Sender<Result<OpSeq, PersistError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

struct Pending {
    dataset: Box<Dataset>,
    ops: Vec<StoredOp>,
    op_seq: OpSeq,
}

/// Starts the single-writer loop owning `store`.
///
/// When a gateway is given, every committed change is followed by a snapshot
/// save on a background worker. Must be called inside a tokio runtime.
pub fn spawn_plant(
    store: PlantStore,
    gateway: Option<Box<dyn SnapshotGateway>>,
    config: RuntimeConfig,
) -> PlantHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(256);
    let (events_tx, _) = broadcast::channel::<PlantEvent>(1024);

    let persist_tx = gateway.map(|gateway| {
        let (persist_tx, persist_rx) = mpsc::channel::<PersistMsg>(config.persist_queue_bound.max(1));
        spawn_persistence_worker(gateway, persist_rx, events_tx.clone(), config.clone());
        persist_tx
    });

    let events_tx_loop = events_tx.clone();
    tokio::spawn(async move {
        let mut store = store;
        while let Some(cmd) = cmd_rx.recv().await {
            let done = handle_command(cmd, &mut store, &events_tx_loop, persist_tx.as_ref(), &config).await;
            if done {
                break;
            }
        }
    });

    PlantHandle { cmd_tx, events_tx }
}

/// Opens the configured gateway, loads or seeds the dataset and spawns the runtime.
///
/// Uses SQLite when `database_path` is set, else an in-memory gateway.
pub fn open_plant(config: &PlantConfig) -> Result<PlantHandle, RuntimeError> {
    let mut gateway: Box<dyn SnapshotGateway> = match &config.database_path {
        Some(path) => Box::new(SqliteGateway::open(path)?),
        None => Box::new(MemoryGateway::new()),
    };
    let store = persist::load_store(gateway.as_mut(), config.store_config())?;
    Ok(spawn_plant(store, Some(gateway), config.runtime.clone()))
}

impl PlantHandle {
    /// Subscribes to runtime events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlantEvent> {
        self.events_tx.subscribe()
    }

    /// Runs `f` against the store, serialised with every other call.
    pub async fn with_store<R, F>(&self, f: F) -> Result<R, RuntimeError>
    where
        F: FnOnce(&mut PlantStore) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let apply: Apply = Box::new(move |store| {
            let _ = tx.send(f(store));
        });
        self.cmd_tx
            .send(Command::Apply(apply))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// See [`PlantStore::sign_in`].
    pub async fn sign_in(&self, username: impl Into<String>, password: impl Into<String>) -> Result<User, RuntimeError> {
        let (username, password) = (username.into(), password.into());
        Ok(self.with_store(move |s| s.sign_in(&username, &password)).await??)
    }

    /// See [`PlantStore::sign_out`].
    pub async fn sign_out(&self) -> Result<bool, RuntimeError> {
        self.with_store(|s| s.sign_out()).await
    }

    /// See [`PlantStore::add_entry`].
    pub async fn add_entry(&self, entry: impl Into<LogEntry>) -> Result<RecordId, RuntimeError> {
        let entry = entry.into();
        Ok(self.with_store(move |s| s.add_entry(entry)).await??)
    }

    /// See [`PlantStore::record_qc_inspection`].
    pub async fn record_qc_inspection(
        &self,
        qc_item_id: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
        measurements: Vec<QcMeasurement>,
    ) -> Result<Vec<RecordId>, RuntimeError> {
        let (item, date, time) = (qc_item_id.into(), date.into(), time.into());
        Ok(self
            .with_store(move |s| s.record_qc_inspection(&item, &date, &time, &measurements))
            .await??)
    }

    /// See [`PlantStore::remove_entry`].
    pub async fn remove_entry(&self, kind: LogKind, id: impl Into<String>) -> Result<bool, RuntimeError> {
        let id = id.into();
        self.with_store(move |s| s.remove_entry(kind, &id)).await
    }

    /// See [`PlantStore::edit_value`].
    pub async fn edit_value(
        &self,
        kind: LogKind,
        id: impl Into<String>,
        raw: impl Into<String>,
    ) -> Result<EditOutcome, RuntimeError> {
        let (id, raw) = (id.into(), raw.into());
        self.with_store(move |s| s.edit_value(kind, &id, &raw)).await
    }

    /// See [`PlantStore::propose_delete`].
    pub async fn propose_delete(&self, target: MasterRef) -> Result<DeleteProposal, RuntimeError> {
        Ok(self.with_store(move |s| s.propose_delete(target)).await??)
    }

    /// See [`PlantStore::commit_delete`].
    pub async fn commit_delete(
        &self,
        proposal: DeleteProposal,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, RuntimeError> {
        Ok(self
            .with_store(move |s| s.commit_delete(proposal, confirmation))
            .await??)
    }

    /// See [`PlantStore::query`].
    pub async fn query(&self, kind: LogKind, criteria: FilterCriteria) -> Result<Vec<LogEntry>, RuntimeError> {
        self.with_store(move |s| s.query(kind, &criteria)).await
    }

    /// See [`PlantStore::summary`].
    pub async fn summary(&self) -> Result<PlantSummary, RuntimeError> {
        self.with_store(|s| s.summary()).await
    }

    /// Clone of the current dataset.
    pub async fn dataset(&self) -> Result<Dataset, RuntimeError> {
        self.with_store(|s| s.export_dataset()).await
    }

    /// See [`PlantStore::undo`].
    pub async fn undo(&self) -> Result<(), RuntimeError> {
        Ok(self.with_store(|s| s.undo()).await??)
    }

    /// See [`PlantStore::redo`].
    pub async fn redo(&self) -> Result<(), RuntimeError> {
        Ok(self.with_store(|s| s.redo()).await??)
    }

    /// Waits until everything committed so far is saved; returns the saved op sequence.
    pub async fn flush(&self) -> Result<OpSeq, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Flush { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Saves outstanding changes and stops the runtime.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }
}

async fn handle_command(
    cmd: Command,
    store: &mut PlantStore,
    events_tx: &broadcast::Sender<PlantEvent>,
    persist_tx: Option<&mpsc::Sender<PersistMsg>>,
    config: &RuntimeConfig,
) -> bool {
    match cmd {
        Command::Apply(apply) => {
            apply(store);
            let ops = store.drain_pending_ops();
            if ops.is_empty() {
                return false;
            }
            for stored in &ops {
                let _ = events_tx.send(PlantEvent::Committed {
                    seq: stored.seq,
                    op: stored.op.clone(),
                });
            }
            if let Some(tx) = persist_tx {
                let msg = PersistMsg::Save {
                    dataset: Box::new(store.export_dataset()),
                    ops: if config.journal_ops { ops } else { Vec::new() },
                    op_seq: store.latest_op_seq(),
                };
                if tx.send(msg).await.is_err() {
                    warn!("persistence worker gone, change kept in memory only");
                }
            }
        }
        Command::Flush { resp } => {
            let out = match persist_tx {
                Some(tx) => {
                    let (flush_tx, flush_rx) = oneshot::channel();
                    if tx.send(PersistMsg::Flush { resp: flush_tx }).await.is_err() {
                        Err(RuntimeError::ChannelClosed)
                    } else {
                        flush_rx
                            .await
                            .map_err(|_| RuntimeError::ChannelClosed)
                            .and_then(|r| r.map_err(RuntimeError::from))
                    }
                }
                None => Ok(store.latest_op_seq()),
            };
            let _ = resp.send(out);
        }
        Command::Shutdown { resp } => {
            let out = match persist_tx {
                Some(tx) => {
                    let (done_tx, done_rx) = oneshot::channel();
                    if tx.send(PersistMsg::Shutdown { resp: done_tx }).await.is_err() {
                        Err(RuntimeError::ChannelClosed)
                    } else {
                        done_rx.await.map_err(|_| RuntimeError::ChannelClosed)
                    }
                }
                None => Ok(()),
            };
            let _ = resp.send(out);
            return true;
        }
    }

    false
}

fn spawn_persistence_worker(
    gateway: Box<dyn SnapshotGateway>,
    mut rx: mpsc::Receiver<PersistMsg>,
    events_tx: broadcast::Sender<PlantEvent>,
    config: RuntimeConfig,
) {
    let gateway = Arc::new(Mutex::new(gateway));
    let latency = Duration::from_millis(config.save_max_latency_ms);
    tokio::spawn(async move {
        let mut pending: Option<Pending> = None;
        let mut deadline = Instant::now() + latency;
        let mut last_saved: OpSeq = 0;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        let _ = write_pending(&gateway, &mut pending, &mut last_saved, &events_tx).await;
                        break;
                    };

                    match msg {
                        PersistMsg::Save { dataset, ops, op_seq } => {
                            match pending.as_mut() {
                                Some(p) => {
                                    p.dataset = dataset;
                                    p.ops.extend(ops);
                                    p.op_seq = op_seq;
                                }
                                None => {
                                    pending = Some(Pending { dataset, ops, op_seq });
                                    deadline = Instant::now() + latency;
                                }
                            }
                            if config.save_immediately {
                                let _ = write_pending(&gateway, &mut pending, &mut last_saved, &events_tx).await;
                            }
                        }
                        PersistMsg::Flush { resp } => {
                            let mut result = write_pending(&gateway, &mut pending, &mut last_saved, &events_tx).await;
                            if result.is_ok() {
                                let gw = Arc::clone(&gateway);
                                result = join(tokio::task::spawn_blocking(move || gw.blocking_lock().flush()).await);
                            }
                            let _ = resp.send(result.map(|_| last_saved));
                        }
                        PersistMsg::Shutdown { resp } => {
                            let _ = write_pending(&gateway, &mut pending, &mut last_saved, &events_tx).await;
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline), if pending.is_some() => {
                    let _ = write_pending(&gateway, &mut pending, &mut last_saved, &events_tx).await;
                }
            }
        }
    });
}

async fn write_pending(
    gateway: &Arc<Mutex<Box<dyn SnapshotGateway>>>,
    pending: &mut Option<Pending>,
    last_saved: &mut OpSeq,
    events_tx: &broadcast::Sender<PlantEvent>,
) -> Result<(), PersistError> {
    let Some(Pending { dataset, ops, op_seq }) = pending.take() else {
        return Ok(());
    };

    let gw = Arc::clone(gateway);
    let result = join(
        tokio::task::spawn_blocking(move || {
            let mut gw = gw.blocking_lock();
            if !ops.is_empty() {
                gw.append_ops(&ops)?;
            }
            gw.save(&dataset)
        })
        .await,
    );

    match result {
        Ok(()) => {
            *last_saved = (*last_saved).max(op_seq);
            debug!(op_seq, "dataset saved");
            let _ = events_tx.send(PlantEvent::Saved { op_seq: *last_saved });
            Ok(())
        }
        Err(err) => {
            warn!(op_seq, error = %err, "dataset save failed");
            let _ = events_tx.send(PlantEvent::SaveFailed {
                error: err.to_string(),
            });
            Err(err)
        }
    }
}

fn join(res: Result<Result<(), PersistError>, tokio::task::JoinError>) -> Result<(), PersistError> {
    res.map_err(|e| PersistError::Message(format!("join error: {e}")))?
}
