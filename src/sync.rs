//! Background synchronization of local ledger mutations to the remote store.
//!
//! Every mutation enqueues a durable outbox entry; a worker task drains the
//! queue in FIFO order, pushing each entry with exponential backoff and
//! removing it only on confirmed remote acknowledgment. An entry whose
//! retry budget is exhausted is marked `failed` and kept for inspection —
//! it is never silently dropped. Failures are reported through the
//! diagnostic channel only and never roll back the local mutation.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::{MAX_SYNC_ATTEMPTS, OUTBOX_FILE, SYNC_INTERVAL_SECS, SYNC_QUEUE_CAPACITY};
use crate::models::{AuthSession, Expense, ExpensePatch};
use crate::remote::{RemoteError, RemoteStore};
use crate::retry::{RetryConfig, retry_with_backoff};
use crate::session::SessionHandle;
use crate::utils::now_ms;

/// One local mutation awaiting remote acknowledgment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum SyncOp {
    Insert(Expense),
    Update { id: String, patch: ExpensePatch },
    Delete { id: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Failed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutboxEntry {
    pub id: String,
    #[serde(flatten)]
    pub op: SyncOp,
    pub attempts: u32,
    pub status: EntryStatus,
    pub created_at: i64,
}

/// Durable pending-operations list, persisted as its own JSON file so
/// unsynced mutations survive a restart.
#[derive(Debug)]
pub struct Outbox {
    path: PathBuf,
    entries: Vec<OutboxEntry>,
}

impl Outbox {
    pub async fn load(data_dir: impl AsRef<Path>) -> Result<Self> {
        let path = data_dir.as_ref().join(OUTBOX_FILE);
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub async fn enqueue(&mut self, op: SyncOp) -> Result<String> {
        let entry = OutboxEntry {
            id: Uuid::new_v4().to_string(),
            op,
            attempts: 0,
            status: EntryStatus::Pending,
            created_at: now_ms(),
        };
        let id = entry.id.clone();
        self.entries.push(entry);
        self.persist().await?;
        Ok(id)
    }

    /// Pending entries in enqueue (FIFO) order.
    pub fn pending(&self) -> Vec<OutboxEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == EntryStatus::Pending)
            .cloned()
            .collect()
    }

    /// Entries that exhausted their retry budget, kept for inspection.
    pub fn failed(&self) -> Vec<OutboxEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == EntryStatus::Failed)
            .cloned()
            .collect()
    }

    /// Remove an acknowledged entry.
    pub async fn acknowledge(&mut self, id: &str) -> Result<()> {
        self.entries.retain(|e| e.id != id);
        self.persist().await
    }

    /// Count one failed drain attempt. Returns `true` once the entry has
    /// crossed the retry budget and been marked failed.
    pub async fn record_failure(&mut self, id: &str) -> Result<bool> {
        let mut exhausted = false;
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.attempts += 1;
            if entry.attempts >= MAX_SYNC_ATTEMPTS {
                entry.status = EntryStatus::Failed;
                exhausted = true;
            }
        }
        self.persist().await?;
        Ok(exhausted)
    }

    async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(&self.entries)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

/// Handle held by the store: enqueues mutations and nudges the worker.
#[derive(Clone)]
pub struct SyncAdapter {
    outbox: Arc<RwLock<Outbox>>,
    tx: mpsc::Sender<()>,
}

impl SyncAdapter {
    /// Persist the intent and wake the drain task. Never blocks the caller
    /// on the network and never surfaces an error for the mutation itself.
    pub async fn enqueue(&self, op: SyncOp) {
        if let Err(e) = self.outbox.write().await.enqueue(op).await {
            warn!(err = %e, "failed to persist outbox entry");
        }
        self.nudge();
    }

    /// Wake the worker without enqueueing. A full channel means a drain is
    /// already scheduled, so the send result is ignored.
    pub fn nudge(&self) {
        let _ = self.tx.try_send(());
    }

    pub async fn pending_count(&self) -> usize {
        self.outbox.read().await.pending().len()
    }

    pub async fn failed_count(&self) -> usize {
        self.outbox.read().await.failed().len()
    }

    pub async fn failed_entries(&self) -> Vec<OutboxEntry> {
        self.outbox.read().await.failed()
    }
}

/// Start the drain task. It wakes on every nudge and on a periodic
/// interval (the first tick fires immediately, draining entries left over
/// from a previous run).
pub fn spawn(
    remote: Arc<dyn RemoteStore>,
    session: SessionHandle,
    outbox: Outbox,
    retry: RetryConfig,
) -> SyncAdapter {
    let outbox = Arc::new(RwLock::new(outbox));
    let (tx, mut rx) = mpsc::channel::<()>(SYNC_QUEUE_CAPACITY);

    let worker_outbox = outbox.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SYNC_INTERVAL_SECS));
        loop {
            tokio::select! {
                received = rx.recv() => {
                    if received.is_none() {
                        break;
                    }
                    drain(remote.as_ref(), &session, &worker_outbox, &retry).await;
                }
                _ = interval.tick() => {
                    drain(remote.as_ref(), &session, &worker_outbox, &retry).await;
                }
            }
        }
        debug!("sync worker stopped");
    });

    SyncAdapter { outbox, tx }
}

/// One drain cycle: push pending entries in FIFO order until the queue is
/// empty or an entry keeps failing (it will be retried next cycle).
async fn drain(
    remote: &dyn RemoteStore,
    session: &SessionHandle,
    outbox: &Arc<RwLock<Outbox>>,
    retry: &RetryConfig,
) {
    let Some(auth) = session.read().await.clone() else {
        return;
    };

    loop {
        let Some(entry) = outbox.read().await.pending().into_iter().next() else {
            break;
        };

        let result = retry_with_backoff(retry, || push_op(remote, &auth, &entry.op)).await;
        match result {
            Ok(()) => {
                debug!(entry_id = %entry.id, "sync entry acknowledged");
                if let Err(e) = outbox.write().await.acknowledge(&entry.id).await {
                    warn!(err = %e, "failed to remove acknowledged outbox entry");
                    break;
                }
            }
            Err(e) => {
                warn!(entry_id = %entry.id, err = %e, "sync push failed");
                match outbox.write().await.record_failure(&entry.id).await {
                    Ok(true) => {
                        warn!(entry_id = %entry.id, "sync entry exhausted its retry budget");
                        // Exhausted entry is out of the pending set; move on.
                    }
                    Ok(false) => break, // wait for the next cycle
                    Err(e) => {
                        warn!(err = %e, "failed to record sync failure");
                        break;
                    }
                }
            }
        }
    }
}

async fn push_op(
    remote: &dyn RemoteStore,
    auth: &AuthSession,
    op: &SyncOp,
) -> Result<(), RemoteError> {
    match op {
        SyncOp::Insert(expense) => remote.insert_expense(auth, expense).await,
        SyncOp::Update { id, patch } => remote.update_expense(auth, id, patch).await,
        SyncOp::Delete { id } => remote.delete_expense(auth, id).await,
    }
}
