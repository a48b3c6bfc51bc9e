//! The expense store: ledger + durable storage + sync adapter, composed
//! behind one object.
//!
//! Constructed once at application start and passed by reference to every
//! consumer. Every mutation follows the same write-through path: validate,
//! apply to the in-memory ledger (optimistic — readers see it immediately),
//! persist the blob, then enqueue the remote mutation when a session
//! exists. The caller never waits on the network.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::analytics;
use crate::export;
use crate::ledger::Ledger;
use crate::models::{CategoryTotal, DailyTotal, Expense, ExpensePatch, SpendingSummary};
use crate::remote::{RemoteError, RemoteStore};
use crate::retry::RetryConfig;
use crate::session::SessionHandle;
use crate::storage::{LedgerStorage, PersistedState};
use crate::sync::{self, Outbox, SyncAdapter, SyncOp};
use crate::utils::{now_ms, start_of_day_ms, validate_amount};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("no remote store configured")]
    NoRemote,
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

struct StoreState {
    ledger: Ledger,
    history_open: bool,
}

impl StoreState {
    fn persisted(&self) -> PersistedState {
        PersistedState {
            expenses: self.ledger.records().to_vec(),
            history_open: self.history_open,
        }
    }
}

pub struct ExpenseStore {
    state: RwLock<StoreState>,
    storage: LedgerStorage,
    session: SessionHandle,
    remote: Option<Arc<dyn RemoteStore>>,
    sync: Option<SyncAdapter>,
}

impl ExpenseStore {
    /// Open the store, loading the persisted blob and any outbox entries
    /// left over from a previous run. `remote: None` is local-only mode —
    /// no sync worker is started.
    pub async fn open(
        data_dir: impl AsRef<Path>,
        remote: Option<Arc<dyn RemoteStore>>,
        session: SessionHandle,
    ) -> anyhow::Result<Self> {
        Self::open_with_retry(data_dir, remote, session, RetryConfig::default()).await
    }

    pub async fn open_with_retry(
        data_dir: impl AsRef<Path>,
        remote: Option<Arc<dyn RemoteStore>>,
        session: SessionHandle,
        retry: RetryConfig,
    ) -> anyhow::Result<Self> {
        let storage = LedgerStorage::new(&data_dir);
        let persisted = storage.load().await?;

        let sync = match &remote {
            Some(remote) => {
                let outbox = Outbox::load(&data_dir).await?;
                Some(sync::spawn(
                    remote.clone(),
                    session.clone(),
                    outbox,
                    retry,
                ))
            }
            None => None,
        };

        Ok(Self {
            state: RwLock::new(StoreState {
                ledger: Ledger::from_records(persisted.expenses),
                history_open: persisted.history_open,
            }),
            storage,
            session,
            remote,
            sync,
        })
    }

    // ── Mutations ──

    /// Record a new expense. Validation happens before any state change;
    /// the returned record is already visible to readers when this returns.
    pub async fn add_expense(
        &self,
        amount: f64,
        category: Option<String>,
        group_id: Option<String>,
    ) -> Result<Expense, StoreError> {
        validate_amount(amount).map_err(StoreError::Validation)?;

        let (expense, snapshot) = {
            let mut state = self.state.write().await;
            let expense = state.ledger.add(amount, category, group_id);
            (expense, state.persisted())
        };
        self.storage.save(&snapshot).await?;
        self.queue(SyncOp::Insert(expense.clone())).await;
        Ok(expense)
    }

    /// Edit the mutable fields of a record. A missing `id` is a silent
    /// no-op: nothing is persisted and nothing is queued.
    pub async fn update_expense(&self, id: &str, patch: ExpensePatch) -> Result<(), StoreError> {
        if let Some(amount) = patch.amount {
            validate_amount(amount).map_err(StoreError::Validation)?;
        }

        let snapshot = {
            let mut state = self.state.write().await;
            if state.ledger.get(id).is_none() {
                return Ok(());
            }
            state.ledger.update(id, &patch);
            state.persisted()
        };
        self.storage.save(&snapshot).await?;
        self.queue(SyncOp::Update {
            id: id.to_string(),
            patch,
        })
        .await;
        Ok(())
    }

    /// Delete a record. A missing `id` is a silent no-op.
    pub async fn remove_expense(&self, id: &str) -> Result<(), StoreError> {
        let snapshot = {
            let mut state = self.state.write().await;
            if state.ledger.get(id).is_none() {
                return Ok(());
            }
            state.ledger.remove(id);
            state.persisted()
        };
        self.storage.save(&snapshot).await?;
        self.queue(SyncOp::Delete { id: id.to_string() }).await;
        Ok(())
    }

    /// One-shot hydration with records already fetched from the remote.
    /// Discards local-only state accumulated before hydration completed.
    pub async fn hydrate(&self, records: Vec<Expense>) -> Result<(), StoreError> {
        let snapshot = {
            let mut state = self.state.write().await;
            state.ledger.replace_all(records);
            state.persisted()
        };
        self.storage.save(&snapshot).await?;
        Ok(())
    }

    /// Fetch the authenticated user's expenses from the remote store and
    /// hydrate the ledger with them. Returns the number of records loaded.
    pub async fn hydrate_from_remote(&self) -> Result<usize, StoreError> {
        let remote = self.remote.as_ref().ok_or(StoreError::NoRemote)?;
        let auth = self
            .session
            .read()
            .await
            .clone()
            .ok_or(StoreError::NotAuthenticated)?;

        let records = remote.fetch_expenses(&auth).await?;
        let count = records.len();
        self.hydrate(records).await?;
        Ok(count)
    }

    // ── Reads ──

    pub async fn snapshot(&self) -> Vec<Expense> {
        self.state.read().await.ledger.records().to_vec()
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.ledger.len()
    }

    pub async fn total_since(&self, instant_ms: i64) -> f64 {
        self.state.read().await.ledger.total_since(instant_ms)
    }

    /// Sum of today's expenses ("Today: $X" on the main view).
    pub async fn today_total(&self) -> f64 {
        self.total_since(start_of_day_ms(now_ms())).await
    }

    pub async fn summary(&self) -> SpendingSummary {
        analytics::summary(self.state.read().await.ledger.records(), now_ms())
    }

    pub async fn daily_series(&self, days: i64) -> Vec<DailyTotal> {
        analytics::daily_series(self.state.read().await.ledger.records(), days, now_ms())
    }

    pub async fn category_breakdown(&self) -> Vec<CategoryTotal> {
        analytics::category_breakdown(self.state.read().await.ledger.records())
    }

    // ── UI flags ──

    pub async fn history_open(&self) -> bool {
        self.state.read().await.history_open
    }

    pub async fn set_history_open(&self, open: bool) -> Result<(), StoreError> {
        let snapshot = {
            let mut state = self.state.write().await;
            state.history_open = open;
            state.persisted()
        };
        self.storage.save(&snapshot).await?;
        Ok(())
    }

    // ── Export ──

    pub async fn export_csv(&self) -> String {
        export::to_csv(self.state.read().await.ledger.records())
    }

    pub async fn export_today_csv(&self) -> String {
        export::today_csv(self.state.read().await.ledger.records(), now_ms())
    }

    // ── Diagnostics ──

    pub async fn pending_sync(&self) -> usize {
        match &self.sync {
            Some(sync) => sync.pending_count().await,
            None => 0,
        }
    }

    pub async fn failed_sync(&self) -> usize {
        match &self.sync {
            Some(sync) => sync.failed_count().await,
            None => 0,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Enqueue a remote mutation when syncing is possible. Local-only mode
    /// and unauthenticated sessions skip the remote component entirely.
    async fn queue(&self, op: SyncOp) {
        let Some(sync) = &self.sync else {
            return;
        };
        if self.session.read().await.is_none() {
            return;
        }
        sync.enqueue(op).await;
    }
}
