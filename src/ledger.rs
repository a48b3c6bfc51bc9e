use uuid::Uuid;

use crate::models::{Expense, ExpensePatch};
use crate::utils::now_ms;

/// The client-held ordered collection of expense records, most-recent-first.
///
/// The ledger is pure in-memory state: no I/O, no locking. The owning store
/// serializes access and mirrors every mutation to durable storage and the
/// sync outbox.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    expenses: Vec<Expense>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<Expense>) -> Self {
        Self { expenses: records }
    }

    /// Append a new record with a fresh identifier and the current time.
    /// Prepended so that insertion order equals recency.
    pub fn add(
        &mut self,
        amount: f64,
        category: Option<String>,
        group_id: Option<String>,
    ) -> Expense {
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            amount,
            timestamp: now_ms(),
            category,
            group_id,
        };
        self.expenses.insert(0, expense.clone());
        expense
    }

    /// Replace the mutable fields of the matching record in place.
    /// Silent no-op when `id` is absent.
    pub fn update(&mut self, id: &str, patch: &ExpensePatch) {
        if let Some(expense) = self.expenses.iter_mut().find(|e| e.id == id) {
            if let Some(amount) = patch.amount {
                expense.amount = amount;
            }
            if let Some(category) = &patch.category {
                expense.category = Some(category.clone());
            }
        }
    }

    /// Delete the matching record. Silent no-op when absent.
    pub fn remove(&mut self, id: &str) {
        self.expenses.retain(|e| e.id != id);
    }

    /// One-shot hydration from the remote store. Discards any local-only
    /// state accumulated before hydration completed.
    pub fn replace_all(&mut self, records: Vec<Expense>) {
        self.expenses = records;
    }

    /// Sum of `amount` over records with `timestamp >= instant`.
    pub fn total_since(&self, instant_ms: i64) -> f64 {
        self.expenses
            .iter()
            .filter(|e| e.timestamp >= instant_ms)
            .map(|e| e.amount)
            .sum()
    }

    pub fn records(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn get(&self, id: &str) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }
}
