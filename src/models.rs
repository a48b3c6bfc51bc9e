use serde::{Deserialize, Serialize};

/// A single expense record. `id` is generated client-side at creation time
/// and is stable for the record's lifetime; `timestamp` is milliseconds
/// since the epoch and never changes after creation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    pub timestamp: i64,
    pub category: Option<String>,
    pub group_id: Option<String>,
}

/// Mutable fields of an expense. `None` leaves the field unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

/// A shared budget group. The join `code` is a short human-shareable token
/// generated server-side at creation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub code: String,
    pub currency: String,
}

/// One roster entry in a group, with server-aggregated personal totals.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MemberStats {
    pub user_id: String,
    pub name: String,
    pub role: Role,
    pub total_spent: f64,
    pub transaction_count: u32,
}

/// Server-computed group dashboard payload.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GroupAnalytics {
    pub group_info: Group,
    pub members: Vec<MemberStats>,
    pub history: Vec<DailyTotal>,
    pub categories: Vec<CategoryTotal>,
}

/// A user-defined quick category (icon + label).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub icon: String,
    pub label: String,
}

/// Sum of expenses for one calendar day, `date` formatted `YYYY-MM-DD`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DailyTotal {
    pub date: String,
    pub total: f64,
}

/// Sum of expenses for one category bucket.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Derived scalars over the whole ledger.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpendingSummary {
    pub total_spent: f64,
    pub month_to_date: f64,
    /// Naive average: total divided by days since the first record,
    /// denominator floored at 1. Not a rolling average.
    pub daily_average: f64,
    pub count: usize,
}

/// An authenticated user session as issued by the remote service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub user_id: String,
    pub access_token: String,
}
