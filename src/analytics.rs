//! Pure, stateless aggregators over a snapshot of the ledger.
//!
//! All functions tolerate an empty input (zero totals, empty series) and
//! guard every division by flooring the denominator at 1 or returning 0
//! when the total is zero.

use std::collections::HashMap;

use crate::constants::{MS_PER_DAY, UNCATEGORIZED_BUCKET};
use crate::models::{CategoryTotal, DailyTotal, Expense, SpendingSummary};
use crate::utils::{date_string, days_between_floored, start_of_day_ms, start_of_month_ms};

/// Per-day sums over a trailing window of `days` calendar days ending on
/// the day containing `now_ms`, oldest first. Days without records carry a
/// zero total so the series always has exactly `days` points.
pub fn daily_series(expenses: &[Expense], days: i64, now_ms: i64) -> Vec<DailyTotal> {
    let days = days.max(1);
    let window_start = start_of_day_ms(now_ms) - (days - 1) * MS_PER_DAY;

    let mut totals = vec![0.0_f64; days as usize];
    for expense in expenses {
        let day_start = start_of_day_ms(expense.timestamp);
        if day_start < window_start {
            continue;
        }
        let offset = (day_start - window_start) / MS_PER_DAY;
        if let Some(slot) = totals.get_mut(offset as usize) {
            *slot += expense.amount;
        }
    }

    totals
        .into_iter()
        .enumerate()
        .map(|(i, total)| DailyTotal {
            date: date_string(window_start + i as i64 * MS_PER_DAY),
            total,
        })
        .collect()
}

/// Per-category sums, sorted by descending total for display emphasis.
/// Records without a category fold into the catch-all bucket.
pub fn category_breakdown(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut buckets: HashMap<String, f64> = HashMap::new();
    for expense in expenses {
        let key = expense
            .category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED_BUCKET.to_string());
        *buckets.entry(key).or_insert(0.0) += expense.amount;
    }

    let mut breakdown: Vec<CategoryTotal> = buckets
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect();

    // Descending by total; name as a deterministic tiebreaker.
    breakdown.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    breakdown
}

/// Total-to-date, current-month-to-date, record count, and the naive daily
/// average (total over days since the first record, denominator floored
/// at 1 — a single record created "now" averages to its own amount).
pub fn summary(expenses: &[Expense], now_ms: i64) -> SpendingSummary {
    let total_spent: f64 = expenses.iter().map(|e| e.amount).sum();
    let count = expenses.len();

    let month_start = start_of_month_ms(now_ms);
    let month_to_date: f64 = expenses
        .iter()
        .filter(|e| e.timestamp >= month_start)
        .map(|e| e.amount)
        .sum();

    let daily_average = match expenses.iter().map(|e| e.timestamp).min() {
        Some(first) => total_spent / days_between_floored(first, now_ms) as f64,
        None => 0.0,
    };

    SpendingSummary {
        total_spent,
        month_to_date,
        daily_average,
        count,
    }
}

/// Fraction of `total` contributed by `bucket_total`, in `[0, 1]`.
/// A zero or negative total yields 0, never NaN.
pub fn category_share(bucket_total: f64, total: f64) -> f64 {
    if total <= 0.0 {
        0.0
    } else {
        bucket_total / total
    }
}
