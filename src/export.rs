use crate::models::Expense;
use crate::utils::{date_string, start_of_day_ms, time_string};

const CSV_HEADER: &str = "Date,Time,Amount,Category";

/// Serialize records to the downloadable comma-separated format.
pub fn to_csv(expenses: &[Expense]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for expense in expenses {
        out.push_str(&date_string(expense.timestamp));
        out.push(',');
        out.push_str(&time_string(expense.timestamp));
        out.push(',');
        out.push_str(&format!("{:.2}", expense.amount));
        out.push(',');
        out.push_str(expense.category.as_deref().unwrap_or(""));
        out.push('\n');
    }
    out
}

/// CSV restricted to records from the calendar day containing `now_ms`.
pub fn today_csv(expenses: &[Expense], now_ms: i64) -> String {
    let start = start_of_day_ms(now_ms);
    let today: Vec<Expense> = expenses
        .iter()
        .filter(|e| e.timestamp >= start)
        .cloned()
        .collect();
    to_csv(&today)
}

/// Suggested download name, e.g. `gastos-2026-08-23.csv`.
pub fn export_file_name(now_ms: i64) -> String {
    format!("gastos-{}.csv", date_string(now_ms))
}
