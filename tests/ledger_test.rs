use hormiga::ledger::Ledger;
use hormiga::models::{Expense, ExpensePatch};

fn record(id: &str, amount: f64, timestamp: i64) -> Expense {
    Expense {
        id: id.to_string(),
        amount,
        timestamp,
        category: None,
        group_id: None,
    }
}

#[test]
fn add_prepends_and_returns_the_new_record() {
    let mut ledger = Ledger::new();
    let first = ledger.add(3.5, Some("food".to_string()), None);
    let second = ledger.add(7.0, None, None);

    assert_eq!(ledger.len(), 2);
    // Most recent first.
    assert_eq!(ledger.records()[0], second);
    assert_eq!(ledger.records()[1], first);
    assert_eq!(first.amount, 3.5);
    assert_eq!(first.category.as_deref(), Some("food"));
}

#[test]
fn generated_ids_are_unique() {
    let mut ledger = Ledger::new();
    let a = ledger.add(1.0, None, None);
    let b = ledger.add(1.0, None, None);
    assert_ne!(a.id, b.id);
}

#[test]
fn update_patches_only_provided_fields() {
    let mut ledger = Ledger::from_records(vec![record("e1", 10.0, 1_000)]);

    ledger.update(
        "e1",
        &ExpensePatch {
            amount: Some(12.5),
            category: None,
        },
    );
    let e = ledger.get("e1").unwrap();
    assert_eq!(e.amount, 12.5);
    assert_eq!(e.category, None);

    ledger.update(
        "e1",
        &ExpensePatch {
            amount: None,
            category: Some("food".to_string()),
        },
    );
    let e = ledger.get("e1").unwrap();
    assert_eq!(e.amount, 12.5);
    assert_eq!(e.category.as_deref(), Some("food"));
}

#[test]
fn update_with_unknown_id_changes_nothing() {
    let mut ledger = Ledger::from_records(vec![record("e1", 10.0, 1_000)]);
    let before = ledger.records().to_vec();

    ledger.update(
        "missing",
        &ExpensePatch {
            amount: Some(99.0),
            category: None,
        },
    );
    assert_eq!(ledger.records(), before.as_slice());
}

#[test]
fn remove_deletes_exactly_one_record() {
    let mut ledger = Ledger::from_records(vec![
        record("e1", 1.0, 1_000),
        record("e2", 2.0, 2_000),
        record("e3", 3.0, 3_000),
    ]);

    ledger.remove("e2");
    assert_eq!(ledger.len(), 2);
    assert!(ledger.get("e2").is_none());

    ledger.remove("missing");
    assert_eq!(ledger.len(), 2);
}

#[test]
fn total_since_includes_the_boundary_instant() {
    let ledger = Ledger::from_records(vec![
        record("e1", 5.0, 999),
        record("e2", 7.0, 1_000),
        record("e3", 11.0, 1_001),
    ]);
    assert_eq!(ledger.total_since(1_000), 18.0);
    assert_eq!(ledger.total_since(2_000), 0.0);
    assert_eq!(ledger.total_since(0), 23.0);
}

#[test]
fn replace_all_discards_previous_records() {
    let mut ledger = Ledger::from_records(vec![record("old", 1.0, 1)]);
    ledger.replace_all(vec![record("a", 2.0, 2), record("b", 3.0, 3)]);

    assert_eq!(ledger.len(), 2);
    assert!(ledger.get("old").is_none());
    assert!(ledger.get("a").is_some());
}

#[test]
fn empty_ledger_reports_empty() {
    let ledger = Ledger::new();
    assert!(ledger.is_empty());
    assert_eq!(ledger.total_since(0), 0.0);
}
