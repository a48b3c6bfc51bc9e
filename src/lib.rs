//! hormiga — local-first micro-expense ledger with optimistic remote sync.
//!
//! The crate is organized around a [`store::ExpenseStore`] constructed once
//! at application start and passed by reference to every consumer. Mutations
//! apply to the in-memory ledger first, are persisted to a local JSON blob,
//! and are then queued for background synchronization against the remote
//! data service when a session is authenticated.

pub mod analytics;
pub mod config;
pub mod constants;
pub mod export;
pub mod gateway;
pub mod ledger;
pub mod models;
pub mod remote;
pub mod retry;
pub mod session;
pub mod storage;
pub mod store;
pub mod sync;
pub mod utils;

pub use models::{AuthSession, Expense, ExpensePatch, Group, Role};
pub use store::ExpenseStore;
