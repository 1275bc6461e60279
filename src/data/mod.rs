//! Ledger storage
//!
//! SQLite persistence for teams, reconciled matches and predictions.

pub mod database;

pub use database::{Database, DatabaseStats, NewMatch};
