//! Persistent acquisition ledger.
//!
//! The ledger is the only durable state shared between runs: one record per
//! successfully completed item, keyed by `(scope, owner, item)`. Incremental
//! mode consults it to skip items that were already fetched.

pub mod store;

pub use store::{Ledger, LedgerRecord};
