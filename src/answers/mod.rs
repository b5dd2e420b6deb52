//! Answer tracking for quiz review
//!
//! This module provides:
//! - The answer model (correct and missed answers)
//! - An append-only ledger with visibility toggles
//! - Calendar-day filtering

pub mod filter;
pub mod ledger;
pub mod models;

pub use filter::filter_by_date;
pub use ledger::{AnswerLedger, LedgerError};
pub use models::*;
