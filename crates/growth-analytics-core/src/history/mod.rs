//! Measurement history ordering.
//!
//! The only place that reasons about more than one measurement at a time.

mod aggregator;

pub use aggregator::*;

use chrono::NaiveDate;
use thiserror::Error;

/// History errors.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Measurement taken on {taken_on} predates birth date {birth_date}")]
    BeforeBirth {
        taken_on: NaiveDate,
        birth_date: NaiveDate,
    },
}

pub type HistoryResult<T> = Result<T, HistoryError>;
