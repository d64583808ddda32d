//! Immutable percentile reference tables.
//!
//! Rows live in a single arena sorted by (metric, gender, age); each
//! (metric, gender) curve is a contiguous slice of it. A store is built once
//! and shared read-only between any number of concurrent computations.

mod standard;
mod store;

pub use standard::*;
pub use store::*;

use thiserror::Error;

use crate::models::{Gender, Metric};

/// Reference table errors.
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("No reference data for {} / {}", .metric.as_str(), .gender.as_str())]
    DataMissing { metric: Metric, gender: Gender },

    #[error("Invalid reference table: {0}")]
    InvalidTable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReferenceResult<T> = Result<T, ReferenceError>;
