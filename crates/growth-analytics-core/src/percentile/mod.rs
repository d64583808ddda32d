//! Value ↔ percentile conversion against reference curves.
//!
//! Two-stage interpolation: first across age (to get the band values at the
//! exact age), then across the five bands (to place a value between them).

mod calculator;
mod curve;

pub use calculator::*;
pub use curve::*;

use thiserror::Error;

use crate::models::Metric;
use crate::reference::ReferenceError;

/// Percentile calculation errors.
#[derive(Error, Debug)]
pub enum PercentileError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("Invalid {} value: {value}", .metric.as_str())]
    InvalidValue { metric: Metric, value: f64 },

    #[error("Percentile must lie strictly between 0 and 100, got {0}")]
    InvalidPercentile(f64),
}

pub type CalculatorResult<T> = Result<T, PercentileError>;
