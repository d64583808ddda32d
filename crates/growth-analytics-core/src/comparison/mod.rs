//! Growth comparison, classification and visualization descriptor.
//!
//! Pipeline: Percentiles → Ideal (p50) → Ratios/BMI/Deltas → Classification → Descriptor

mod classify;
mod descriptor;
mod engine;

pub use classify::*;
pub use descriptor::*;
pub use engine::*;

use thiserror::Error;

use crate::models::ValidationError;
use crate::percentile::PercentileError;

/// Comparison errors.
#[derive(Error, Debug)]
pub enum ComparisonError {
    #[error(transparent)]
    Percentile(#[from] PercentileError),

    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(#[from] ValidationError),
}

pub type ComparisonResult<T> = Result<T, ComparisonError>;
