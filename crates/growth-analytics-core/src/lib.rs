//! Growth Analytics Core Library
//!
//! Pediatric growth percentiles, longitudinal comparison and risk
//! classification against population reference curves.
//!
//! # Architecture
//!
//! ```text
//! Stored measurements (external)
//!            │
//!            ▼
//!     HistoryAggregator ──── age from birth date, sort, dedupe by age
//!            │
//!            ▼
//!   PercentileCalculator ◄── ReferenceCurveStore (immutable, shared)
//!            │                age interpolation → band interpolation
//!            ▼
//!    ComparisonEngine ────── ideal (p50), ratios, BMI, deltas, classification
//!            │
//!            ▼
//!    DescriptorBuilder ───── bounded visualization parameters
//!            │
//!            ▼
//!     GrowthComparison → caller (API layer, external)
//! ```
//!
//! # Core Principle
//!
//! **Pure and repeatable.** Given the same measurements and reference tables,
//! every operation returns the same result. Nothing is persisted, nothing is
//! retried, and the reference store is never mutated after it is built.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Measurement, ReferenceCurvePoint, GrowthComparison, etc.)
//! - [`reference`]: Reference curve store and the built-in tables
//! - [`percentile`]: Value ↔ percentile interpolation
//! - [`history`]: Timeline ordering and previous-measurement selection
//! - [`comparison`]: Comparison engine, classification rules, descriptor
//! - [`service`]: `GetComparison`, `GetHistory`, `GetCurveSeries`
//! - [`export`]: Chart export (JSON/CSV)

pub mod comparison;
pub mod config;
pub mod export;
pub mod fingerprint;
pub mod history;
pub mod models;
pub mod percentile;
pub mod reference;
pub mod service;

// Re-export commonly used types
pub use comparison::{ComparisonEngine, DescriptorBuilder};
pub use config::{DescriptorConfig, EngineConfig};
pub use export::ChartExport;
pub use history::HistoryAggregator;
pub use models::{
    Gender, GrowthComparison, GrowthDescriptor, HealthStatus, Measurement, MeasurementSnapshot,
    Metric, PercentileResult, ReferenceCurvePoint,
};
pub use percentile::PercentileCalculator;
pub use reference::ReferenceCurveStore;
pub use service::{AnalyticsError, GrowthAnalytics};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

use chrono::NaiveDate;
use reference::ReferenceError;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum GrowthAnalyticsError {
    #[error("Reference data missing: {0}")]
    ReferenceDataMissing(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<AnalyticsError> for GrowthAnalyticsError {
    fn from(e: AnalyticsError) -> Self {
        match e.reference_error() {
            Some(ReferenceError::DataMissing { .. }) => {
                return GrowthAnalyticsError::ReferenceDataMissing(e.to_string())
            }
            Some(_) => return GrowthAnalyticsError::ConfigurationError(e.to_string()),
            None => {}
        }

        match e {
            AnalyticsError::Json(e) => GrowthAnalyticsError::SerializationError(e.to_string()),
            AnalyticsError::Config(e) => GrowthAnalyticsError::ConfigurationError(e.to_string()),
            other if other.is_validation_error() => {
                GrowthAnalyticsError::InvalidMeasurement(other.to_string())
            }
            other => GrowthAnalyticsError::InvalidInput(other.to_string()),
        }
    }
}

impl From<ReferenceError> for GrowthAnalyticsError {
    fn from(e: ReferenceError) -> Self {
        AnalyticsError::from(e).into()
    }
}

impl From<serde_json::Error> for GrowthAnalyticsError {
    fn from(e: serde_json::Error) -> Self {
        GrowthAnalyticsError::SerializationError(e.to_string())
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, GrowthAnalyticsError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| GrowthAnalyticsError::InvalidInput(format!("date '{}': {}", value, e)))
}

fn parse_gender(value: &str) -> Result<Gender, GrowthAnalyticsError> {
    Gender::parse(value)
        .ok_or_else(|| GrowthAnalyticsError::InvalidInput(format!("unknown gender '{}'", value)))
}

fn parse_metric(value: &str) -> Result<Metric, GrowthAnalyticsError> {
    Metric::parse(value)
        .ok_or_else(|| GrowthAnalyticsError::InvalidInput(format!("unknown metric '{}'", value)))
}

fn parse_measurements(
    measurements: Vec<FfiMeasurement>,
) -> Result<Vec<Measurement>, GrowthAnalyticsError> {
    measurements.into_iter().map(Measurement::try_from).collect()
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install a `tracing` subscriber honoring `RUST_LOG`. Safe to call repeatedly.
#[uniffi::export]
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init();
}

/// Engine over the built-in reference tables.
#[uniffi::export]
pub fn open_standard_engine() -> Arc<GrowthAnalyticsCore> {
    Arc::new(GrowthAnalyticsCore {
        analytics: GrowthAnalytics::standard(),
    })
}

/// Engine over a custom reference table (JSON array of rows) and optional
/// JSON configuration.
#[uniffi::export]
pub fn open_engine_from_json(
    table_json: String,
    config_json: Option<String>,
) -> Result<Arc<GrowthAnalyticsCore>, GrowthAnalyticsError> {
    let store = ReferenceCurveStore::from_json_str(&table_json)?;
    let config = match config_json {
        Some(json) => EngineConfig::from_json_str(&json)?,
        None => EngineConfig::default(),
    };
    let analytics = GrowthAnalytics::new(Arc::new(store), config)?;
    Ok(Arc::new(GrowthAnalyticsCore { analytics }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe engine handle for FFI. Immutable, so no locking is needed.
#[derive(uniffi::Object)]
pub struct GrowthAnalyticsCore {
    analytics: GrowthAnalytics,
}

#[uniffi::export]
impl GrowthAnalyticsCore {
    /// Compare the latest measurement on or before `as_of` (YYYY-MM-DD).
    pub fn get_comparison(
        &self,
        gender: String,
        birth_date: String,
        measurements: Vec<FfiMeasurement>,
        as_of: String,
    ) -> Result<FfiGrowthComparison, GrowthAnalyticsError> {
        let gender = parse_gender(&gender)?;
        let birth_date = parse_date(&birth_date)?;
        let as_of = parse_date(&as_of)?;
        let measurements = parse_measurements(measurements)?;

        let comparison =
            self.analytics
                .get_comparison(gender, birth_date, &measurements, as_of)?;
        FfiGrowthComparison::try_from(comparison)
    }

    /// Percentile history, youngest first.
    pub fn get_history(
        &self,
        gender: String,
        measurements: Vec<FfiMeasurement>,
    ) -> Result<Vec<FfiMeasurementSnapshot>, GrowthAnalyticsError> {
        let gender = parse_gender(&gender)?;
        let measurements = parse_measurements(measurements)?;
        let snapshots = self.analytics.get_history(gender, &measurements)?;
        Ok(snapshots.into_iter().map(|s| s.into()).collect())
    }

    /// Reference rows from birth up to `max_age_months`.
    pub fn get_curve_series(
        &self,
        gender: String,
        metric: String,
        max_age_months: u32,
    ) -> Result<Vec<FfiCurvePoint>, GrowthAnalyticsError> {
        let gender = parse_gender(&gender)?;
        let metric = parse_metric(&metric)?;
        let series = self
            .analytics
            .get_curve_series(gender, metric, max_age_months)?;
        Ok(series.into_iter().map(|p| p.into()).collect())
    }

    /// Chart export as CSV.
    pub fn export_chart_csv(
        &self,
        gender: String,
        metric: String,
        max_age_months: u32,
        measurements: Vec<FfiMeasurement>,
    ) -> Result<String, GrowthAnalyticsError> {
        let gender = parse_gender(&gender)?;
        let metric = parse_metric(&metric)?;
        let measurements = parse_measurements(measurements)?;
        let export = self
            .analytics
            .export_chart(gender, metric, max_age_months, &measurements)?;
        Ok(export.to_csv())
    }

    /// Chart export as JSON.
    pub fn export_chart_json(
        &self,
        gender: String,
        metric: String,
        max_age_months: u32,
        measurements: Vec<FfiMeasurement>,
    ) -> Result<String, GrowthAnalyticsError> {
        let gender = parse_gender(&gender)?;
        let metric = parse_metric(&metric)?;
        let measurements = parse_measurements(measurements)?;
        let export = self
            .analytics
            .export_chart(gender, metric, max_age_months, &measurements)?;
        Ok(export.to_json()?)
    }

    /// Cache key for a `get_comparison` call with the same arguments.
    pub fn comparison_cache_key(
        &self,
        gender: String,
        birth_date: String,
        measurements: Vec<FfiMeasurement>,
        as_of: String,
    ) -> Result<String, GrowthAnalyticsError> {
        let gender = parse_gender(&gender)?;
        let birth_date = parse_date(&birth_date)?;
        let as_of = parse_date(&as_of)?;
        let measurements = parse_measurements(measurements)?;
        Ok(self
            .analytics
            .comparison_cache_key(gender, birth_date, &measurements, as_of)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe measurement. Dates are ISO `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMeasurement {
    pub patient_id: String,
    pub taken_on: String,
    pub age_months: u32,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub head_circumference_cm: Option<f64>,
}

impl TryFrom<FfiMeasurement> for Measurement {
    type Error = GrowthAnalyticsError;

    fn try_from(m: FfiMeasurement) -> Result<Self, Self::Error> {
        Ok(Measurement {
            patient_id: m.patient_id,
            taken_on: parse_date(&m.taken_on)?,
            age_months: m.age_months,
            weight_kg: m.weight_kg,
            height_cm: m.height_cm,
            head_circumference_cm: m.head_circumference_cm,
        })
    }
}

impl From<Measurement> for FfiMeasurement {
    fn from(m: Measurement) -> Self {
        Self {
            patient_id: m.patient_id,
            taken_on: m.taken_on.to_string(),
            age_months: m.age_months,
            weight_kg: m.weight_kg,
            height_cm: m.height_cm,
            head_circumference_cm: m.head_circumference_cm,
        }
    }
}

/// FFI-safe percentile result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPercentileResult {
    pub metric: String,
    pub value: f64,
    pub percentile: f64,
    pub extrapolated: bool,
}

impl From<PercentileResult> for FfiPercentileResult {
    fn from(r: PercentileResult) -> Self {
        Self {
            metric: r.metric.as_str().to_string(),
            value: r.value,
            percentile: r.percentile,
            extrapolated: r.extrapolated,
        }
    }
}

/// FFI-safe measurement with percentiles.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMeasurementSnapshot {
    pub measurement: FfiMeasurement,
    pub percentile_results: Vec<FfiPercentileResult>,
}

impl From<MeasurementSnapshot> for FfiMeasurementSnapshot {
    fn from(s: MeasurementSnapshot) -> Self {
        Self {
            measurement: s.measurement.into(),
            percentile_results: s.percentile_results.into_iter().map(|r| r.into()).collect(),
        }
    }
}

/// FFI-safe per-metric changes.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGrowthChanges {
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub head_circumference_cm: Option<f64>,
    pub months_elapsed: u32,
}

/// FFI-safe visualization descriptor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGrowthDescriptor {
    pub scale_xz: f64,
    pub scale_y: f64,
    pub body_fat_intensity: f64,
    pub abdominal_expansion: f64,
}

impl From<GrowthDescriptor> for FfiGrowthDescriptor {
    fn from(d: GrowthDescriptor) -> Self {
        Self {
            scale_xz: d.scale_xz,
            scale_y: d.scale_y,
            body_fat_intensity: d.body_fat_intensity,
            abdominal_expansion: d.abdominal_expansion,
        }
    }
}

/// FFI-safe growth comparison.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGrowthComparison {
    pub current: FfiMeasurementSnapshot,
    pub previous: Option<FfiMeasurementSnapshot>,
    pub ideal_weight_kg: f64,
    pub ideal_height_cm: f64,
    pub ratio_weight: Option<f64>,
    pub ratio_height: Option<f64>,
    pub changes: Option<FfiGrowthChanges>,
    pub bmi: Option<f64>,
    pub health_status: String,
    pub extrapolated: bool,
    pub transform_3d: FfiGrowthDescriptor,
    /// SHA-256 of the comparison's canonical JSON
    pub fingerprint: String,
}

impl TryFrom<GrowthComparison> for FfiGrowthComparison {
    type Error = GrowthAnalyticsError;

    fn try_from(c: GrowthComparison) -> Result<Self, Self::Error> {
        let fingerprint = c.fingerprint()?;
        Ok(Self {
            current: c.current.into(),
            previous: c.previous.map(|p| p.into()),
            ideal_weight_kg: c.ideal.weight_kg,
            ideal_height_cm: c.ideal.height_cm,
            ratio_weight: c.ratios.weight,
            ratio_height: c.ratios.height,
            changes: c.changes.map(|ch| FfiGrowthChanges {
                weight_kg: ch.weight_kg,
                height_cm: ch.height_cm,
                head_circumference_cm: ch.head_circumference_cm,
                months_elapsed: ch.months_elapsed,
            }),
            bmi: c.bmi,
            health_status: c.health_status.as_str().to_string(),
            extrapolated: c.extrapolated,
            transform_3d: c.transform_3d.into(),
            fingerprint,
        })
    }
}

/// FFI-safe reference row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCurvePoint {
    pub metric: String,
    pub gender: String,
    pub age_months: u32,
    pub p3: f64,
    pub p15: f64,
    pub p50: f64,
    pub p85: f64,
    pub p97: f64,
}

impl From<ReferenceCurvePoint> for FfiCurvePoint {
    fn from(p: ReferenceCurvePoint) -> Self {
        Self {
            metric: p.metric.as_str().to_string(),
            gender: p.gender.as_str().to_string(),
            age_months: p.age_months,
            p3: p.percentiles.p3,
            p15: p.percentiles.p15,
            p50: p.percentiles.p50,
            p85: p.percentiles.p85,
            p97: p.percentiles.p97,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffi_measurement(taken_on: &str, weight: f64, height: f64) -> FfiMeasurement {
        FfiMeasurement {
            patient_id: "patient-1".into(),
            taken_on: taken_on.into(),
            age_months: 0,
            weight_kg: Some(weight),
            height_cm: Some(height),
            head_circumference_cm: None,
        }
    }

    #[test]
    fn test_ffi_comparison() {
        let core = open_standard_engine();
        let comparison = core
            .get_comparison(
                "female".into(),
                "2023-03-01".into(),
                vec![
                    ffi_measurement("2023-09-01", 7.3, 65.7),
                    ffi_measurement("2024-03-01", 8.9, 74.0),
                ],
                "2024-06-01".into(),
            )
            .unwrap();

        assert_eq!(comparison.health_status, "normal");
        assert_eq!(comparison.current.measurement.age_months, 12);
        assert_eq!(comparison.previous.unwrap().measurement.age_months, 6);
        assert_eq!(comparison.fingerprint.len(), 64);
    }

    #[test]
    fn test_ffi_rejects_bad_input() {
        let core = open_standard_engine();

        let err = core
            .get_curve_series("unknown".into(), "weight".into(), 24)
            .unwrap_err();
        assert!(matches!(err, GrowthAnalyticsError::InvalidInput(_)));

        let err = core
            .get_comparison(
                "male".into(),
                "not-a-date".into(),
                vec![],
                "2024-06-01".into(),
            )
            .unwrap_err();
        assert!(matches!(err, GrowthAnalyticsError::InvalidInput(_)));
    }

    #[test]
    fn test_ffi_invalid_current_measurement() {
        let core = open_standard_engine();
        let err = core
            .get_comparison(
                "male".into(),
                "2023-03-01".into(),
                vec![ffi_measurement("2024-03-01", 0.0, 74.0)],
                "2024-06-01".into(),
            )
            .unwrap_err();
        assert!(matches!(err, GrowthAnalyticsError::InvalidMeasurement(_)));
    }

    #[test]
    fn test_ffi_missing_reference_data() {
        let table = r#"[{"metric":"weight","gender":"male","age_months":0,
            "percentiles":{"p3":2.5,"p15":2.9,"p50":3.3,"p85":3.9,"p97":4.3}}]"#;
        let core = open_engine_from_json(table.into(), None).unwrap();

        let err = core
            .get_curve_series("female".into(), "weight".into(), 12)
            .unwrap_err();
        assert!(matches!(err, GrowthAnalyticsError::ReferenceDataMissing(_)));
    }

    #[test]
    fn test_ffi_bad_table_is_configuration_error() {
        let err = open_engine_from_json("[]".into(), Some("{\"percentile_floor\": 200}".into()))
            .err()
            .unwrap();
        assert!(matches!(err, GrowthAnalyticsError::ConfigurationError(_)));
    }

    #[test]
    fn test_ffi_history_before_birth_does_not_fail_comparison() {
        let core = open_standard_engine();
        let comparison = core
            .get_comparison(
                "male".into(),
                "2023-07-01".into(),
                vec![
                    ffi_measurement("2023-06-01", 3.0, 50.0),
                    ffi_measurement("2024-07-01", 9.6, 75.7),
                ],
                "2024-07-01".into(),
            )
            .unwrap();
        assert!(comparison.previous.is_none());

        let err = core
            .get_comparison(
                "male".into(),
                "2023-07-01".into(),
                vec![ffi_measurement("2023-06-01", 3.0, 50.0)],
                "2023-06-15".into(),
            )
            .unwrap_err();
        assert!(matches!(err, GrowthAnalyticsError::InvalidMeasurement(_)));
    }

    #[test]
    fn test_ffi_curve_series() {
        let core = open_standard_engine();
        let series = core
            .get_curve_series("m".into(), "height".into(), 60)
            .unwrap();
        assert_eq!(series.len(), 18);
        assert_eq!(series[0].p50, 49.9);
        assert_eq!(series[17].metric, "height");
    }
}
