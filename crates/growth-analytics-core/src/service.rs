//! The three operations offered to the API layer.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::comparison::{ComparisonEngine, ComparisonError};
use crate::config::{ConfigError, EngineConfig};
use crate::fingerprint::fingerprint;
use crate::history::{HistoryAggregator, HistoryError};
use crate::models::{Gender, GrowthComparison, Measurement, MeasurementSnapshot, Metric, ReferenceCurvePoint};
use crate::percentile::{PercentileCalculator, PercentileError};
use crate::reference::{ReferenceCurveStore, ReferenceError};

/// Service-level errors.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Percentile(#[from] PercentileError),

    #[error(transparent)]
    Comparison(#[from] ComparisonError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("No measurement taken on or before {as_of}")]
    NoCurrentMeasurement { as_of: NaiveDate },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyticsError {
    /// The underlying reference-table error, however deeply wrapped.
    pub fn reference_error(&self) -> Option<&ReferenceError> {
        match self {
            AnalyticsError::Reference(e)
            | AnalyticsError::Percentile(PercentileError::Reference(e))
            | AnalyticsError::Comparison(ComparisonError::Percentile(PercentileError::Reference(e))) => {
                Some(e)
            }
            _ => None,
        }
    }

    /// True for input problems the caller can fix (as opposed to configuration).
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            AnalyticsError::Comparison(ComparisonError::InvalidMeasurement(_))
                | AnalyticsError::Percentile(PercentileError::InvalidValue { .. })
                | AnalyticsError::Percentile(PercentileError::InvalidPercentile(_))
                | AnalyticsError::History(_)
                | AnalyticsError::NoCurrentMeasurement { .. }
        )
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Inputs that fully determine a comparison, hashed as a cache key.
#[derive(Serialize)]
struct ComparisonRequest<'r> {
    gender: Gender,
    birth_date: NaiveDate,
    as_of: NaiveDate,
    measurements: &'r [Measurement],
    config: &'r EngineConfig,
}

/// Growth analytics over a shared, immutable reference store.
///
/// Cheap to clone; every operation is a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct GrowthAnalytics {
    store: Arc<ReferenceCurveStore>,
    config: EngineConfig,
    aggregator: HistoryAggregator,
}

impl GrowthAnalytics {
    /// Create a service over a custom store and configuration.
    pub fn new(store: Arc<ReferenceCurveStore>, config: EngineConfig) -> AnalyticsResult<Self> {
        config.validate()?;
        info!(rows = store.len(), "Growth analytics engine ready");
        Ok(Self {
            store,
            config,
            aggregator: HistoryAggregator::new(),
        })
    }

    /// Service over the built-in reference tables with default configuration.
    pub fn standard() -> Self {
        Self {
            store: ReferenceCurveStore::standard(),
            config: EngineConfig::default(),
            aggregator: HistoryAggregator::new(),
        }
    }

    pub fn store(&self) -> &ReferenceCurveStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calculator(&self) -> PercentileCalculator<'_> {
        PercentileCalculator::from_validated(&self.store, &self.config)
    }

    pub fn comparison_engine(&self) -> ComparisonEngine<'_> {
        ComparisonEngine::from_validated(self.calculator(), &self.config)
    }

    /// Compare the latest measurement taken on or before `as_of` against the
    /// one before it and the age-matched ideal.
    ///
    /// Ages are re-derived from `birth_date` so every measurement is aged the
    /// same way. Only a current measurement dated before birth is an error;
    /// earlier records dated before birth are left out of the history.
    pub fn get_comparison(
        &self,
        gender: Gender,
        birth_date: NaiveDate,
        measurements: &[Measurement],
        as_of: NaiveDate,
    ) -> AnalyticsResult<GrowthComparison> {
        let current = self
            .aggregator
            .current_as_of(measurements, as_of)
            .ok_or(AnalyticsError::NoCurrentMeasurement { as_of })?;
        let current = self.aggregator.age_from(current, birth_date)?;

        let earlier: Vec<Measurement> = measurements
            .iter()
            .filter(|m| m.taken_on <= as_of)
            .cloned()
            .collect();
        let timeline = self
            .aggregator
            .timeline(&self.aggregator.with_ages_from(&earlier, birth_date));
        let previous = self.aggregator.previous_before(&timeline, &current);

        debug!(
            current = %current.taken_on,
            previous = ?previous.map(|m| m.taken_on),
            timeline = timeline.len(),
            "Selected measurements for comparison"
        );

        Ok(self
            .comparison_engine()
            .compare(&current, previous, gender)?)
    }

    /// Percentiles for every timeline entry, youngest first (for charting).
    pub fn get_history(
        &self,
        gender: Gender,
        measurements: &[Measurement],
    ) -> AnalyticsResult<Vec<MeasurementSnapshot>> {
        let engine = self.comparison_engine();
        self.aggregator
            .timeline(measurements)
            .iter()
            .map(|m| engine.snapshot(m, gender).map_err(AnalyticsError::from))
            .collect()
    }

    /// Reference rows from birth to `max_age_months` (for percentile bands).
    pub fn get_curve_series(
        &self,
        gender: Gender,
        metric: Metric,
        max_age_months: u32,
    ) -> AnalyticsResult<Vec<ReferenceCurvePoint>> {
        Ok(self.store.series(metric, gender, max_age_months)?)
    }

    /// Stable key for caching the result of [`get_comparison`](Self::get_comparison).
    pub fn comparison_cache_key(
        &self,
        gender: Gender,
        birth_date: NaiveDate,
        measurements: &[Measurement],
        as_of: NaiveDate,
    ) -> AnalyticsResult<String> {
        Ok(fingerprint(&ComparisonRequest {
            gender,
            birth_date,
            as_of,
            measurements,
            config: &self.config,
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history() -> Vec<Measurement> {
        vec![
            Measurement::new("p-1", date(2024, 1, 10), 0)
                .with_weight(7.9)
                .with_height(67.6),
            Measurement::new("p-1", date(2024, 7, 10), 0)
                .with_weight(9.6)
                .with_height(75.7),
            Measurement::new("p-1", date(2025, 1, 10), 0)
                .with_weight(10.9)
                .with_height(82.3),
        ]
    }

    #[test]
    fn test_get_comparison_as_of() {
        let service = GrowthAnalytics::standard();
        let comparison = service
            .get_comparison(Gender::Male, date(2023, 7, 10), &history(), date(2024, 12, 1))
            .unwrap();

        assert_eq!(comparison.current.measurement.age_months, 12);
        let previous = comparison.previous.unwrap();
        assert_eq!(previous.measurement.age_months, 6);
        assert_eq!(comparison.health_status, HealthStatus::Normal);
        assert_eq!(comparison.changes.unwrap().months_elapsed, 6);
    }

    #[test]
    fn test_get_comparison_without_current() {
        let service = GrowthAnalytics::standard();
        let err = service
            .get_comparison(Gender::Male, date(2023, 7, 10), &history(), date(2023, 12, 1))
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::NoCurrentMeasurement { .. }));
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_history_record_before_birth_is_skipped() {
        let service = GrowthAnalytics::standard();
        let measurements = vec![
            Measurement::new("p-1", date(2023, 6, 1), 0).with_weight(3.0),
            Measurement::new("p-1", date(2024, 1, 1), 0)
                .with_weight(7.9)
                .with_height(67.6),
            Measurement::new("p-1", date(2024, 7, 1), 0)
                .with_weight(9.6)
                .with_height(75.7),
        ];

        let comparison = service
            .get_comparison(Gender::Male, date(2023, 7, 1), &measurements, date(2024, 7, 1))
            .unwrap();
        assert_eq!(comparison.health_status, HealthStatus::Normal);
        assert_eq!(comparison.current.measurement.age_months, 12);
        assert_eq!(comparison.previous.unwrap().measurement.age_months, 6);
    }

    #[test]
    fn test_current_before_birth_is_rejected() {
        let service = GrowthAnalytics::standard();
        let measurements = vec![
            Measurement::new("p-1", date(2023, 6, 1), 0).with_weight(3.0),
            Measurement::new("p-1", date(2024, 1, 1), 0).with_weight(7.9),
        ];

        let err = service
            .get_comparison(Gender::Male, date(2023, 7, 1), &measurements, date(2023, 6, 15))
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::History(HistoryError::BeforeBirth { .. })
        ));
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_get_history_ordered() {
        let service = GrowthAnalytics::standard();
        let mut measurements = history();
        measurements.reverse();
        for (m, age) in measurements.iter_mut().zip([18, 12, 6]) {
            m.age_months = age;
        }

        let snapshots = service.get_history(Gender::Male, &measurements).unwrap();
        let ages: Vec<u32> = snapshots.iter().map(|s| s.measurement.age_months).collect();
        assert_eq!(ages, vec![6, 12, 18]);
        assert!(snapshots.iter().all(|s| s.percentile_results.len() == 2));
    }

    #[test]
    fn test_get_curve_series() {
        let service = GrowthAnalytics::standard();
        let series = service
            .get_curve_series(Gender::Female, Metric::HeadCircumference, 24)
            .unwrap();
        assert_eq!(series.first().unwrap().age_months, 0);
        assert_eq!(series.last().unwrap().age_months, 24);
        assert!(series.windows(2).all(|w| w[0].age_months < w[1].age_months));
    }

    #[test]
    fn test_missing_reference_surfaces() {
        let store = ReferenceCurveStore::from_points(vec![ReferenceCurvePoint::new(
            Metric::Weight,
            Gender::Male,
            0,
            [2.5, 2.9, 3.3, 3.9, 4.3],
        )])
        .unwrap();
        let service = GrowthAnalytics::new(Arc::new(store), EngineConfig::default()).unwrap();

        let err = service
            .get_comparison(Gender::Male, date(2024, 1, 1), &history(), date(2025, 6, 1))
            .unwrap_err();
        assert!(matches!(
            err.reference_error(),
            Some(ReferenceError::DataMissing { .. })
        ));
        assert!(!err.is_validation_error());
    }

    #[test]
    fn test_cache_key_tracks_inputs() {
        let service = GrowthAnalytics::standard();
        let birth = date(2023, 7, 10);
        let key1 = service
            .comparison_cache_key(Gender::Male, birth, &history(), date(2024, 12, 1))
            .unwrap();
        let key2 = service
            .comparison_cache_key(Gender::Male, birth, &history(), date(2024, 12, 1))
            .unwrap();
        let key3 = service
            .comparison_cache_key(Gender::Female, birth, &history(), date(2024, 12, 1))
            .unwrap();
        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = EngineConfig {
            percentile_floor: 60.0,
            percentile_ceiling: 40.0,
            ..EngineConfig::default()
        };
        let err = GrowthAnalytics::new(ReferenceCurveStore::standard(), config).unwrap_err();
        assert!(matches!(err, AnalyticsError::Config(ConfigError::PercentileBounds { .. })));

        let mut config = EngineConfig::default();
        config.descriptor.scale_max = f64::NAN;
        let err = GrowthAnalytics::new(ReferenceCurveStore::standard(), config).unwrap_err();
        assert!(matches!(err, AnalyticsError::Config(ConfigError::NonFinite { .. })));
    }
}
