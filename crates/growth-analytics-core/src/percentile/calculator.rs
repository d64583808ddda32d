//! Percentile calculator over a reference store.

use tracing::warn;

use crate::config::{ConfigError, EngineConfig};
use crate::models::{Gender, Metric, PercentileResult, PercentileSet, ReferenceCurvePoint};
use crate::reference::ReferenceCurveStore;

use super::{percentile_on_curve, value_on_curve, CalculatorResult, PercentileError};

/// Maps values to percentiles and back for any (metric, gender, age).
#[derive(Debug, Clone, Copy)]
pub struct PercentileCalculator<'a> {
    store: &'a ReferenceCurveStore,
    floor: f64,
    ceiling: f64,
}

impl<'a> PercentileCalculator<'a> {
    /// Create a calculator with the default 0.1 - 99.9 clamp.
    pub fn new(store: &'a ReferenceCurveStore) -> Self {
        Self::from_validated(store, &EngineConfig::default())
    }

    /// Create a calculator using the configured clamp bounds.
    pub fn with_config(
        store: &'a ReferenceCurveStore,
        config: &EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(store, config))
    }

    /// Caller guarantees `config` has passed [`EngineConfig::validate`].
    pub(crate) fn from_validated(store: &'a ReferenceCurveStore, config: &EngineConfig) -> Self {
        Self {
            store,
            floor: config.percentile_floor,
            ceiling: config.percentile_ceiling,
        }
    }

    /// The store this calculator reads from.
    pub fn store(&self) -> &'a ReferenceCurveStore {
        self.store
    }

    /// Band values interpolated to exactly `age_months`.
    ///
    /// Returns the bands plus whether the age lay outside the table.
    pub fn bands_at(
        &self,
        metric: Metric,
        gender: Gender,
        age_months: u32,
    ) -> CalculatorResult<(PercentileSet, bool)> {
        let bracket = self.store.bracket(metric, gender, age_months)?;
        Ok((bracket.interpolated(), bracket.is_out_of_range()))
    }

    /// Synthetic reference row at exactly `age_months`.
    pub fn reference_row(
        &self,
        metric: Metric,
        gender: Gender,
        age_months: u32,
    ) -> CalculatorResult<ReferenceCurvePoint> {
        let (percentiles, _) = self.bands_at(metric, gender, age_months)?;
        Ok(ReferenceCurvePoint {
            metric,
            gender,
            age_months,
            percentiles,
        })
    }

    /// Percentile rank of a measured value.
    pub fn percentile_for_value(
        &self,
        metric: Metric,
        gender: Gender,
        age_months: u32,
        value: f64,
    ) -> CalculatorResult<PercentileResult> {
        if !value.is_finite() || value <= 0.0 {
            return Err(PercentileError::InvalidValue { metric, value });
        }

        let (bands, age_out_of_range) = self.bands_at(metric, gender, age_months)?;
        let position = percentile_on_curve(&bands, value);
        let extrapolated = age_out_of_range || position.outside_bands;

        if extrapolated {
            warn!(
                metric = metric.as_str(),
                gender = gender.as_str(),
                age_months,
                value,
                age_out_of_range,
                outside_bands = position.outside_bands,
                "Percentile extrapolated"
            );
        }

        Ok(PercentileResult {
            metric,
            value,
            percentile: position.percentile.clamp(self.floor, self.ceiling),
            extrapolated,
        })
    }

    /// Value a child of this age would have at `percentile`.
    pub fn value_at_percentile(
        &self,
        metric: Metric,
        gender: Gender,
        age_months: u32,
        percentile: f64,
    ) -> CalculatorResult<f64> {
        if !percentile.is_finite() || percentile <= 0.0 || percentile >= 100.0 {
            return Err(PercentileError::InvalidPercentile(percentile));
        }

        let (bands, _) = self.bands_at(metric, gender, age_months)?;
        Ok(value_on_curve(&bands, percentile))
    }

    /// Age-matched median.
    pub fn ideal_value(&self, metric: Metric, gender: Gender, age_months: u32) -> CalculatorResult<f64> {
        self.value_at_percentile(metric, gender, age_months, 50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{ReferenceError, STANDARD_MAX_AGE_MONTHS};

    #[test]
    fn test_median_at_tabulated_age() {
        let store = ReferenceCurveStore::standard();
        let calc = PercentileCalculator::new(&store);

        let result = calc
            .percentile_for_value(Metric::Weight, Gender::Male, 12, 9.6)
            .unwrap();
        assert_eq!(result.percentile, 50.0);
        assert!(!result.extrapolated);
    }

    #[test]
    fn test_interpolates_across_age() {
        let store = ReferenceCurveStore::standard();
        let calc = PercentileCalculator::new(&store);

        // Boys weight p50: 7.9 kg at 6 months, 8.9 kg at 9 months
        let median_at_7 = calc.ideal_value(Metric::Weight, Gender::Male, 7).unwrap();
        assert!((median_at_7 - (7.9 + 1.0 / 3.0)).abs() < 1e-9);

        let result = calc
            .percentile_for_value(Metric::Weight, Gender::Male, 7, median_at_7)
            .unwrap();
        assert!((result.percentile - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamps_extreme_values() {
        let store = ReferenceCurveStore::standard();
        let calc = PercentileCalculator::new(&store);

        let low = calc
            .percentile_for_value(Metric::Weight, Gender::Female, 12, 3.0)
            .unwrap();
        assert_eq!(low.percentile, 0.1);
        assert!(low.extrapolated);

        let high = calc
            .percentile_for_value(Metric::Weight, Gender::Female, 12, 30.0)
            .unwrap();
        assert_eq!(high.percentile, 99.9);
        assert!(high.extrapolated);
    }

    #[test]
    fn test_age_beyond_table_is_flagged_not_rejected() {
        let store = ReferenceCurveStore::standard();
        let calc = PercentileCalculator::new(&store);

        let result = calc
            .percentile_for_value(Metric::Height, Gender::Male, STANDARD_MAX_AGE_MONTHS + 12, 110.0)
            .unwrap();
        assert!(result.extrapolated);
        assert_eq!(result.percentile, 50.0);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let store = ReferenceCurveStore::standard();
        let calc = PercentileCalculator::new(&store);

        assert!(matches!(
            calc.percentile_for_value(Metric::Weight, Gender::Male, 12, 0.0),
            Err(PercentileError::InvalidValue { .. })
        ));
        assert!(matches!(
            calc.value_at_percentile(Metric::Weight, Gender::Male, 12, 100.0),
            Err(PercentileError::InvalidPercentile(_))
        ));
    }

    #[test]
    fn test_missing_reference_data() {
        let store = ReferenceCurveStore::from_points(vec![ReferenceCurvePoint::new(
            Metric::Weight,
            Gender::Male,
            0,
            [2.5, 2.9, 3.3, 3.9, 4.3],
        )])
        .unwrap();
        let calc = PercentileCalculator::new(&store);

        let err = calc
            .percentile_for_value(Metric::Height, Gender::Male, 0, 50.0)
            .unwrap_err();
        assert!(matches!(
            err,
            PercentileError::Reference(ReferenceError::DataMissing { .. })
        ));
    }

    #[test]
    fn test_custom_clamp_bounds() {
        let store = ReferenceCurveStore::standard();
        let config = EngineConfig {
            percentile_floor: 1.0,
            percentile_ceiling: 99.0,
            ..EngineConfig::default()
        };
        let calc = PercentileCalculator::with_config(&store, &config).unwrap();

        let low = calc
            .percentile_for_value(Metric::Weight, Gender::Male, 12, 2.0)
            .unwrap();
        assert_eq!(low.percentile, 1.0);
    }

    #[test]
    fn test_with_config_rejects_invalid_bounds() {
        let store = ReferenceCurveStore::standard();
        let config = EngineConfig {
            percentile_floor: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(matches!(
            PercentileCalculator::with_config(&store, &config),
            Err(ConfigError::PercentileBounds { .. })
        ));
    }
}
