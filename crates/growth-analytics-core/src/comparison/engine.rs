//! Current vs previous vs ideal comparison.

use tracing::debug;

use crate::config::{ConfigError, EngineConfig};
use crate::models::{
    body_mass_index, Gender, GrowthChanges, GrowthComparison, GrowthDescriptor, GrowthRatios,
    IdealTarget, Measurement, MeasurementSnapshot, Metric,
};
use crate::percentile::PercentileCalculator;

use super::{classify, ComparisonResult, DescriptorBuilder, PercentileProfile};

/// Builds growth comparisons for single measurements.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonEngine<'a> {
    calculator: PercentileCalculator<'a>,
    descriptor: DescriptorBuilder,
}

impl<'a> ComparisonEngine<'a> {
    /// Create an engine with default descriptor constants.
    pub fn new(calculator: PercentileCalculator<'a>) -> Self {
        Self {
            calculator,
            descriptor: DescriptorBuilder::default(),
        }
    }

    /// Create an engine using configured descriptor constants.
    pub fn with_config(
        calculator: PercentileCalculator<'a>,
        config: &EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(calculator, config))
    }

    /// Caller guarantees `config` has passed [`EngineConfig::validate`].
    pub(crate) fn from_validated(calculator: PercentileCalculator<'a>, config: &EngineConfig) -> Self {
        Self {
            calculator,
            descriptor: DescriptorBuilder::from_validated(config.descriptor),
        }
    }

    /// Percentile for every metric present in the measurement.
    pub fn snapshot(
        &self,
        measurement: &Measurement,
        gender: Gender,
    ) -> ComparisonResult<MeasurementSnapshot> {
        let percentile_results = measurement
            .present_metrics()
            .map(|(metric, value)| {
                self.calculator
                    .percentile_for_value(metric, gender, measurement.age_months, value)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MeasurementSnapshot {
            measurement: measurement.clone(),
            percentile_results,
        })
    }

    /// Compare `current` against `previous` and the age-matched ideal.
    ///
    /// `current` must carry at least one positive value; a missing
    /// `previous` simply leaves `previous` and `changes` empty.
    pub fn compare(
        &self,
        current: &Measurement,
        previous: Option<&Measurement>,
        gender: Gender,
    ) -> ComparisonResult<GrowthComparison> {
        current.validate()?;

        let current_snapshot = self.snapshot(current, gender)?;
        let previous_snapshot = previous
            .map(|m| self.snapshot(m, gender))
            .transpose()?;

        let age = current.age_months;
        let ideal = IdealTarget {
            weight_kg: self.calculator.ideal_value(Metric::Weight, gender, age)?,
            height_cm: self.calculator.ideal_value(Metric::Height, gender, age)?,
        };

        let ratios = GrowthRatios {
            weight: current.weight_kg.map(|w| w / ideal.weight_kg),
            height: current.height_cm.map(|h| h / ideal.height_cm),
        };

        let bmi = match (current.weight_kg, current.height_cm) {
            (Some(w), Some(h)) => Some(body_mass_index(w, h)),
            _ => None,
        };

        let health_status = classify(&PercentileProfile {
            weight: current_snapshot.percentile(Metric::Weight),
            height: current_snapshot.percentile(Metric::Height),
        });

        let changes = previous.map(|prev| changes_between(prev, current));
        let extrapolated = current_snapshot.is_extrapolated();

        debug!(
            age_months = age,
            gender = gender.as_str(),
            status = health_status.as_str(),
            has_previous = previous.is_some(),
            extrapolated,
            "Built growth comparison"
        );

        let mut comparison = GrowthComparison {
            current: current_snapshot,
            previous: previous_snapshot,
            ideal,
            ratios,
            changes,
            bmi,
            health_status,
            extrapolated,
            transform_3d: GrowthDescriptor::default(),
        };
        comparison.transform_3d = self.descriptor.build(&comparison);

        Ok(comparison)
    }
}

/// Per-metric deltas; a metric missing on either side has no delta.
fn changes_between(previous: &Measurement, current: &Measurement) -> GrowthChanges {
    let delta = |metric: Metric| match (current.value(metric), previous.value(metric)) {
        (Some(now), Some(before)) => Some(now - before),
        _ => None,
    };

    GrowthChanges {
        weight_kg: delta(Metric::Weight),
        height_cm: delta(Metric::Height),
        head_circumference_cm: delta(Metric::HeadCircumference),
        months_elapsed: current.age_months.saturating_sub(previous.age_months),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::ComparisonError;
    use crate::models::{HealthStatus, ValidationError};
    use crate::reference::ReferenceCurveStore;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_median_child_is_normal() {
        let store = ReferenceCurveStore::standard();
        let engine = ComparisonEngine::new(PercentileCalculator::new(&store));

        let current = Measurement::new("p-1", date(2024, 7, 1), 12)
            .with_weight(9.6)
            .with_height(75.7);
        let comparison = engine.compare(&current, None, Gender::Male).unwrap();

        assert_eq!(comparison.health_status, HealthStatus::Normal);
        assert_eq!(comparison.ideal.weight_kg, 9.6);
        assert_eq!(comparison.ideal.height_cm, 75.7);
        assert_eq!(comparison.ratios.weight, Some(1.0));
        assert!(comparison.previous.is_none());
        assert!(comparison.changes.is_none());
        assert!(!comparison.extrapolated);
    }

    #[test]
    fn test_changes_against_previous() {
        let store = ReferenceCurveStore::standard();
        let engine = ComparisonEngine::new(PercentileCalculator::new(&store));

        let previous = Measurement::new("p-1", date(2024, 1, 1), 6)
            .with_weight(7.5)
            .with_head_circumference(43.0);
        let current = Measurement::new("p-1", date(2024, 7, 1), 12)
            .with_weight(9.5)
            .with_height(75.0);

        let comparison = engine
            .compare(&current, Some(&previous), Gender::Male)
            .unwrap();
        let changes = comparison.changes.unwrap();

        assert!((changes.weight_kg.unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(changes.height_cm, None);
        assert_eq!(changes.head_circumference_cm, None);
        assert_eq!(changes.months_elapsed, 6);
        assert_eq!(
            comparison.previous.unwrap().percentile_results.len(),
            2
        );
    }

    #[test]
    fn test_bmi_requires_both_values() {
        let store = ReferenceCurveStore::standard();
        let engine = ComparisonEngine::new(PercentileCalculator::new(&store));

        let weight_only = Measurement::new("p-1", date(2024, 7, 1), 12).with_weight(9.6);
        let comparison = engine.compare(&weight_only, None, Gender::Female).unwrap();
        assert!(comparison.bmi.is_none());
        assert!(comparison.ratios.height.is_none());
        assert_eq!(comparison.transform_3d.body_fat_intensity, 0.0);

        let both = weight_only.clone().with_height(80.0);
        let comparison = engine.compare(&both, None, Gender::Female).unwrap();
        assert!((comparison.bmi.unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_invalid_current() {
        let store = ReferenceCurveStore::standard();
        let engine = ComparisonEngine::new(PercentileCalculator::new(&store));

        let empty = Measurement::new("p-1", date(2024, 7, 1), 12);
        assert!(matches!(
            engine.compare(&empty, None, Gender::Male),
            Err(ComparisonError::InvalidMeasurement(ValidationError::NoValues { .. }))
        ));

        let negative = empty.with_weight(-4.0);
        assert!(matches!(
            engine.compare(&negative, None, Gender::Male),
            Err(ComparisonError::InvalidMeasurement(_))
        ));
    }

    #[test]
    fn test_overweight_child_alert_and_descriptor() {
        let store = ReferenceCurveStore::standard();
        let engine = ComparisonEngine::new(PercentileCalculator::new(&store));

        let current = Measurement::new("p-1", date(2024, 7, 1), 12)
            .with_weight(13.0)
            .with_height(75.7);
        let comparison = engine.compare(&current, None, Gender::Male).unwrap();

        assert_eq!(comparison.health_status, HealthStatus::Alert);
        assert!(comparison.extrapolated);
        assert!(comparison.transform_3d.scale_xz > 1.0);
        assert!(comparison.transform_3d.abdominal_expansion > 0.0);
        assert!(comparison.transform_3d.body_fat_intensity > 0.0);
    }

    #[test]
    fn test_with_config_rejects_nan_descriptor_bounds() {
        let store = ReferenceCurveStore::standard();
        let mut config = EngineConfig::default();
        config.descriptor.scale_max = f64::NAN;

        let err = ComparisonEngine::with_config(PercentileCalculator::new(&store), &config)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite { field: "scale_max", .. }));
    }
}
