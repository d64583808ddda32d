//! Growth analytics result models.

use serde::{Deserialize, Serialize};

use super::measurement::{Measurement, Metric};
use crate::fingerprint::fingerprint;

/// Percentile rank of one metric of one measurement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PercentileResult {
    pub metric: Metric,
    /// Measured value in canonical units
    pub value: f64,
    /// Percentile rank, clamped to the configured bounds (default 0.1 - 99.9)
    pub percentile: f64,
    /// Age beyond the tabulated range or value outside the p3 - p97 band
    pub extrapolated: bool,
}

/// A measurement together with its per-metric percentiles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementSnapshot {
    pub measurement: Measurement,
    pub percentile_results: Vec<PercentileResult>,
}

impl MeasurementSnapshot {
    /// Percentile for a metric, if that metric was measured.
    pub fn percentile(&self, metric: Metric) -> Option<f64> {
        self.result(metric).map(|r| r.percentile)
    }

    pub fn result(&self, metric: Metric) -> Option<&PercentileResult> {
        self.percentile_results.iter().find(|r| r.metric == metric)
    }

    /// True if any metric was extrapolated.
    pub fn is_extrapolated(&self) -> bool {
        self.percentile_results.iter().any(|r| r.extrapolated)
    }
}

/// Age-matched median (p50) targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IdealTarget {
    pub weight_kg: f64,
    pub height_cm: f64,
}

impl IdealTarget {
    /// BMI implied by the ideal weight and height.
    pub fn bmi(&self) -> f64 {
        body_mass_index(self.weight_kg, self.height_cm)
    }
}

/// Current value divided by the ideal value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct GrowthRatios {
    pub weight: Option<f64>,
    pub height: Option<f64>,
}

/// Per-metric change from the previous measurement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GrowthChanges {
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub head_circumference_cm: Option<f64>,
    /// Age difference between the two measurements
    pub months_elapsed: u32,
}

/// Clinical risk category.
///
/// Ordered by severity so the worst of several statuses is `max()`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Normal,
    Watch,
    Alert,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Normal => "normal",
            HealthStatus::Watch => "watch",
            HealthStatus::Alert => "alert",
        }
    }
}

/// Bounded, dimensionless parameters for the body visualization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GrowthDescriptor {
    /// Horizontal (width/depth) scale
    pub scale_xz: f64,
    /// Vertical scale
    pub scale_y: f64,
    /// 0.0 - 1.0
    pub body_fat_intensity: f64,
    /// 0.0 - 1.0
    pub abdominal_expansion: f64,
}

impl Default for GrowthDescriptor {
    fn default() -> Self {
        Self {
            scale_xz: 1.0,
            scale_y: 1.0,
            body_fat_intensity: 0.0,
            abdominal_expansion: 0.0,
        }
    }
}

/// Full comparison of the current measurement against the previous one and
/// the age-matched ideal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthComparison {
    pub current: MeasurementSnapshot,
    pub previous: Option<MeasurementSnapshot>,
    pub ideal: IdealTarget,
    pub ratios: GrowthRatios,
    pub changes: Option<GrowthChanges>,
    pub bmi: Option<f64>,
    pub health_status: HealthStatus,
    /// Any current percentile was extrapolated
    pub extrapolated: bool,
    #[serde(rename = "transform3d")]
    pub transform_3d: GrowthDescriptor,
}

impl GrowthComparison {
    /// SHA-256 of the canonical JSON form.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        fingerprint(self)
    }
}

/// weight / (height in m)^2
pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_mass_index() {
        let bmi = body_mass_index(20.0, 100.0);
        assert!((bmi - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_status_severity_order() {
        assert!(HealthStatus::Alert > HealthStatus::Watch);
        assert!(HealthStatus::Watch > HealthStatus::Normal);
        assert_eq!(
            [HealthStatus::Watch, HealthStatus::Alert, HealthStatus::Normal]
                .into_iter()
                .max(),
            Some(HealthStatus::Alert)
        );
    }

    #[test]
    fn test_descriptor_default_is_neutral() {
        let d = GrowthDescriptor::default();
        assert_eq!(d.scale_xz, 1.0);
        assert_eq!(d.body_fat_intensity, 0.0);
    }
}
