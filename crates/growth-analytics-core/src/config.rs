//! Engine configuration.
//!
//! Every field has a default, so a JSON document only needs the keys it
//! overrides.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Percentile bounds [{floor}, {ceiling}] must satisfy 0 <= floor < ceiling <= 100")]
    PercentileBounds { floor: f64, ceiling: f64 },

    #[error("Descriptor {field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("Descriptor {field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("Descriptor scale bounds [{min}, {max}] are inverted")]
    InvertedScale { min: f64, max: f64 },
}

/// Tunables for the whole engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Lowest percentile ever reported
    pub percentile_floor: f64,
    /// Highest percentile ever reported
    pub percentile_ceiling: f64,
    /// Visualization descriptor constants
    pub descriptor: DescriptorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            percentile_floor: 0.1,
            percentile_ceiling: 99.9,
            descriptor: DescriptorConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check that the configured bounds make sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Range checks also reject NaN
        if !(0.0..100.0).contains(&self.percentile_floor)
            || !(0.0..=100.0).contains(&self.percentile_ceiling)
            || self.percentile_floor >= self.percentile_ceiling
        {
            return Err(ConfigError::PercentileBounds {
                floor: self.percentile_floor,
                ceiling: self.percentile_ceiling,
            });
        }
        self.descriptor.validate()
    }
}

/// Constants for the visualization descriptor.
///
/// These are tuned against the renderer, not taken from a clinical reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DescriptorConfig {
    /// BMI excess (kg/m²) over the age-matched ideal that maps to full intensity
    pub reference_bmi_spread: f64,
    /// Weight ratio at which abdominal expansion starts
    pub abdominal_threshold: f64,
    /// Weight-ratio span from threshold to full expansion
    pub abdominal_span: f64,
    /// Lower clamp for body scales
    pub scale_min: f64,
    /// Upper clamp for body scales
    pub scale_max: f64,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            reference_bmi_spread: 4.0,
            abdominal_threshold: 1.15,
            abdominal_span: 0.5,
            scale_min: 0.5,
            scale_max: 2.0,
        }
    }
}

impl DescriptorConfig {
    /// Every constant must be finite; spreads and scale bounds must be positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("reference_bmi_spread", self.reference_bmi_spread),
            ("abdominal_threshold", self.abdominal_threshold),
            ("abdominal_span", self.abdominal_span),
            ("scale_min", self.scale_min),
            ("scale_max", self.scale_max),
        ];
        if let Some(&(field, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NonFinite { field, value });
        }

        let positive = [
            ("reference_bmi_spread", self.reference_bmi_spread),
            ("abdominal_span", self.abdominal_span),
            ("scale_min", self.scale_min),
        ];
        if let Some(&(field, value)) = positive.iter().find(|(_, v)| *v <= 0.0) {
            return Err(ConfigError::NonPositive { field, value });
        }

        if self.scale_min > self.scale_max {
            return Err(ConfigError::InvertedScale {
                min: self.scale_min,
                max: self.scale_max,
            });
        }
        Ok(())
    }
}
