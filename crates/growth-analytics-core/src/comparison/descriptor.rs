//! Visualization descriptor derived from a comparison.

use crate::config::{ConfigError, DescriptorConfig};
use crate::models::{GrowthComparison, GrowthDescriptor};

/// Builds the renderer's body-shape parameters. Pure, no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorBuilder {
    config: DescriptorConfig,
}

impl DescriptorBuilder {
    /// Create a builder after checking the constants; an unchecked NaN bound
    /// would make clamping panic.
    pub fn new(config: DescriptorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Caller guarantees `config` has passed [`DescriptorConfig::validate`].
    pub(crate) fn from_validated(config: DescriptorConfig) -> Self {
        Self { config }
    }

    /// Derive the descriptor. Missing ratios give neutral values.
    pub fn build(&self, comparison: &GrowthComparison) -> GrowthDescriptor {
        let c = &self.config;

        let scale_xz = comparison
            .ratios
            .weight
            .map(|ratio| ratio.cbrt().clamp(c.scale_min, c.scale_max))
            .unwrap_or(1.0);

        let scale_y = comparison
            .ratios
            .height
            .map(|ratio| ratio.clamp(c.scale_min, c.scale_max))
            .unwrap_or(1.0);

        let body_fat_intensity = comparison
            .bmi
            .map(|bmi| ((bmi - comparison.ideal.bmi()) / c.reference_bmi_spread).clamp(0.0, 1.0))
            .unwrap_or(0.0);

        let abdominal_expansion = comparison
            .ratios
            .weight
            .map(|ratio| ((ratio - c.abdominal_threshold) / c.abdominal_span).clamp(0.0, 1.0))
            .unwrap_or(0.0);

        GrowthDescriptor {
            scale_xz,
            scale_y,
            body_fat_intensity,
            abdominal_expansion,
        }
    }
}
