//! Reference curve models.

use serde::{Deserialize, Serialize};

use super::measurement::{Gender, Metric};

/// One of the standard percentile bands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PercentileKey {
    P3,
    P15,
    P50,
    P85,
    P97,
}

impl PercentileKey {
    /// Every band, lowest first.
    pub const ALL: [PercentileKey; 5] = [
        PercentileKey::P3,
        PercentileKey::P15,
        PercentileKey::P50,
        PercentileKey::P85,
        PercentileKey::P97,
    ];

    /// The percentile rank this band represents.
    pub fn rank(&self) -> f64 {
        match self {
            PercentileKey::P3 => 3.0,
            PercentileKey::P15 => 15.0,
            PercentileKey::P50 => 50.0,
            PercentileKey::P85 => 85.0,
            PercentileKey::P97 => 97.0,
        }
    }
}

/// Measurement values at each standard percentile band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PercentileSet {
    pub p3: f64,
    pub p15: f64,
    pub p50: f64,
    pub p85: f64,
    pub p97: f64,
}

impl PercentileSet {
    pub fn new(values: [f64; 5]) -> Self {
        let [p3, p15, p50, p85, p97] = values;
        Self { p3, p15, p50, p85, p97 }
    }

    /// Value at a band.
    pub fn get(&self, key: PercentileKey) -> f64 {
        match key {
            PercentileKey::P3 => self.p3,
            PercentileKey::P15 => self.p15,
            PercentileKey::P50 => self.p50,
            PercentileKey::P85 => self.p85,
            PercentileKey::P97 => self.p97,
        }
    }

    /// (rank, value) knots of the piecewise-linear percentile curve.
    pub fn knots(&self) -> [(f64, f64); 5] {
        PercentileKey::ALL.map(|key| (key.rank(), self.get(key)))
    }

    /// True when every value is finite and bands strictly increase.
    pub fn is_strictly_increasing(&self) -> bool {
        let knots = self.knots();
        knots.iter().all(|(_, v)| v.is_finite())
            && knots.windows(2).all(|pair| pair[0].1 < pair[1].1)
    }

    /// Band-wise linear blend: `self` at `t = 0`, `other` at `t = 1`.
    pub fn lerp(&self, other: &PercentileSet, t: f64) -> PercentileSet {
        let blend = |a: f64, b: f64| a + (b - a) * t;
        PercentileSet {
            p3: blend(self.p3, other.p3),
            p15: blend(self.p15, other.p15),
            p50: blend(self.p50, other.p50),
            p85: blend(self.p85, other.p85),
            p97: blend(self.p97, other.p97),
        }
    }
}

/// A tabulated reference row for one (metric, gender, age).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceCurvePoint {
    pub metric: Metric,
    pub gender: Gender,
    /// Age in completed months
    pub age_months: u32,
    pub percentiles: PercentileSet,
}

impl ReferenceCurvePoint {
    pub fn new(metric: Metric, gender: Gender, age_months: u32, values: [f64; 5]) -> Self {
        Self {
            metric,
            gender,
            age_months,
            percentiles: PercentileSet::new(values),
        }
    }
}
