//! Anthropometric measurement models.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fingerprint::fingerprint;

/// Patient sex, used to select a reference curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Lowercase canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    /// Parse a gender from its canonical name or single-letter code.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// A growth metric with its own reference curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Weight,
    Height,
    HeadCircumference,
}

impl Metric {
    /// Every metric, in reporting order.
    pub const ALL: [Metric; 3] = [Metric::Weight, Metric::Height, Metric::HeadCircumference];

    /// Snake-case canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Weight => "weight",
            Metric::Height => "height",
            Metric::HeadCircumference => "head_circumference",
        }
    }

    /// Parse a metric from its canonical name (a few spoken variants accepted).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "weight" => Some(Metric::Weight),
            "height" | "length" => Some(Metric::Height),
            "head_circumference" | "head" => Some(Metric::HeadCircumference),
            _ => None,
        }
    }

    /// Canonical (metric) unit.
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Weight => "kg",
            Metric::Height | Metric::HeadCircumference => "cm",
        }
    }
}

/// Why a measurement cannot be used.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{} must be a positive number, got {value}", .metric.as_str())]
    NonPositiveValue { metric: Metric, value: f64 },

    #[error("Measurement taken on {taken_on} has no weight, height or head circumference")]
    NoValues { taken_on: NaiveDate },
}

/// A single set of vitals taken at a known age.
///
/// Values are always in canonical metric units (kg, cm). Free-text exam
/// notes never reach this type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    /// Patient identifier (opaque to the engine)
    pub patient_id: String,
    /// Date the measurement was taken
    pub taken_on: NaiveDate,
    /// Completed months of age on `taken_on`
    pub age_months: u32,
    /// Body weight in kg
    pub weight_kg: Option<f64>,
    /// Length/height in cm
    pub height_cm: Option<f64>,
    /// Head circumference in cm
    pub head_circumference_cm: Option<f64>,
}

impl Measurement {
    /// Create a measurement with no values recorded yet.
    pub fn new(patient_id: impl Into<String>, taken_on: NaiveDate, age_months: u32) -> Self {
        Self {
            patient_id: patient_id.into(),
            taken_on,
            age_months,
            weight_kg: None,
            height_cm: None,
            head_circumference_cm: None,
        }
    }

    pub fn with_weight(mut self, weight_kg: f64) -> Self {
        self.weight_kg = Some(weight_kg);
        self
    }

    pub fn with_height(mut self, height_cm: f64) -> Self {
        self.height_cm = Some(height_cm);
        self
    }

    pub fn with_head_circumference(mut self, head_circumference_cm: f64) -> Self {
        self.head_circumference_cm = Some(head_circumference_cm);
        self
    }

    /// Recorded value for a metric, if any.
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Weight => self.weight_kg,
            Metric::Height => self.height_cm,
            Metric::HeadCircumference => self.head_circumference_cm,
        }
    }

    /// Recorded (metric, value) pairs in reporting order.
    pub fn present_metrics(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL
            .into_iter()
            .filter_map(move |metric| self.value(metric).map(|v| (metric, v)))
    }

    /// Check that the measurement carries at least one usable value and that
    /// every recorded value is finite and strictly positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut recorded = 0;
        for (metric, value) in self.present_metrics() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::NonPositiveValue { metric, value });
            }
            recorded += 1;
        }

        if recorded == 0 {
            return Err(ValidationError::NoValues {
                taken_on: self.taken_on,
            });
        }

        Ok(())
    }

    /// Recompute `age_months` from the patient's birth date.
    ///
    /// Returns `None` when the measurement predates the birth date.
    pub fn with_age_from(mut self, birth_date: NaiveDate) -> Option<Self> {
        self.age_months = age_in_months(birth_date, self.taken_on)?;
        Some(self)
    }

    /// SHA-256 of the canonical JSON form (cache key).
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        fingerprint(self)
    }
}

/// Whole completed months between `birth_date` and `on`.
///
/// A month is complete once the same day-of-month is reached, clamped to the
/// last day of shorter months (born Jan 31 → one month on Feb 28/29).
pub fn age_in_months(birth_date: NaiveDate, on: NaiveDate) -> Option<u32> {
    if on < birth_date {
        return None;
    }

    let span = (on.year() - birth_date.year()) * 12 + on.month() as i32 - birth_date.month() as i32;
    let mut months = u32::try_from(span).ok()?;

    // Calendar difference overshoots by one when the day-of-month hasn't come round yet
    while months > 0 {
        match birth_date.checked_add_months(Months::new(months)) {
            Some(anniversary) if anniversary <= on => break,
            _ => months -= 1,
        }
    }

    Some(months)
}
