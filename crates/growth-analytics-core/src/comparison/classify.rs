//! Risk classification from weight and height percentiles.
//!
//! Rules are evaluated in order and the first match wins. Thresholds are
//! strict, so a percentile of exactly 15 or 85 stays `Normal`.

use crate::models::HealthStatus;

/// Percentiles the classifier looks at. Absent metrics never trigger a rule.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PercentileProfile {
    pub weight: Option<f64>,
    pub height: Option<f64>,
}

/// One ordered classification rule.
pub struct ClassificationRule {
    pub status: HealthStatus,
    pub description: &'static str,
    matches: fn(&PercentileProfile) -> bool,
}

impl ClassificationRule {
    pub fn matches(&self, profile: &PercentileProfile) -> bool {
        (self.matches)(profile)
    }
}

fn below(percentile: Option<f64>, threshold: f64) -> bool {
    percentile.is_some_and(|p| p < threshold)
}

fn above(percentile: Option<f64>, threshold: f64) -> bool {
    percentile.is_some_and(|p| p > threshold)
}

fn alert_thresholds(p: &PercentileProfile) -> bool {
    below(p.weight, 3.0) || below(p.height, 3.0) || above(p.weight, 97.0)
}

fn watch_thresholds(p: &PercentileProfile) -> bool {
    below(p.weight, 15.0) || above(p.weight, 85.0) || below(p.height, 15.0) || above(p.height, 85.0)
}

/// Rules in evaluation order; anything unmatched is `Normal`.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        status: HealthStatus::Alert,
        description: "weight or height below p3, or weight above p97",
        matches: alert_thresholds,
    },
    ClassificationRule {
        status: HealthStatus::Watch,
        description: "weight or height outside p15 - p85",
        matches: watch_thresholds,
    },
];

/// The first matching rule, if any.
pub fn matching_rule(profile: &PercentileProfile) -> Option<&'static ClassificationRule> {
    CLASSIFICATION_RULES.iter().find(|rule| rule.matches(profile))
}

/// Classify a percentile profile.
pub fn classify(profile: &PercentileProfile) -> HealthStatus {
    matching_rule(profile)
        .map(|rule| rule.status)
        .unwrap_or(HealthStatus::Normal)
}
