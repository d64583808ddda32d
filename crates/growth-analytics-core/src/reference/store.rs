//! Arena-backed reference curve store.

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;

use tracing::{debug, info};

use crate::models::{Gender, Metric, PercentileSet, ReferenceCurvePoint};

use super::{ReferenceError, ReferenceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CurveKey {
    metric: Metric,
    gender: Gender,
}

impl CurveKey {
    fn of(point: &ReferenceCurvePoint) -> Self {
        Self {
            metric: point.metric,
            gender: point.gender,
        }
    }
}

/// Where an age falls relative to a curve's tabulated rows.
#[derive(Debug, Clone, Copy)]
pub enum CurveBracket<'a> {
    /// Age is tabulated
    Exact(&'a ReferenceCurvePoint),
    /// Age lies strictly between two tabulated rows
    Between {
        lower: &'a ReferenceCurvePoint,
        upper: &'a ReferenceCurvePoint,
        /// Position of the age between `lower` (0.0) and `upper` (1.0)
        fraction: f64,
    },
    /// Age precedes the first row; the first row stands in
    BelowRange(&'a ReferenceCurvePoint),
    /// Age exceeds the last row; the last row stands in
    AboveRange(&'a ReferenceCurvePoint),
}

impl<'a> CurveBracket<'a> {
    /// Percentile values at the bracketed age, blended across age when needed.
    pub fn interpolated(&self) -> PercentileSet {
        match self {
            CurveBracket::Exact(row)
            | CurveBracket::BelowRange(row)
            | CurveBracket::AboveRange(row) => row.percentiles,
            CurveBracket::Between {
                lower,
                upper,
                fraction,
            } => lower.percentiles.lerp(&upper.percentiles, *fraction),
        }
    }

    /// The tabulated row at or just below the age (boundary row outside the range).
    pub fn floor_row(&self) -> &'a ReferenceCurvePoint {
        match self {
            CurveBracket::Exact(row)
            | CurveBracket::BelowRange(row)
            | CurveBracket::AboveRange(row) => row,
            CurveBracket::Between { lower, .. } => lower,
        }
    }

    /// True when a boundary row stands in for an untabulated age.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            CurveBracket::BelowRange(_) | CurveBracket::AboveRange(_)
        )
    }
}

/// Immutable table of reference rows keyed by (metric, gender, age).
#[derive(Debug, Clone, Default)]
pub struct ReferenceCurveStore {
    /// All rows, sorted by (metric, gender, age)
    rows: Vec<ReferenceCurvePoint>,
    /// Slice of `rows` holding each curve
    curves: HashMap<CurveKey, Range<usize>>,
}

impl ReferenceCurveStore {
    /// Build a store from arbitrary rows, validating the table invariants.
    pub fn from_points(mut points: Vec<ReferenceCurvePoint>) -> ReferenceResult<Self> {
        points.sort_by_key(|p| (p.metric, p.gender, p.age_months));
        let store = Self::from_sorted(points);
        store.validate()?;

        info!(
            rows = store.rows.len(),
            curves = store.curves.len(),
            "Reference curve store built"
        );
        Ok(store)
    }

    /// Build a store from a JSON array of rows.
    pub fn from_json_str(json: &str) -> ReferenceResult<Self> {
        let points: Vec<ReferenceCurvePoint> = serde_json::from_str(json)?;
        Self::from_points(points)
    }

    /// Build a store from a JSON file holding an array of rows.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ReferenceResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Index already-sorted rows without validating them.
    fn from_sorted(rows: Vec<ReferenceCurvePoint>) -> Self {
        let mut curves = HashMap::new();
        let mut start = 0;

        for i in 1..=rows.len() {
            if i == rows.len() || CurveKey::of(&rows[i]) != CurveKey::of(&rows[start]) {
                curves.insert(CurveKey::of(&rows[start]), start..i);
                start = i;
            }
        }

        Self { rows, curves }
    }

    /// Check percentile ordering per row, unique ages, and non-decreasing medians.
    fn validate(&self) -> ReferenceResult<()> {
        for row in &self.rows {
            if !row.percentiles.is_strictly_increasing() || row.percentiles.p3 <= 0.0 {
                return Err(ReferenceError::InvalidTable(format!(
                    "{} / {} at {} months: percentile values must be positive and strictly increasing",
                    row.metric.as_str(),
                    row.gender.as_str(),
                    row.age_months
                )));
            }
        }

        for pair in self.rows.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if CurveKey::of(a) != CurveKey::of(b) {
                continue;
            }
            if a.age_months == b.age_months {
                return Err(ReferenceError::InvalidTable(format!(
                    "{} / {}: duplicate row for {} months",
                    a.metric.as_str(),
                    a.gender.as_str(),
                    a.age_months
                )));
            }
            if b.percentiles.p50 < a.percentiles.p50 {
                return Err(ReferenceError::InvalidTable(format!(
                    "{} / {}: median decreases between {} and {} months",
                    a.metric.as_str(),
                    a.gender.as_str(),
                    a.age_months,
                    b.age_months
                )));
            }
        }

        Ok(())
    }

    /// Total number of rows across all curves.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether any rows exist for the pair.
    pub fn has_curve(&self, metric: Metric, gender: Gender) -> bool {
        self.curves.contains_key(&CurveKey { metric, gender })
    }

    /// All rows of one curve, ordered by age.
    pub fn rows(&self, metric: Metric, gender: Gender) -> ReferenceResult<&[ReferenceCurvePoint]> {
        self.curves
            .get(&CurveKey { metric, gender })
            .map(|range| &self.rows[range.clone()])
            .filter(|rows| !rows.is_empty())
            .ok_or(ReferenceError::DataMissing { metric, gender })
    }

    /// Highest tabulated age of a curve.
    pub fn max_age(&self, metric: Metric, gender: Gender) -> ReferenceResult<u32> {
        let rows = self.rows(metric, gender)?;
        Ok(rows[rows.len() - 1].age_months)
    }

    /// Locate the rows surrounding an age.
    pub fn bracket(
        &self,
        metric: Metric,
        gender: Gender,
        age_months: u32,
    ) -> ReferenceResult<CurveBracket<'_>> {
        let rows = self.rows(metric, gender)?;

        let bracket = match rows.binary_search_by_key(&age_months, |row| row.age_months) {
            Ok(i) => CurveBracket::Exact(&rows[i]),
            Err(0) => CurveBracket::BelowRange(&rows[0]),
            Err(i) if i == rows.len() => CurveBracket::AboveRange(&rows[i - 1]),
            Err(i) => {
                let (lower, upper) = (&rows[i - 1], &rows[i]);
                let fraction = f64::from(age_months - lower.age_months)
                    / f64::from(upper.age_months - lower.age_months);
                CurveBracket::Between {
                    lower,
                    upper,
                    fraction,
                }
            }
        };

        debug!(
            metric = metric.as_str(),
            gender = gender.as_str(),
            age_months,
            ?bracket,
            "Bracketed reference rows"
        );
        Ok(bracket)
    }

    /// Tabulated row at or just below an age.
    ///
    /// Ages beyond the table resolve to the boundary row rather than failing.
    pub fn lookup(
        &self,
        metric: Metric,
        gender: Gender,
        age_months: u32,
    ) -> ReferenceResult<&ReferenceCurvePoint> {
        Ok(self.bracket(metric, gender, age_months)?.floor_row())
    }

    /// Rows from birth up to `max_age_months`, for rendering percentile bands.
    ///
    /// When `max_age_months` falls between two tabulated ages, a synthetic row
    /// at exactly that age closes the series.
    pub fn series(
        &self,
        metric: Metric,
        gender: Gender,
        max_age_months: u32,
    ) -> ReferenceResult<Vec<ReferenceCurvePoint>> {
        let mut series: Vec<ReferenceCurvePoint> = self
            .rows(metric, gender)?
            .iter()
            .take_while(|row| row.age_months <= max_age_months)
            .cloned()
            .collect();

        if let bracket @ CurveBracket::Between { .. } =
            self.bracket(metric, gender, max_age_months)?
        {
            series.push(ReferenceCurvePoint {
                metric,
                gender,
                age_months: max_age_months,
                percentiles: bracket.interpolated(),
            });
        }

        Ok(series)
    }
}
