//! Timeline construction and previous-measurement selection.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::Measurement;

use super::{HistoryError, HistoryResult};

/// Orders one patient's measurements into a timeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryAggregator;

impl HistoryAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Derive one measurement's age from the birth date.
    pub fn age_from(
        &self,
        measurement: &Measurement,
        birth_date: NaiveDate,
    ) -> HistoryResult<Measurement> {
        measurement
            .clone()
            .with_age_from(birth_date)
            .ok_or(HistoryError::BeforeBirth {
                taken_on: measurement.taken_on,
                birth_date,
            })
    }

    /// Derive every measurement's age from the birth date, once.
    ///
    /// Records dated before birth are dropped, like other unusable records.
    pub fn with_ages_from(
        &self,
        measurements: &[Measurement],
        birth_date: NaiveDate,
    ) -> Vec<Measurement> {
        measurements
            .iter()
            .filter_map(|m| match self.age_from(m, birth_date) {
                Ok(aged) => Some(aged),
                Err(reason) => {
                    warn!(taken_on = %m.taken_on, %reason, "Dropping measurement from history");
                    None
                }
            })
            .collect()
    }

    /// Sort by age and keep one measurement per age.
    ///
    /// When several share an age, the most recently recorded wins: later
    /// `taken_on` first, then later position in the input. Measurements with
    /// no usable values are dropped.
    pub fn timeline(&self, measurements: &[Measurement]) -> Vec<Measurement> {
        let mut usable: Vec<(usize, &Measurement)> = measurements
            .iter()
            .enumerate()
            .filter(|(_, m)| match m.validate() {
                Ok(()) => true,
                Err(reason) => {
                    warn!(taken_on = %m.taken_on, %reason, "Dropping measurement from timeline");
                    false
                }
            })
            .collect();

        // Within an age group the most recent record sorts last
        usable.sort_by(|(ia, a), (ib, b)| {
            a.age_months
                .cmp(&b.age_months)
                .then(a.taken_on.cmp(&b.taken_on))
                .then(ia.cmp(ib))
        });

        let mut timeline: Vec<Measurement> = Vec::with_capacity(usable.len());
        for (_, m) in usable {
            match timeline.last_mut() {
                Some(last) if last.age_months == m.age_months => *last = m.clone(),
                _ => timeline.push(m.clone()),
            }
        }

        debug!(
            input = measurements.len(),
            entries = timeline.len(),
            "Built measurement timeline"
        );
        timeline
    }

    /// Closest entry strictly younger than `current`.
    ///
    /// Ties on age go to the later `taken_on`.
    pub fn previous_before<'t>(
        &self,
        timeline: &'t [Measurement],
        current: &Measurement,
    ) -> Option<&'t Measurement> {
        timeline
            .iter()
            .filter(|m| m.age_months < current.age_months)
            .max_by(|a, b| {
                a.age_months
                    .cmp(&b.age_months)
                    .then(a.taken_on.cmp(&b.taken_on))
            })
    }

    /// Latest measurement taken on or before `as_of`.
    ///
    /// Several on the same day resolve to the last one supplied.
    pub fn current_as_of<'t>(
        &self,
        measurements: &'t [Measurement],
        as_of: NaiveDate,
    ) -> Option<&'t Measurement> {
        measurements
            .iter()
            .filter(|m| m.taken_on <= as_of)
            .max_by_key(|m| m.taken_on)
    }
}
