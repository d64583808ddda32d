//! Growth chart export for the charting client.

use serde::{Deserialize, Serialize};

use crate::models::{Gender, Measurement, MeasurementSnapshot, Metric, ReferenceCurvePoint};
use crate::service::{AnalyticsResult, GrowthAnalytics};

/// One patient point on a chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    /// ISO date the measurement was taken
    pub taken_on: String,
    pub age_months: u32,
    pub value: f64,
    pub percentile: f64,
    pub extrapolated: bool,
}

/// Percentile bands plus a patient's plotted history for one metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartExport {
    pub gender: Gender,
    pub metric: Metric,
    /// Canonical unit of every value in the export
    pub unit: String,
    /// Reference rows, youngest first
    pub curve: Vec<ReferenceCurvePoint>,
    /// Patient points, youngest first
    pub history: Vec<ChartPoint>,
    /// Export timestamp
    pub exported_at: String,
}

const CSV_HEADER: &str = "series,age_months,taken_on,value,p3,p15,p50,p85,p97,percentile,extrapolated\n";

impl ChartExport {
    /// Assemble an export from a curve series and history snapshots.
    ///
    /// Snapshots without a value for `metric` are skipped.
    pub fn new(
        gender: Gender,
        metric: Metric,
        curve: Vec<ReferenceCurvePoint>,
        snapshots: &[MeasurementSnapshot],
    ) -> Self {
        let history = snapshots
            .iter()
            .filter_map(|snapshot| {
                snapshot.result(metric).map(|result| ChartPoint {
                    taken_on: snapshot.measurement.taken_on.to_string(),
                    age_months: snapshot.measurement.age_months,
                    value: result.value,
                    percentile: result.percentile,
                    extrapolated: result.extrapolated,
                })
            })
            .collect();

        Self {
            gender,
            metric,
            unit: metric.unit().to_string(),
            curve,
            history,
            exported_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV: one `reference` row per curve age, one `patient` row per measurement.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);

        for row in &self.curve {
            let p = &row.percentiles;
            csv.push_str(&format!(
                "reference,{},,,{},{},{},{},{},,\n",
                row.age_months, p.p3, p.p15, p.p50, p.p85, p.p97
            ));
        }

        for point in &self.history {
            csv.push_str(&format!(
                "patient,{},{},{},,,,,,{:.1},{}\n",
                point.age_months, point.taken_on, point.value, point.percentile, point.extrapolated
            ));
        }

        csv
    }
}

impl GrowthAnalytics {
    /// Build a chart export covering birth to `max_age_months`.
    pub fn export_chart(
        &self,
        gender: Gender,
        metric: Metric,
        max_age_months: u32,
        measurements: &[Measurement],
    ) -> AnalyticsResult<ChartExport> {
        let curve = self.get_curve_series(gender, metric, max_age_months)?;
        let snapshots = self.get_history(gender, measurements)?;
        Ok(ChartExport::new(gender, metric, curve, &snapshots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn measurements() -> Vec<Measurement> {
        vec![
            Measurement::new("p-1", NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(), 6)
                .with_weight(7.9),
            Measurement::new("p-1", NaiveDate::from_ymd_opt(2024, 7, 10).unwrap(), 12)
                .with_height(75.7),
        ]
    }

    #[test]
    fn test_export_skips_unmeasured_metric() {
        let export = GrowthAnalytics::standard()
            .export_chart(Gender::Male, Metric::Weight, 12, &measurements())
            .unwrap();

        assert_eq!(export.unit, "kg");
        assert_eq!(export.history.len(), 1);
        assert_eq!(export.history[0].taken_on, "2024-01-10");
        assert_eq!(export.curve.last().unwrap().age_months, 12);
    }

    #[test]
    fn test_to_csv() {
        let export = GrowthAnalytics::standard()
            .export_chart(Gender::Male, Metric::Weight, 1, &measurements())
            .unwrap();
        let csv = export.to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4); // header + 2 reference rows + 1 patient row
        assert!(lines[0].starts_with("series,age_months"));
        assert_eq!(lines[1], "reference,0,,,2.5,2.9,3.3,3.9,4.3,,");
        assert_eq!(lines[3], "patient,6,2024-01-10,7.9,,,,,,50.0,false");
    }

    #[test]
    fn test_to_json() {
        let export = GrowthAnalytics::standard()
            .export_chart(Gender::Female, Metric::Height, 6, &measurements())
            .unwrap();
        let json = export.to_json().unwrap();
        assert!(json.contains("\"metric\": \"height\""));
        assert!(json.contains("\"gender\": \"female\""));
    }
}
