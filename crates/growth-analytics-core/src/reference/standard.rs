//! Built-in reference tables (WHO Child Growth Standards, 0 - 60 months).
//!
//! Values are the 3rd/15th/50th/85th/97th percentiles, rounded to one
//! decimal. Ages between the tabulated months are interpolated downstream.

use std::sync::Arc;

use lazy_static::lazy_static;
use tracing::error;

use crate::models::{Gender, Metric, ReferenceCurvePoint};

use super::ReferenceCurveStore;

/// Highest tabulated age of the built-in tables.
pub const STANDARD_MAX_AGE_MONTHS: u32 = 60;

type Table = &'static [(u32, [f64; 5])];

const WEIGHT_MALE: Table = &[
    (0, [2.5, 2.9, 3.3, 3.9, 4.3]),
    (1, [3.4, 3.9, 4.5, 5.1, 5.7]),
    (2, [4.4, 4.9, 5.6, 6.3, 7.0]),
    (3, [5.1, 5.6, 6.4, 7.2, 7.9]),
    (4, [5.6, 6.2, 7.0, 7.9, 8.6]),
    (5, [6.1, 6.7, 7.5, 8.4, 9.2]),
    (6, [6.4, 7.1, 7.9, 8.9, 9.7]),
    (9, [7.2, 7.9, 8.9, 9.9, 10.9]),
    (12, [7.8, 8.6, 9.6, 10.8, 11.8]),
    (15, [8.3, 9.1, 10.3, 11.5, 12.7]),
    (18, [8.8, 9.7, 10.9, 12.2, 13.5]),
    (24, [9.8, 10.8, 12.2, 13.6, 15.1]),
    (30, [10.7, 11.8, 13.3, 15.0, 16.6]),
    (36, [11.4, 12.7, 14.3, 16.2, 18.0]),
    (42, [12.2, 13.5, 15.3, 17.4, 19.4]),
    (48, [12.9, 14.3, 16.3, 18.6, 20.9]),
    (54, [13.6, 15.2, 17.3, 19.8, 22.3]),
    (60, [14.3, 16.0, 18.3, 21.0, 23.8]),
];

const WEIGHT_FEMALE: Table = &[
    (0, [2.4, 2.8, 3.2, 3.7, 4.2]),
    (1, [3.2, 3.6, 4.2, 4.8, 5.4]),
    (2, [4.0, 4.5, 5.1, 5.9, 6.5]),
    (3, [4.6, 5.1, 5.8, 6.7, 7.4]),
    (4, [5.1, 5.6, 6.4, 7.3, 8.1]),
    (5, [5.5, 6.1, 6.9, 7.8, 8.7]),
    (6, [5.8, 6.4, 7.3, 8.3, 9.2]),
    (9, [6.6, 7.3, 8.2, 9.3, 10.4]),
    (12, [7.1, 7.9, 8.9, 10.1, 11.3]),
    (15, [7.6, 8.5, 9.6, 10.9, 12.2]),
    (18, [8.1, 9.0, 10.2, 11.6, 13.0]),
    (24, [9.2, 10.2, 11.5, 13.1, 14.6]),
    (30, [10.1, 11.2, 12.7, 14.5, 16.2]),
    (36, [11.0, 12.2, 13.9, 15.8, 17.8]),
    (42, [11.8, 13.1, 15.0, 17.2, 19.4]),
    (48, [12.5, 14.0, 16.1, 18.5, 21.0]),
    (54, [13.2, 14.8, 17.2, 19.8, 22.6]),
    (60, [14.0, 15.7, 18.2, 21.1, 24.2]),
];

const HEIGHT_MALE: Table = &[
    (0, [46.3, 47.9, 49.9, 51.8, 53.4]),
    (1, [51.1, 52.7, 54.7, 56.7, 58.4]),
    (2, [54.7, 56.4, 58.4, 60.5, 62.2]),
    (3, [57.6, 59.3, 61.4, 63.5, 65.3]),
    (4, [60.0, 61.7, 63.9, 66.0, 67.8]),
    (5, [61.9, 63.7, 65.9, 68.1, 69.9]),
    (6, [63.6, 65.4, 67.6, 69.8, 71.6]),
    (9, [67.7, 69.6, 72.0, 74.4, 76.2]),
    (12, [71.3, 73.3, 75.7, 78.2, 80.2]),
    (15, [74.4, 76.6, 79.1, 81.7, 83.8]),
    (18, [77.2, 79.5, 82.3, 85.0, 87.3]),
    (24, [82.1, 84.8, 87.8, 90.9, 93.6]),
    (30, [85.5, 88.5, 91.9, 95.3, 98.3]),
    (36, [89.1, 92.2, 96.1, 99.8, 103.1]),
    (42, [92.4, 95.7, 99.9, 104.0, 107.4]),
    (48, [95.4, 99.0, 103.3, 107.7, 111.2]),
    (54, [98.4, 102.1, 106.7, 111.2, 115.0]),
    (60, [101.2, 105.2, 110.0, 114.6, 118.7]),
];

const HEIGHT_FEMALE: Table = &[
    (0, [45.6, 47.2, 49.1, 51.1, 52.7]),
    (1, [50.0, 51.7, 53.7, 55.7, 57.4]),
    (2, [53.2, 55.0, 57.1, 59.2, 60.9]),
    (3, [55.8, 57.6, 59.8, 62.0, 63.8]),
    (4, [58.0, 59.8, 62.1, 64.3, 66.2]),
    (5, [59.9, 61.7, 64.0, 66.3, 68.2]),
    (6, [61.5, 63.4, 65.7, 68.1, 70.0]),
    (9, [65.6, 67.7, 70.1, 72.6, 74.7]),
    (12, [69.2, 71.3, 74.0, 76.7, 78.9]),
    (15, [72.4, 74.8, 77.5, 80.3, 82.7]),
    (18, [75.2, 77.7, 80.7, 83.6, 86.2]),
    (24, [80.3, 83.2, 86.4, 89.6, 92.5]),
    (30, [84.0, 87.1, 90.7, 94.2, 97.3]),
    (36, [87.9, 91.2, 95.1, 99.0, 102.4]),
    (42, [91.4, 94.9, 99.0, 103.1, 106.7]),
    (48, [94.6, 98.3, 102.7, 107.0, 110.8]),
    (54, [97.6, 101.5, 106.2, 110.8, 114.8]),
    (60, [100.5, 104.5, 109.4, 114.2, 118.4]),
];

const HEAD_MALE: Table = &[
    (0, [32.1, 33.1, 34.5, 35.8, 36.9]),
    (1, [35.1, 36.1, 37.3, 38.5, 39.5]),
    (2, [36.9, 37.9, 39.1, 40.3, 41.3]),
    (3, [38.3, 39.3, 40.5, 41.7, 42.7]),
    (4, [39.4, 40.4, 41.6, 42.9, 43.9]),
    (5, [40.3, 41.3, 42.6, 43.8, 44.8]),
    (6, [41.0, 42.1, 43.3, 44.6, 45.6]),
    (9, [42.6, 43.7, 45.0, 46.3, 47.4]),
    (12, [43.6, 44.7, 46.1, 47.4, 48.5]),
    (15, [44.3, 45.4, 46.8, 48.2, 49.3]),
    (18, [44.8, 46.0, 47.4, 48.8, 49.9]),
    (24, [45.5, 46.8, 48.3, 49.7, 50.8]),
    (30, [46.1, 47.3, 48.9, 50.3, 51.5]),
    (36, [46.6, 47.8, 49.5, 50.8, 52.0]),
    (42, [46.9, 48.2, 49.9, 51.2, 52.5]),
    (48, [47.2, 48.5, 50.2, 51.5, 52.8]),
    (54, [47.5, 48.8, 50.5, 51.8, 53.1]),
    (60, [47.7, 49.1, 50.7, 52.1, 53.4]),
];

const HEAD_FEMALE: Table = &[
    (0, [31.7, 32.7, 33.9, 35.1, 36.1]),
    (1, [34.3, 35.3, 36.5, 37.8, 38.8]),
    (2, [36.0, 37.0, 38.3, 39.5, 40.5]),
    (3, [37.2, 38.2, 39.5, 40.8, 41.9]),
    (4, [38.2, 39.3, 40.6, 41.9, 43.0]),
    (5, [39.0, 40.1, 41.5, 42.8, 43.9]),
    (6, [39.7, 40.8, 42.2, 43.5, 44.6]),
    (9, [41.2, 42.3, 43.8, 45.1, 46.3]),
    (12, [42.2, 43.4, 44.9, 46.3, 47.5]),
    (15, [42.9, 44.1, 45.7, 47.1, 48.3]),
    (18, [43.5, 44.7, 46.2, 47.7, 48.9]),
    (24, [44.3, 45.5, 47.2, 48.6, 49.9]),
    (30, [44.9, 46.2, 47.8, 49.3, 50.6]),
    (36, [45.4, 46.7, 48.4, 49.9, 51.2]),
    (42, [45.8, 47.1, 48.8, 50.3, 51.6]),
    (48, [46.1, 47.4, 49.1, 50.7, 52.0]),
    (54, [46.4, 47.7, 49.4, 51.0, 52.3]),
    (60, [46.7, 48.0, 49.7, 51.2, 52.6]),
];

/// Built-in tables in (metric, gender) order.
const STANDARD_TABLES: [(Metric, Gender, Table); 6] = [
    (Metric::Weight, Gender::Male, WEIGHT_MALE),
    (Metric::Weight, Gender::Female, WEIGHT_FEMALE),
    (Metric::Height, Gender::Male, HEIGHT_MALE),
    (Metric::Height, Gender::Female, HEIGHT_FEMALE),
    (Metric::HeadCircumference, Gender::Male, HEAD_MALE),
    (Metric::HeadCircumference, Gender::Female, HEAD_FEMALE),
];

/// Every built-in row, sorted by (metric, gender, age).
pub fn standard_points() -> Vec<ReferenceCurvePoint> {
    STANDARD_TABLES
        .iter()
        .flat_map(|&(metric, gender, table)| {
            table
                .iter()
                .map(move |&(age, values)| ReferenceCurvePoint::new(metric, gender, age, values))
        })
        .collect()
}

lazy_static! {
    static ref STANDARD_STORE: Arc<ReferenceCurveStore> = Arc::new(build_standard_store());
}

/// Validated store over the built-in tables.
///
/// The tables are checked by `test_standard_tables_satisfy_invariants`; if
/// they ever fail, every lookup reports missing reference data.
fn build_standard_store() -> ReferenceCurveStore {
    match ReferenceCurveStore::from_points(standard_points()) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Built-in reference tables failed validation");
            ReferenceCurveStore::default()
        }
    }
}

impl ReferenceCurveStore {
    /// The process-wide built-in store, built on first use.
    pub fn standard() -> Arc<ReferenceCurveStore> {
        Arc::clone(&STANDARD_STORE)
    }
}
