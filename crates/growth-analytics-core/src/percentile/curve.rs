//! Piecewise-linear percentile curve at a single age.

use crate::models::PercentileSet;

/// Where a value sits on the percentile curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePosition {
    /// Unclamped percentile rank
    pub percentile: f64,
    /// Value fell below p3 or above p97 and was extrapolated
    pub outside_bands: bool,
}

/// Straight line through (x0, y0) and (x1, y1), evaluated at x.
fn interpolate(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

/// Percentile rank of `value` on the curve described by `bands`.
///
/// Within p3 - p97 the rank is interpolated inside the containing segment.
/// Outside, the nearest end segment's slope is extended; callers clamp.
pub fn percentile_on_curve(bands: &PercentileSet, value: f64) -> CurvePosition {
    let knots = bands.knots();
    let (first, second) = (knots[0], knots[1]);
    let (penultimate, last) = (knots[3], knots[4]);

    if value < first.1 {
        return CurvePosition {
            percentile: interpolate(first.1, first.0, second.1, second.0, value),
            outside_bands: true,
        };
    }
    if value > last.1 {
        return CurvePosition {
            percentile: interpolate(penultimate.1, penultimate.0, last.1, last.0, value),
            outside_bands: true,
        };
    }

    let percentile = knots
        .windows(2)
        .find(|segment| value <= segment[1].1)
        .map(|segment| {
            let ((p0, v0), (p1, v1)) = (segment[0], segment[1]);
            // Exact knots return the band rank untouched
            if value == v0 {
                p0
            } else if value == v1 {
                p1
            } else {
                interpolate(v0, p0, v1, p1, value)
            }
        })
        .unwrap_or(last.0);

    CurvePosition {
        percentile,
        outside_bands: false,
    }
}

/// Value at percentile rank `percentile` on the curve described by `bands`.
///
/// Inverse of [`percentile_on_curve`]; ranks below 3 or above 97 extend the
/// end segments.
pub fn value_on_curve(bands: &PercentileSet, percentile: f64) -> f64 {
    let knots = bands.knots();
    let (first, second) = (knots[0], knots[1]);
    let (penultimate, last) = (knots[3], knots[4]);

    if percentile < first.0 {
        return interpolate(first.0, first.1, second.0, second.1, percentile);
    }
    if percentile > last.0 {
        return interpolate(penultimate.0, penultimate.1, last.0, last.1, percentile);
    }

    knots
        .windows(2)
        .find(|segment| percentile <= segment[1].0)
        .map(|segment| {
            let ((p0, v0), (p1, v1)) = (segment[0], segment[1]);
            if percentile == p0 {
                v0
            } else if percentile == p1 {
                v1
            } else {
                interpolate(p0, v0, p1, v1, percentile)
            }
        })
        .unwrap_or(last.1)
}
