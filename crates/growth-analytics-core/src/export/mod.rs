//! Export functionality for the charting client.

mod chart;

pub use chart::*;
