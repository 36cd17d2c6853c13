//! Win-probability calibration statistics.
//!
//! Pure computation over fetched signal rows: outcome extraction,
//! reliability-bin / threshold / group aggregation, and text rendering.

pub mod outcome;
pub mod report;
pub mod summary;

pub use outcome::{coerce_float, realized_outcome, RealizedOutcome};
pub use report::{format_float, format_pct, render_summary};
pub use summary::{summarize, CalibrationSample, CalibrationSummary, THRESHOLDS};
