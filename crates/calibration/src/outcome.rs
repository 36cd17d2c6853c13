//! Realized-outcome extraction from raw signal rows.
//!
//! The categorical label wins over the P&L sign; a row that resolves
//! neither way is unknown and excluded from calibration, never counted as
//! a loss. All coercion here is tolerant: bad data yields `None`, not an
//! error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use signal_monitor_supabase::SignalRecord;

/// Labels that settle a signal as won.
const WIN_LABELS: &[&str] = &["WIN", "W", "TP"];

/// Labels that settle a signal as lost.
const LOSS_LABELS: &[&str] = &["LOSS", "L", "SL"];

/// The realized binary outcome of a settled signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RealizedOutcome {
    /// Signal won.
    Win,
    /// Signal lost.
    Loss,
}

impl RealizedOutcome {
    /// Returns the ground-truth indicator: 1.0 for a win, 0.0 for a loss.
    #[must_use]
    pub fn indicator(self) -> f64 {
        match self {
            Self::Win => 1.0,
            Self::Loss => 0.0,
        }
    }
}

/// Coerces a raw JSON value to a float.
///
/// Numbers pass through; strings are trimmed and parsed. Anything else,
/// including empty strings, is `None`.
#[must_use]
pub fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse().ok()
        }
        _ => None,
    }
}

/// Derives the realized outcome of a raw row.
///
/// The `actual_result` label is checked first (trimmed, case-insensitive);
/// failing that, a non-zero `profit_loss` decides by sign. Zero or missing
/// P&L with no usable label is unknown.
#[must_use]
pub fn realized_outcome(record: &SignalRecord) -> Option<RealizedOutcome> {
    if let Some(label) = record.actual_result.as_deref() {
        let label = label.trim().to_ascii_uppercase();
        if WIN_LABELS.contains(&label.as_str()) {
            return Some(RealizedOutcome::Win);
        }
        if LOSS_LABELS.contains(&label.as_str()) {
            return Some(RealizedOutcome::Loss);
        }
    }

    if let Some(pnl) = record.profit_loss.as_ref().and_then(coerce_float) {
        if pnl > 0.0 {
            return Some(RealizedOutcome::Win);
        }
        if pnl < 0.0 {
            return Some(RealizedOutcome::Loss);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(actual_result: Option<&str>, profit_loss: Option<Value>) -> SignalRecord {
        SignalRecord {
            actual_result: actual_result.map(str::to_string),
            profit_loss,
            ..SignalRecord::default()
        }
    }

    // ==================== Label Tests ====================

    #[test]
    fn test_win_label() {
        let r = record(Some("WIN"), None);
        assert_eq!(realized_outcome(&r), Some(RealizedOutcome::Win));
    }

    #[test]
    fn test_loss_label_any_case() {
        let r = record(Some("loss"), None);
        assert_eq!(realized_outcome(&r), Some(RealizedOutcome::Loss));
    }

    #[test]
    fn test_short_labels_and_whitespace() {
        assert_eq!(
            realized_outcome(&record(Some(" tp "), None)),
            Some(RealizedOutcome::Win)
        );
        assert_eq!(
            realized_outcome(&record(Some("sl"), None)),
            Some(RealizedOutcome::Loss)
        );
        assert_eq!(
            realized_outcome(&record(Some("W"), None)),
            Some(RealizedOutcome::Win)
        );
        assert_eq!(
            realized_outcome(&record(Some("L"), None)),
            Some(RealizedOutcome::Loss)
        );
    }

    #[test]
    fn test_label_takes_precedence_over_pnl() {
        let r = record(Some("LOSS"), Some(json!(120.5)));
        assert_eq!(realized_outcome(&r), Some(RealizedOutcome::Loss));
    }

    #[test]
    fn test_unsettled_label_falls_through_to_pnl() {
        let r = record(Some("FILLED"), Some(json!(5)));
        assert_eq!(realized_outcome(&r), Some(RealizedOutcome::Win));
    }

    // ==================== P&L Tests ====================

    #[test]
    fn test_positive_pnl_is_win() {
        let r = record(None, Some(json!(5.0)));
        assert_eq!(realized_outcome(&r), Some(RealizedOutcome::Win));
    }

    #[test]
    fn test_negative_pnl_is_loss() {
        let r = record(None, Some(json!(-3)));
        assert_eq!(realized_outcome(&r), Some(RealizedOutcome::Loss));
    }

    #[test]
    fn test_zero_pnl_is_unknown() {
        let r = record(None, Some(json!(0.0)));
        assert_eq!(realized_outcome(&r), None);
    }

    #[test]
    fn test_missing_everything_is_unknown() {
        let r = record(None, None);
        assert_eq!(realized_outcome(&r), None);
    }

    #[test]
    fn test_non_numeric_pnl_string_is_unknown() {
        let r = record(None, Some(json!("n/a")));
        assert_eq!(realized_outcome(&r), None);
    }

    #[test]
    fn test_numeric_pnl_string_coerces() {
        let r = record(None, Some(json!(" -2.5 ")));
        assert_eq!(realized_outcome(&r), Some(RealizedOutcome::Loss));
    }

    // ==================== Coercion Tests ====================

    #[test]
    fn test_coerce_float() {
        assert_eq!(coerce_float(&json!(0.75)), Some(0.75));
        assert_eq!(coerce_float(&json!(3)), Some(3.0));
        assert_eq!(coerce_float(&json!("0.6")), Some(0.6));
        assert_eq!(coerce_float(&json!("")), None);
        assert_eq!(coerce_float(&json!("abc")), None);
        assert_eq!(coerce_float(&json!(true)), None);
        assert_eq!(coerce_float(&json!(null)), None);
    }

    #[test]
    fn test_indicator_values() {
        assert_eq!(RealizedOutcome::Win.indicator(), 1.0);
        assert_eq!(RealizedOutcome::Loss.indicator(), 0.0);
    }
}
