//! Text rendering for calibration summaries.
//!
//! Pure formatting: percentages to one decimal, floats to four, `-` for
//! absent values, tab-separated rows. No business logic.

use std::fmt::Write as _;

use crate::summary::CalibrationSummary;

/// Maximum group rows rendered in the breakdown table.
const GROUP_ROW_LIMIT: usize = 20;

/// Formats a fraction as a percentage with one decimal, `-` when absent.
#[must_use]
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{:.1}%", v * 100.0),
        _ => "-".to_string(),
    }
}

/// Formats a float to four decimals, `-` when absent.
#[must_use]
pub fn format_float(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{v:.4}"),
        _ => "-".to_string(),
    }
}

/// Renders one titled summary section.
#[must_use]
pub fn render_summary(title: &str, summary: &CalibrationSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n== {title} ==");

    if summary.is_empty() {
        let _ = writeln!(out, "no usable samples (win_prob + outcome both present)");
        return out;
    }

    let _ = writeln!(
        out,
        "n={}  avg_win_prob={}  realized_win_rate={}  brier={}",
        summary.n,
        format_pct(Some(summary.avg_p)),
        format_pct(Some(summary.win_rate)),
        format_float(Some(summary.brier)),
    );

    let _ = writeln!(out, "\n-- reliability bins (step=0.05) --");
    let _ = writeln!(out, "bin\tn\tavg_p\twin_rate\tdelta");
    for bin in &summary.bins {
        let _ = writeln!(
            out,
            "{:.2}\t{}\t{}\t{}\t{}",
            bin.bin,
            bin.n,
            format_pct(Some(bin.avg_p)),
            format_pct(Some(bin.win_rate)),
            format_pct(Some(bin.delta)),
        );
    }

    let _ = writeln!(out, "\n-- thresholds (p>=thr) --");
    let _ = writeln!(out, "thr\tn\tavg_p\twin_rate\tbrier");
    for slice in &summary.thresholds {
        let _ = writeln!(
            out,
            "{:.2}\t{}\t{}\t{}\t{}",
            slice.threshold,
            slice.n,
            format_pct(slice.avg_p),
            format_pct(slice.win_rate),
            format_float(slice.brier),
        );
    }

    let _ = writeln!(out, "\n-- by symbol/timeframe/dir (top by n) --");
    let _ = writeln!(out, "symbol\ttf\tdir\tn\tavg_p\twin_rate\tdelta");
    for group in summary.groups.iter().take(GROUP_ROW_LIMIT) {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            group.symbol,
            group.timeframe,
            group.dir,
            group.n,
            format_pct(Some(group.avg_p)),
            format_pct(Some(group.win_rate)),
            format_pct(Some(group.delta)),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::summarize;
    use serde_json::json;
    use signal_monitor_supabase::SignalRecord;

    fn record(win_prob: f64, result: &str) -> SignalRecord {
        SignalRecord {
            win_prob: Some(json!(win_prob)),
            actual_result: Some(result.to_string()),
            symbol: Some("USDJPY".to_string()),
            timeframe: Some("M15".to_string()),
            dir: Some("BUY".to_string()),
            ..SignalRecord::default()
        }
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(Some(0.523)), "52.3%");
        assert_eq!(format_pct(Some(1.0)), "100.0%");
        assert_eq!(format_pct(Some(-0.05)), "-5.0%");
        assert_eq!(format_pct(None), "-");
        assert_eq!(format_pct(Some(f64::NAN)), "-");
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(Some(0.123456)), "0.1235");
        assert_eq!(format_float(None), "-");
    }

    #[test]
    fn test_empty_summary_sentinel() {
        let rendered = render_summary("Recent-14d", &summarize(&[]));
        assert!(rendered.contains("== Recent-14d =="));
        assert!(rendered.contains("no usable samples"));
        assert!(!rendered.contains("reliability bins"));
    }

    #[test]
    fn test_render_sections_and_tabs() {
        let rows = vec![record(0.82, "WIN"), record(0.78, "LOSS")];
        let rendered = render_summary("window", &summarize(&rows));
        assert!(rendered.contains("n=2"));
        assert!(rendered.contains("-- reliability bins (step=0.05) --"));
        assert!(rendered.contains("-- thresholds (p>=thr) --"));
        assert!(rendered.contains("-- by symbol/timeframe/dir (top by n) --"));
        assert!(rendered.contains("bin\tn\tavg_p\twin_rate\tdelta"));
        assert!(rendered.contains("USDJPY\tM15\tBUY\t2"));
    }

    #[test]
    fn test_zero_count_threshold_renders_dashes() {
        let rows = vec![record(0.3, "WIN")];
        let rendered = render_summary("window", &summarize(&rows));
        assert!(rendered.contains("0.80\t0\t-\t-\t-"));
    }
}
