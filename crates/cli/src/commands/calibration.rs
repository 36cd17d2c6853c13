//! Win-probability calibration report.
//!
//! Fetches settled `ai_signals` rows for a fixed date window plus a recent
//! window, joins predicted probability against realized outcome, and prints
//! the calibration tables. One documented retry exists: if the server
//! rejects a filter on an optional column (`is_virtual`/`actual_result`),
//! the fetch is retried exactly once without those filters.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use clap::Args;
use tracing::warn;

use signal_monitor_calibration::{render_summary, summarize};
use signal_monitor_supabase::{
    auth, Query, SupabaseClient, SupabaseClientConfig, SupabaseError,
};

/// Table holding the signal rows.
const TABLE: &str = "ai_signals";

/// Columns the calibration report needs.
const SELECT_COLUMNS: &[&str] = &[
    "created_at",
    "symbol",
    "timeframe",
    "dir",
    "win_prob",
    "actual_result",
    "is_virtual",
];

/// Settled-outcome labels used to pre-filter the payload server-side.
const SETTLED_LABELS: &str = "in.(WIN,LOSS,TP,SL,W,L)";

#[derive(Args, Debug)]
pub struct CalibrationArgs {
    /// Supabase project ref (falls back to PROJECT_REF or the local link file)
    #[arg(long)]
    pub project_ref: Option<String>,

    /// Service-role key (falls back to SUPABASE_SERVICE_ROLE_KEY or the supabase CLI)
    #[arg(long)]
    pub service_role_key: Option<String>,

    /// Fixed window start (YYYY-MM-DD or RFC 3339)
    #[arg(long, default_value = "2025-10-01")]
    pub window_start: String,

    /// Fixed window end, exclusive (YYYY-MM-DD or RFC 3339)
    #[arg(long, default_value = "2025-12-01")]
    pub window_end: String,

    /// Length of the second, recent reporting window in days
    #[arg(long, default_value_t = 14)]
    pub recent_days: i64,

    /// Keep paper-trading rows in the statistics
    #[arg(long)]
    pub include_virtual: bool,
}

/// One reporting window.
#[derive(Debug, Clone)]
struct Period {
    name: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Parses `YYYY-MM-DD` (midnight UTC) or an ISO 8601 datetime; naive
/// datetimes are assumed UTC.
fn parse_boundary(s: &str) -> anyhow::Result<DateTime<Utc>> {
    if s.len() == 10 {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")?;
        return Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")?;
    Ok(naive.and_utc())
}

/// Builds the per-period query with the optional-column filters applied.
fn build_query(period: &Period, include_virtual: bool) -> Query {
    let mut query = base_query(period);
    if !include_virtual {
        // Rejected by the server when the column does not exist; the caller
        // retries once without it.
        query = query.filter("is_virtual", "eq.false");
    }
    query.filter("actual_result", SETTLED_LABELS)
}

/// The same query with both optional-column filters dropped.
fn fallback_query(period: &Period) -> Query {
    base_query(period)
}

fn base_query(period: &Period) -> Query {
    Query::table(TABLE)
        .select(SELECT_COLUMNS)
        .order("created_at.asc")
        .filter("created_at", format!("gte.{}", period.start.to_rfc3339()))
        .filter("created_at", format!("lt.{}", period.end.to_rfc3339()))
}

/// Whether a fetch failure is the optional-column rejection that warrants
/// the single fallback retry.
fn should_retry_without_optional_filters(err: &SupabaseError) -> bool {
    err.api_body()
        .is_some_and(|body| body.contains("is_virtual") || body.contains("actual_result"))
}

/// Runs the calibration report and returns the process exit status.
pub async fn run(args: CalibrationArgs) -> anyhow::Result<i32> {
    let project_ref = auth::resolve_project_ref(args.project_ref.as_deref())?;
    let api_key = auth::resolve_service_role_key(args.service_role_key.as_deref(), &project_ref)?;
    let base_url = auth::resolve_base_url(&project_ref);

    let client = SupabaseClient::new(
        SupabaseClientConfig::new(base_url, api_key).with_timeout_secs(60),
    )?;

    let window = Period {
        name: format!("{}..{}", args.window_start, args.window_end),
        start: parse_boundary(&args.window_start)?,
        end: parse_boundary(&args.window_end)?,
    };
    let now = Utc::now();
    let recent = Period {
        name: format!("Recent-{}d", args.recent_days),
        start: now - Duration::days(args.recent_days),
        end: now,
    };

    for period in [window, recent] {
        let query = build_query(&period, args.include_virtual);
        let rows = match client.fetch_all_rows(&query).await {
            Ok(rows) => rows,
            Err(err) if should_retry_without_optional_filters(&err) => {
                warn!(period = %period.name, %err, "optional-column filter rejected; retrying without it");
                client.fetch_all_rows(&fallback_query(&period)).await?
            }
            Err(err) => return Err(err.into()),
        };

        let summary = summarize(&rows);
        print!("{}", render_summary(&period.name, &summary));
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn period() -> Period {
        Period {
            name: "test".to_string(),
            start: Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
        }
    }

    // ==================== Boundary Parsing Tests ====================

    #[test]
    fn test_parse_date_only() {
        let dt = parse_boundary("2025-10-01").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_boundary("2025-10-01T09:30:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 10, 1, 7, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_datetime_assumes_utc() {
        let dt = parse_boundary("2025-10-01T09:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 10, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_boundary("last tuesday").is_err());
    }

    // ==================== Query Construction Tests ====================

    #[test]
    fn test_query_excludes_virtual_by_default() {
        let q = build_query(&period(), false);
        assert!(q
            .params()
            .contains(&("is_virtual".to_string(), "eq.false".to_string())));
        assert!(q
            .params()
            .contains(&("actual_result".to_string(), SETTLED_LABELS.to_string())));
    }

    #[test]
    fn test_query_include_virtual_drops_only_that_filter() {
        let q = build_query(&period(), true);
        assert!(!q.params().iter().any(|(k, _)| k == "is_virtual"));
        assert!(q.params().iter().any(|(k, _)| k == "actual_result"));
    }

    #[test]
    fn test_fallback_query_drops_both_optional_filters() {
        let q = fallback_query(&period());
        assert!(!q.params().iter().any(|(k, _)| k == "is_virtual"));
        assert!(!q.params().iter().any(|(k, _)| k == "actual_result"));
        assert!(q.params().iter().any(|(k, _)| k == "created_at"));
    }

    // ==================== Fallback Decision Tests ====================

    #[test]
    fn test_retry_on_missing_optional_column() {
        let err = SupabaseError::api(400, r#"{"message":"column ai_signals.is_virtual does not exist"}"#);
        assert!(should_retry_without_optional_filters(&err));

        let err = SupabaseError::api(400, r#"{"message":"invalid input for actual_result"}"#);
        assert!(should_retry_without_optional_filters(&err));
    }

    #[test]
    fn test_no_retry_on_unrelated_errors() {
        let err = SupabaseError::api(500, "internal error");
        assert!(!should_retry_without_optional_filters(&err));

        let err = SupabaseError::Network("connection refused".to_string());
        assert!(!should_retry_without_optional_filters(&err));
    }
}
