//! Stuck-row health check over the `ai_signals` table.
//!
//! Two exact-count queries against literal filter predicates: non-virtual
//! FILLED rows that never closed past an age threshold, and non-virtual
//! PENDING rows past a (shorter) age threshold. A non-zero count in either
//! category exits with status 2 so a monitoring caller can alert on it.

use chrono::{DateTime, Duration, Utc};
use clap::Args;
use serde_json::Value;
use tracing::debug;

use signal_monitor_supabase::{auth, Query, SignalRecord, SupabaseClient, SupabaseClientConfig};

/// Table holding the signal rows.
const TABLE: &str = "ai_signals";

/// Exit status reported when stuck rows exist.
const EXIT_STUCK: i32 = 2;

#[derive(Args, Debug)]
pub struct StuckCheckArgs {
    /// Supabase project ref (falls back to PROJECT_REF or the local link file)
    #[arg(long)]
    pub project_ref: Option<String>,

    /// Service-role key (falls back to SUPABASE_SERVICE_ROLE_KEY or the supabase CLI)
    #[arg(long)]
    pub service_role_key: Option<String>,

    /// Report FILLED & no-close rows older than this many hours
    #[arg(long, default_value_t = 48.0)]
    pub filled_max_age_hours: f64,

    /// Report PENDING rows older than this many hours
    #[arg(long, default_value_t = 24.0)]
    pub pending_max_age_hours: f64,

    /// How many rows to print for each category
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

/// Predicate for FILLED rows that never closed: the literal conjunction of
/// non-virtual, FILLED, no close timestamp, no exit price, no P&L, and an
/// age cutoff. A row matching it may still be a live position; the listing
/// says so rather than judging.
fn filled_stuck_conditions(cutoff: DateTime<Utc>) -> Vec<String> {
    vec![
        "is_virtual.eq.false".to_string(),
        "actual_result.eq.FILLED".to_string(),
        "closed_at.is.null".to_string(),
        "exit_price.is.null".to_string(),
        "profit_loss.is.null".to_string(),
        format!("created_at.lt.{}", cutoff.to_rfc3339()),
    ]
}

/// Predicate for PENDING rows past the age cutoff.
fn pending_stale_conditions(cutoff: DateTime<Utc>) -> Vec<String> {
    vec![
        "is_virtual.eq.false".to_string(),
        "actual_result.eq.PENDING".to_string(),
        format!("created_at.lt.{}", cutoff.to_rfc3339()),
    ]
}

/// Maps the two category counts to the process exit status.
fn exit_status(filled_count: u64, pending_count: u64) -> i32 {
    if filled_count == 0 && pending_count == 0 {
        0
    } else {
        EXIT_STUCK
    }
}

fn display_str(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn display_value(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

fn print_offenders(rows: &[SignalRecord]) {
    for row in rows {
        println!(
            "{} {} {} ticket={} id={}",
            display_str(&row.created_at),
            display_str(&row.symbol),
            display_str(&row.timeframe),
            display_value(&row.order_ticket),
            display_value(&row.id),
        );
    }
}

/// Runs the stuck-row check and returns the process exit status.
pub async fn run(args: StuckCheckArgs) -> anyhow::Result<i32> {
    let project_ref = auth::resolve_project_ref(args.project_ref.as_deref())?;
    let api_key = auth::resolve_service_role_key(args.service_role_key.as_deref(), &project_ref)?;
    let base_url = auth::resolve_base_url(&project_ref);

    let client = SupabaseClient::new(
        SupabaseClientConfig::new(base_url, api_key).with_timeout_secs(30),
    )?;

    let now = Utc::now();
    let filled_cutoff = now - hours(args.filled_max_age_hours);
    let pending_cutoff = now - hours(args.pending_max_age_hours);
    debug!(%filled_cutoff, %pending_cutoff, "stuck-check cutoffs");

    let filled_conditions = filled_stuck_conditions(filled_cutoff);
    let pending_conditions = pending_stale_conditions(pending_cutoff);

    let filled_count = client.count_exact(TABLE, &filled_conditions).await?;
    let pending_count = client.count_exact(TABLE, &pending_conditions).await?;

    println!("=== ai_signals stuck check ===");
    println!("project_ref={project_ref}");
    println!("now_utc={}", now.to_rfc3339());
    println!();
    println!(
        "FILLED & no-close & age>{}h: {}",
        args.filled_max_age_hours, filled_count
    );
    println!(
        "PENDING & age>{}h: {}",
        args.pending_max_age_hours, pending_count
    );

    if filled_count > 0 {
        let query = Query::table(TABLE)
            .select(&[
                "id",
                "created_at",
                "symbol",
                "timeframe",
                "order_ticket",
                "entry_price",
                "actual_result",
                "closed_at",
            ])
            .and_filter(&filled_conditions)
            .order("created_at.asc")
            .limit(args.limit);
        let rows = client.fetch_rows(&query).await?;
        println!("\n--- oldest FILLED no-close (stuck candidates) ---");
        print_offenders(&rows);
        println!(
            "\nNOTE: FILLED with closed_at NULL may be a live position. Confirm it is no \
             longer held on the trading terminal before cleaning up, and only by ticket."
        );
    }

    if pending_count > 0 {
        let query = Query::table(TABLE)
            .select(&[
                "id",
                "created_at",
                "symbol",
                "timeframe",
                "order_ticket",
                "actual_result",
                "closed_at",
            ])
            .and_filter(&pending_conditions)
            .order("created_at.asc")
            .limit(args.limit);
        let rows = client.fetch_rows(&query).await?;
        println!("\n--- oldest PENDING (stale candidates) ---");
        print_offenders(&rows);
    }

    Ok(exit_status(filled_count, pending_count))
}

fn hours(h: f64) -> Duration {
    Duration::seconds((h * 3600.0) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_exit_status_mapping() {
        assert_eq!(exit_status(0, 0), 0);
        assert_eq!(exit_status(1, 0), 2);
        assert_eq!(exit_status(0, 3), 2);
        assert_eq!(exit_status(5, 7), 2);
    }

    #[test]
    fn test_filled_conditions_are_literal() {
        let cutoff = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
        let conditions = filled_stuck_conditions(cutoff);
        assert_eq!(
            conditions,
            vec![
                "is_virtual.eq.false",
                "actual_result.eq.FILLED",
                "closed_at.is.null",
                "exit_price.is.null",
                "profit_loss.is.null",
                "created_at.lt.2025-10-01T00:00:00+00:00",
            ]
        );
    }

    #[test]
    fn test_pending_conditions_are_literal() {
        let cutoff = Utc.with_ymd_and_hms(2025, 10, 2, 12, 30, 0).unwrap();
        let conditions = pending_stale_conditions(cutoff);
        assert_eq!(
            conditions,
            vec![
                "is_virtual.eq.false",
                "actual_result.eq.PENDING",
                "created_at.lt.2025-10-02T12:30:00+00:00",
            ]
        );
    }

    #[test]
    fn test_fractional_hours() {
        assert_eq!(hours(1.5), Duration::seconds(5400));
    }

    #[test]
    fn test_display_value_variants() {
        assert_eq!(display_value(&Some(serde_json::json!(12345))), "12345");
        assert_eq!(display_value(&Some(serde_json::json!("t-9"))), "t-9");
        assert_eq!(display_value(&Some(serde_json::Value::Null)), "-");
        assert_eq!(display_value(&None), "-");
    }
}
