//! Supabase PostgREST client.
//!
//! Wraps a `reqwest::Client` with the headers PostgREST expects and
//! provides the three access patterns the monitoring tools need: full
//! paginated fetches via the `Range` header, exact counts via
//! `Prefer: count=exact`, and small bounded listings.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, SupabaseError};
use crate::query::Query;
use crate::types::SignalRecord;

/// Default pagination window.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default cap on total rows fetched before the runaway guard fires.
pub const DEFAULT_MAX_ROWS: u64 = 1_000_000;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for [`SupabaseClient`].
#[derive(Debug, Clone)]
pub struct SupabaseClientConfig {
    /// REST base URL (`https://{ref}.supabase.co/rest/v1`).
    pub base_url: String,

    /// Service-role API key.
    pub api_key: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Pagination window size.
    pub batch_size: usize,

    /// Runaway-pagination cap.
    pub max_rows: u64,
}

impl SupabaseClientConfig {
    /// Creates a configuration with default timeout and pagination limits.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the pagination window size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the runaway-pagination cap.
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: u64) -> Self {
        self.max_rows = max_rows;
        self
    }
}

// =============================================================================
// SupabaseClient
// =============================================================================

/// PostgREST client for the signal-monitoring queries.
///
/// Requests are sequential; one page is outstanding at a time.
pub struct SupabaseClient {
    config: SupabaseClientConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.config.base_url)
            .field("batch_size", &self.config.batch_size)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Creates a client from the given configuration.
    ///
    /// # Errors
    /// Returns a setup error if the API key is not a valid header value or
    /// the HTTP client cannot be built.
    pub fn new(config: SupabaseClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key_value = HeaderValue::from_str(&config.api_key)
            .map_err(|_| SupabaseError::setup("service-role key is not a valid header value"))?;
        headers.insert("apikey", key_value);
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| SupabaseError::setup("service-role key is not a valid header value"))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| SupabaseError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    /// Returns the REST base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), table)
    }

    /// Issues one GET and returns the JSON array body plus the
    /// `Content-Range` header, if present.
    async fn get_rows(
        &self,
        query: &Query,
        extra_headers: &[(&str, String)],
    ) -> Result<(Vec<SignalRecord>, Option<String>)> {
        let mut request = self
            .http
            .get(self.table_url(query.table_name()))
            .query(query.params());
        for (name, value) in extra_headers {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let content_range = response
            .headers()
            .get("Content-Range")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SupabaseError::api(status.as_u16(), body));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| SupabaseError::unexpected_shape(format!("body is not JSON: {e}")))?;
        if !value.is_array() {
            return Err(SupabaseError::unexpected_shape(
                "PostgREST returned a non-array body",
            ));
        }
        let rows: Vec<SignalRecord> = serde_json::from_value(value)?;
        Ok((rows, content_range))
    }

    /// Fetches the complete result set for `query`, paginating with the
    /// `Range` header until the resource is exhausted.
    ///
    /// # Errors
    /// Fails on non-2xx responses, non-array bodies, or once pagination
    /// advances past the configured row cap without the server reporting a
    /// total.
    pub async fn fetch_all_rows(&self, query: &Query) -> Result<Vec<SignalRecord>> {
        let batch = self.config.batch_size;
        let mut out: Vec<SignalRecord> = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let range = format!("{}-{}", offset, offset + batch as u64 - 1);
            let (rows, content_range) = self.get_rows(query, &[("Range", range)]).await?;
            debug!(offset, rows = rows.len(), "fetched page");

            let page_len = rows.len();
            out.extend(rows);

            if page_len < batch {
                break;
            }

            if let Some(total) = content_range.as_deref().and_then(parse_content_range_total) {
                offset += batch as u64;
                if offset >= total {
                    break;
                }
                continue;
            }

            offset += batch as u64;

            // No usable total reported; guard against a malformed filter
            // paginating forever.
            if offset > self.config.max_rows {
                return Err(SupabaseError::PaginationOverflow {
                    max_rows: self.config.max_rows,
                });
            }
        }

        info!(table = query.table_name(), rows = out.len(), "fetch complete");
        Ok(out)
    }

    /// Returns the exact number of rows matching the composite filter.
    ///
    /// Sends `Prefer: count=exact` with a minimal `Range` window and reads
    /// the total from the `Content-Range` header; a missing or malformed
    /// header counts as zero.
    ///
    /// # Errors
    /// Fails on non-2xx responses or a non-array body.
    pub async fn count_exact(&self, table: &str, conditions: &[String]) -> Result<u64> {
        let query = Query::table(table).select(&["id"]).and_filter(conditions);
        let (_, content_range) = self
            .get_rows(
                &query,
                &[
                    ("Prefer", "count=exact".to_string()),
                    ("Range", "0-0".to_string()),
                ],
            )
            .await?;
        Ok(content_range
            .as_deref()
            .and_then(parse_content_range_total)
            .unwrap_or(0))
    }

    /// Fetches a single bounded page (the query carries its own `limit`).
    ///
    /// # Errors
    /// Fails on non-2xx responses or a non-array body.
    pub async fn fetch_rows(&self, query: &Query) -> Result<Vec<SignalRecord>> {
        let (rows, _) = self.get_rows(query, &[]).await?;
        Ok(rows)
    }
}

/// Parses the total from a `Content-Range` header (`lo-hi/total`, `*/0`).
fn parse_content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.rsplit_once('/')?;
    total.parse().ok()
}
