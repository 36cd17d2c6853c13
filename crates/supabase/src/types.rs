//! Raw row types for the `ai_signals` table.
//!
//! Every field is optional and fields whose type varies in practice
//! (numbers that sometimes arrive as strings) are kept as raw JSON values.
//! Coercion happens at the outcome-extraction boundary, not here.

use serde::Deserialize;
use serde_json::Value;

/// One raw `ai_signals` row as returned by PostgREST.
///
/// Presence of any field depends on the `select` list of the query that
/// produced the row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignalRecord {
    /// Row id.
    #[serde(default)]
    pub id: Option<Value>,
    /// Creation timestamp (RFC 3339 string, kept verbatim for display).
    #[serde(default)]
    pub created_at: Option<String>,
    /// Instrument symbol.
    #[serde(default)]
    pub symbol: Option<String>,
    /// Chart timeframe the signal was generated on.
    #[serde(default)]
    pub timeframe: Option<String>,
    /// Trade direction.
    #[serde(default)]
    pub dir: Option<String>,
    /// Predicted win probability; number or numeric string.
    #[serde(default)]
    pub win_prob: Option<Value>,
    /// Categorical outcome label (PENDING/FILLED/WIN/LOSS/...).
    #[serde(default)]
    pub actual_result: Option<String>,
    /// Paper-trading flag.
    #[serde(default)]
    pub is_virtual: Option<bool>,
    /// Realized profit and loss; number or numeric string.
    #[serde(default)]
    pub profit_loss: Option<Value>,
    /// Close timestamp.
    #[serde(default)]
    pub closed_at: Option<String>,
    /// Entry price.
    #[serde(default)]
    pub entry_price: Option<Value>,
    /// Exit price.
    #[serde(default)]
    pub exit_price: Option<Value>,
    /// Broker order ticket.
    #[serde(default)]
    pub order_ticket: Option<Value>,
}
