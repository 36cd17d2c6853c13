//! Supabase PostgREST client layer for the signal-monitoring tools.
//!
//! Resolves credentials, builds PostgREST queries, and fetches or counts
//! `ai_signals` rows with Range-header pagination.

pub mod auth;
pub mod client;
pub mod error;
pub mod query;
pub mod types;

pub use client::{SupabaseClient, SupabaseClientConfig};
pub use error::{Result, SupabaseError};
pub use query::Query;
pub use types::SignalRecord;
