//! Credential and project resolution for the Supabase REST API.
//!
//! The service-role key is resolved in order: explicit value, the
//! `SUPABASE_SERVICE_ROLE_KEY` environment variable, then the `supabase`
//! CLI (`supabase projects api-keys -o json`). The project ref similarly
//! falls back from flag to environment to the local link files the CLI
//! leaves behind. All failures here are fatal setup errors.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SupabaseError};

/// Environment variable holding the service-role key.
pub const SERVICE_ROLE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Environment variable overriding the REST base URL.
pub const BASE_URL_ENV: &str = "SUPABASE_URL";

/// Environment variable holding the project ref.
pub const PROJECT_REF_ENV: &str = "PROJECT_REF";

/// Link files the `supabase` CLI writes for a linked project.
const PROJECT_REF_FILES: &[&str] = &["supabase/.temp/project-ref", ".supabase/project-ref"];

/// Resolves the project ref: explicit value, `PROJECT_REF` env var, then
/// the local CLI link files.
///
/// # Errors
/// Returns a setup error if no source yields a non-empty ref.
pub fn resolve_project_ref(explicit: Option<&str>) -> Result<String> {
    if let Some(r) = explicit {
        return Ok(r.to_string());
    }
    if let Ok(r) = std::env::var(PROJECT_REF_ENV) {
        let r = r.trim().to_string();
        if !r.is_empty() {
            return Ok(r);
        }
    }
    for candidate in PROJECT_REF_FILES {
        if Path::new(candidate).exists() {
            if let Ok(contents) = std::fs::read_to_string(candidate) {
                let r = contents.trim().to_string();
                if !r.is_empty() {
                    debug!(path = candidate, "resolved project ref from link file");
                    return Ok(r);
                }
            }
        }
    }
    Err(SupabaseError::setup(
        "project ref not found; pass --project-ref or link the project with the supabase CLI",
    ))
}

/// Resolves the REST base URL: `SUPABASE_URL` override, else the standard
/// `https://{ref}.supabase.co/rest/v1` endpoint. An override that points at
/// the bare project host gets `/rest/v1` appended.
#[must_use]
pub fn resolve_base_url(project_ref: &str) -> String {
    match std::env::var(BASE_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => {
            let url = url.trim().trim_end_matches('/').to_string();
            if url.ends_with(".supabase.co") {
                format!("{url}/rest/v1")
            } else {
                url
            }
        }
        _ => format!("https://{project_ref}.supabase.co/rest/v1"),
    }
}

/// Resolves the service-role API key: explicit value, environment variable,
/// then the `supabase` CLI.
///
/// # Errors
/// Returns a setup error if no source yields a key, if the CLI is missing
/// or fails, or if its output cannot be parsed.
pub fn resolve_service_role_key(explicit: Option<&str>, project_ref: &str) -> Result<String> {
    if let Some(k) = explicit {
        return Ok(k.to_string());
    }
    if let Ok(k) = std::env::var(SERVICE_ROLE_KEY_ENV) {
        let k = k.trim().to_string();
        if !k.is_empty() {
            return Ok(k);
        }
    }
    service_role_key_via_cli(project_ref)
}

/// Fetches the service-role key by invoking the `supabase` CLI.
fn service_role_key_via_cli(project_ref: &str) -> Result<String> {
    debug!(project_ref, "looking up service_role key via supabase CLI");
    let output = Command::new("supabase")
        .args(["projects", "api-keys", "--project-ref", project_ref, "-o", "json"])
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SupabaseError::setup("supabase CLI not found on PATH")
            } else {
                SupabaseError::setup(format!("failed to run supabase CLI: {e}"))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let msg = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(SupabaseError::setup(format!(
            "supabase projects api-keys failed: {msg}"
        )));
    }

    let parsed: Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| SupabaseError::setup(format!("supabase CLI output is not JSON: {e}")))?;
    parse_service_role_key(&parsed)
}

/// Extracts the service_role api_key from the CLI's JSON output.
///
/// Accepted shapes: a direct array of key entries, or an object whose
/// `data` or `keys` member is that array. Entries are matched on `name`
/// (falling back to `type`) equal to `service_role`, case-insensitive.
pub fn parse_service_role_key(value: &Value) -> Result<String> {
    let entries = match value {
        Value::Array(list) => list.as_slice(),
        Value::Object(map) => map
            .get("data")
            .or_else(|| map.get("keys"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                SupabaseError::setup("unexpected supabase api-keys output shape")
            })?,
        _ => {
            return Err(SupabaseError::setup(
                "unexpected supabase api-keys output shape",
            ))
        }
    };

    for entry in entries {
        let name = entry
            .get("name")
            .or_else(|| entry.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("");
        if name.eq_ignore_ascii_case("service_role") {
            if let Some(key) = entry.get("api_key").and_then(Value::as_str) {
                if !key.is_empty() {
                    return Ok(key.to_string());
                }
            }
        }
    }

    Err(SupabaseError::setup(
        "no service_role entry in supabase api-keys output",
    ))
}
