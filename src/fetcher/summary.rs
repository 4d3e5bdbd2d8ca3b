//! Parsing of the `sacli VPNSummary` payload.

use serde_json::Value;

/// Extract the active client count from a VPNSummary JSON payload.
///
/// A missing `n_clients` field means an idle server, not an error, and maps
/// to zero. Some Access Server builds emit the count as a quoted string;
/// both forms are accepted.
pub fn parse_client_count(stdout: &str) -> Result<i64, serde_json::Error> {
    let summary: Value = serde_json::from_str(stdout)?;
    let clients = match summary.get("n_clients") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    };
    Ok(clients)
}
