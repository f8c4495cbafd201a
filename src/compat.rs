//! Compatibility shims for pre-migration backend payloads.
//!
//! Older backends answered `/users/me` without an `is_admin` field. Only the
//! admin gate consults this module, and only when that field is missing.
//! Everything else decides admin rights from the explicit flag.

#[cfg(test)]
#[path = "compat_test.rs"]
mod tests;

use serde_json::Value;

/// Guess admin rights from a legacy `/users/me` payload.
///
/// Admin when the username contains `admin` (any case) or the id is the
/// number 1. A string id of `"1"` does not count.
#[must_use]
pub fn legacy_admin_heuristic(payload: &Value) -> bool {
    let by_name = payload
        .get("username")
        .and_then(Value::as_str)
        .is_some_and(|name| name.to_lowercase().contains("admin"));
    let by_id = payload.get("id").and_then(Value::as_f64) == Some(1.0);
    by_name || by_id
}
