//! Statement logging.
//!
//! Statements are logged at `debug` on the `dbx.sql` target, only while the
//! process-wide debug mode is on. Failures are always logged at `error` on the
//! `dbx` target.

use crate::error::DbxError;
use crate::value::Value;
use std::sync::atomic::{AtomicBool, Ordering};

/// String parameters longer than this are truncated in logs.
pub const MAX_LOGGED_PARAM_CHARS: usize = 64;

static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

/// Turn statement logging on or off for the whole process.
pub fn set_debug_mode(enabled: bool) {
    DEBUG_MODE.store(enabled, Ordering::Relaxed);
}

pub fn debug_mode() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

/// Parameters as they appear in logs.
pub fn redact_params(params: &[Value]) -> Vec<Value> {
    params
        .iter()
        .map(|v| v.redacted(MAX_LOGGED_PARAM_CHARS))
        .collect()
}

pub(crate) fn log_statement(sql: &str, params: &[Value]) {
    if !debug_mode() {
        return;
    }
    let params = serde_json::to_string(&redact_params(params)).unwrap_or_default();
    tracing::debug!(target: "dbx.sql", sql = %sql, params = %params, "executing statement");
}

pub(crate) fn log_failure(sql: &str, err: &DbxError) {
    tracing::error!(target: "dbx", sql = %sql, error = %err, "statement failed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_only_touches_long_strings() {
        let params = vec![
            Value::Int(1),
            Value::Str("é".repeat(80)),
            Value::Str("ok".into()),
        ];
        let redacted = redact_params(&params);
        assert_eq!(redacted[0], Value::Int(1));
        let Value::Str(long) = &redacted[1] else {
            panic!("expected string");
        };
        assert_eq!(long.chars().count(), MAX_LOGGED_PARAM_CHARS + 3);
        assert_eq!(redacted[2], Value::Str("ok".into()));
    }

    #[test]
    fn debug_mode_toggles() {
        set_debug_mode(true);
        assert!(debug_mode());
        set_debug_mode(false);
        assert!(!debug_mode());
    }
}
