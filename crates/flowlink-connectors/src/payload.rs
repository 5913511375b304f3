// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accessors for the loosely structured sync payloads callers send.

use serde_json::{Map, Value};

/// A string field, or `default` when absent, empty or not a string.
pub(crate) fn str_field<'a>(payload: &'a Value, key: &str, default: &'a str) -> &'a str {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
}

/// The nested `payload` object that most partners forward as-is.
pub(crate) fn nested(payload: &Value) -> Value {
    payload
        .get("payload")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}
