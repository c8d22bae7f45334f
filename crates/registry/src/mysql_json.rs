// Rust guideline compliant 2026-10-18

//! Rendering of JSON payload fragments as MySQL expressions.

use serde_json::{Map, Value};

/// Restore value used when the stored `StreamMessage` cannot be recovered.
pub const DEFAULT_ROLLBACK_STREAM_MESSAGE: &str = "JSON_OBJECT('TxID', '', 'Status', 'SUCCESS', \
     'ErrorCode', '', 'ExternalID', '', 'ReferenceID', '', 'ErrorMessage', '', 'ValueTimestamp', '')";

/// `StreamMessage` to restore when reverting a manual rejection.
///
/// Reads the object stored under `StreamMessage` in the workflow `data`,
/// undoes the rejection markers (`Status` FAILED, `ErrorCode`
/// ADAPTER_ERROR, `ErrorMessage` "Manual Rejected") and renders it as a
/// `JSON_OBJECT(...)` expression. Falls back to
/// [`DEFAULT_ROLLBACK_STREAM_MESSAGE`].
#[must_use]
pub fn rollback_stream_message(data: &str) -> String {
    let Ok(Value::Object(mut root)) = serde_json::from_str::<Value>(data) else {
        return DEFAULT_ROLLBACK_STREAM_MESSAGE.to_owned();
    };
    let Some(Value::Object(mut message)) = root.remove("StreamMessage") else {
        return DEFAULT_ROLLBACK_STREAM_MESSAGE.to_owned();
    };

    for (key, rejected, restored) in [
        ("Status", "FAILED", "SUCCESS"),
        ("ErrorCode", "ADAPTER_ERROR", ""),
        ("ErrorMessage", "Manual Rejected", ""),
    ] {
        if let Some(value) = message.get_mut(key)
            && value.as_str() == Some(rejected)
        {
            *value = Value::String(restored.to_owned());
        }
    }
    object_expr(&message)
}

/// `JSON_OBJECT(...)` for `map`, keys in sorted order.
#[must_use]
pub fn object_expr(map: &Map<String, Value>) -> String {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let parts: Vec<String> = entries
        .into_iter()
        .map(|(k, v)| format!("{}, {}", string_literal(k), value_expr(v)))
        .collect();
    format!("JSON_OBJECT({})", parts.join(", "))
}

fn value_expr(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_owned(),
        Value::Bool(true) => "TRUE".to_owned(),
        Value::Bool(false) => "FALSE".to_owned(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => string_literal(s),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(value_expr).collect();
            format!("JSON_ARRAY({})", parts.join(", "))
        }
        Value::Object(map) => object_expr(map),
    }
}

/// MySQL single-quoted literal with backslash escapes.
#[must_use]
pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}
