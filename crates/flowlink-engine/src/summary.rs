// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exchange log summaries.
//!
//! Each log entry stores a small JSON document describing the exchange,
//! serialized and cut to a byte budget. The cut never splits a UTF-8
//! character, so the stored text is always valid (if possibly incomplete)
//! JSON text.

use flowlink_core::ExchangeContext;
use serde_json::{Map, Value};

/// Which connector operation an exchange ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeAction {
    Sync,
    /// A `ping`, recorded as `"test"`.
    Test,
}

impl ExchangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeAction::Sync => "sync",
            ExchangeAction::Test => "test",
        }
    }
}

/// How the exchange ended, as recorded in the summary.
#[derive(Debug, Clone, Copy)]
pub enum SummaryOutcome<'a> {
    Response(&'a Value),
    Error(&'a str),
}

/// Builds `{"action", "payload"?, "context", "response" | "error"}`.
pub fn build_summary(
    action: ExchangeAction,
    payload: Option<&Value>,
    context: ExchangeContext,
    outcome: SummaryOutcome<'_>,
) -> Value {
    let mut doc = Map::new();
    doc.insert("action".into(), Value::String(action.as_str().into()));
    if let Some(payload) = payload {
        doc.insert("payload".into(), payload.clone());
    }
    doc.insert("context".into(), Value::String(context.to_string()));
    match outcome {
        SummaryOutcome::Response(body) => doc.insert("response".into(), body.clone()),
        SummaryOutcome::Error(message) => doc.insert("error".into(), Value::String(message.into())),
    };
    Value::Object(doc)
}

/// Longest prefix of `text` that fits in `budget` bytes and ends on a
/// character boundary.
pub fn truncate_to_budget(text: &str, budget: usize) -> &str {
    if text.len() <= budget {
        return text;
    }
    let mut end = budget;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Serializes a summary and cuts it to `budget` bytes.
pub fn render_summary(summary: &Value, budget: usize) -> String {
    let text = summary.to_string();
    truncate_to_budget(&text, budget).to_string()
}
