//! Rich Text Projection
//!
//! Titles and cell values arrive as a nested-array union:
//! `[["plain"], ["bold", [["b"]]], ["‣", [["p", "<page id>"]]]]`.
//! This module parses that shape into [`TextSpan`]s and flattens spans to a
//! plain string. Formatting attributes are preserved but not interpreted.

use serde_json::Value;

/// One formatting attribute on a span, e.g. `["a", "https://..."]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextAttr {
    pub kind: String,
    pub args: Vec<Value>,
}

/// A run of text sharing the same attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub attrs: Vec<TextAttr>,
}

impl TextSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attrs: Vec::new(),
        }
    }
}

/// Error produced when a value does not have the rich-text shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed rich text: {0}")]
pub struct TextParseError(String);

/// Parse a rich-text value into spans.
///
/// `null` parses to no spans. A bare string is accepted as a single plain span,
/// which is how some older records store names.
pub fn parse_text_spans(value: &Value) -> Result<Vec<TextSpan>, TextParseError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![TextSpan::plain(s.clone())]),
        Value::Array(spans) => spans.iter().map(parse_span).collect(),
        other => Err(TextParseError(format!("expected array, got {}", other))),
    }
}

fn parse_span(value: &Value) -> Result<TextSpan, TextParseError> {
    let parts = value
        .as_array()
        .ok_or_else(|| TextParseError(format!("span is not an array: {}", value)))?;
    let text = parts
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| TextParseError(format!("span has no text: {}", value)))?
        .to_string();

    let mut attrs = Vec::new();
    if let Some(raw_attrs) = parts.get(1) {
        let raw_attrs = raw_attrs
            .as_array()
            .ok_or_else(|| TextParseError(format!("attributes are not an array: {}", raw_attrs)))?;
        for raw in raw_attrs {
            attrs.push(parse_attr(raw)?);
        }
    }

    Ok(TextSpan { text, attrs })
}

fn parse_attr(value: &Value) -> Result<TextAttr, TextParseError> {
    let parts = value
        .as_array()
        .ok_or_else(|| TextParseError(format!("attribute is not an array: {}", value)))?;
    let kind = parts
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| TextParseError(format!("attribute has no kind: {}", value)))?
        .to_string();
    Ok(TextAttr {
        kind,
        args: parts[1..].to_vec(),
    })
}

/// Concatenate span text, dropping attributes.
pub fn text_spans_to_string(spans: &[TextSpan]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

/// Parse and flatten in one step; malformed input yields an empty string.
pub fn plain_text(value: &Value) -> String {
    parse_text_spans(value)
        .map(|spans| text_spans_to_string(&spans))
        .unwrap_or_default()
}
