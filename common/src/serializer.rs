//! Transport encoding of query documents.
//!
//! Free-text query strings are escaped for the search engine's query parser,
//! not for JSON: `( ) { } [ ] ^ : /` inside any value stored under a key
//! literally named `query` get a preceding backslash. JSON string escaping is
//! applied on top as usual.

use serde_json::Value;

use crate::error::{FacetviewError, Result};
use crate::query_document::QueryDocument;

pub const QUERY_SYNTAX_CHARS: [char; 9] = ['(', ')', '{', '}', '[', ']', '^', ':', '/'];

const QUERY_KEY: &str = "query";

pub fn serialize(doc: &QueryDocument) -> Result<String> {
    let mut value = serde_json::to_value(doc)?;
    visit_query_strings(&mut value, None, &escape_query_syntax);
    Ok(serde_json::to_string(&value)?)
}

/// Inverse of [`serialize`]: JSON-decode and drop the query syntax escapes again.
pub fn deserialize(source: &str) -> Result<QueryDocument> {
    deserialize_value(serde_json::from_str(source)?)
}

/// [`deserialize`] for a document that was already JSON-decoded.
pub fn deserialize_value(mut value: Value) -> Result<QueryDocument> {
    visit_query_strings(&mut value, None, &unescape_query_syntax);
    serde_json::from_value(value).map_err(|e| FacetviewError::MalformedSource(e.to_string()))
}

/// Apply `rewrite` to every string that sits directly under a `query` key.
fn visit_query_strings(value: &mut Value, key: Option<&str>, rewrite: &dyn Fn(&str) -> String) {
    match value {
        Value::String(s) if key == Some(QUERY_KEY) => *s = rewrite(s),
        Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                visit_query_strings(v, Some(k.as_str()), rewrite);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                visit_query_strings(item, None, rewrite);
            }
        }
        _ => {}
    }
}

pub fn escape_query_syntax(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if QUERY_SYNTAX_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn unescape_query_syntax(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.peek().copied() {
                if QUERY_SYNTAX_CHARS.contains(&next) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}
