//! Encoding of the active term list in the storage slot.
//!
//! Current writers store a JSON array of strings. Readers also accept what
//! older releases left behind:
//!
//! | Stored value            | Decoded terms        |
//! |-------------------------|----------------------|
//! | `["a/b","c/*"]`         | `a/b`, `c/*`         |
//! | `"a/b"` (JSON string)   | `a/b`                |
//! | `a/b` (plain text)      | `a/b`                |
//! | `2024`, `true`          | `2024`, `true`       |
//! | absent / empty          | none                 |
//! | `{not json`, `{}`       | none (malformed)     |

use serde_json::Value;

use crate::error::FilterError;
use crate::filter::active::ActiveFilterSet;

/// Serialize the active set for the storage slot.
pub fn encode_terms(terms: &ActiveFilterSet) -> String {
    serde_json::to_string(terms.terms()).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a raw slot value into trimmed, non-empty terms in stored order.
///
/// Duplicates are not removed here; [`ActiveFilterSet::from_terms`] does that.
pub fn decode_terms(raw: Option<&str>) -> Result<Vec<String>, FilterError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(term) => Some(term),
                _ => None,
            })
            .filter_map(clean_term)
            .collect()),
        Ok(Value::String(term)) => Ok(clean_term(term).into_iter().collect()),
        Ok(Value::Null) => Ok(Vec::new()),
        // Bare text written by the first release can look like a JSON scalar.
        Ok(Value::Number(_) | Value::Bool(_)) => Ok(vec![raw.to_string()]),
        Ok(other) => Err(FilterError::MalformedPersistedState(format!(
            "unexpected {} value",
            json_kind(&other)
        ))),
        Err(_) if looks_like_json(raw) => Err(FilterError::MalformedPersistedState(format!(
            "unparseable value {raw:?}"
        ))),
        // First release stored the selected repository as bare text.
        Err(_) => Ok(clean_term(raw.to_string()).into_iter().collect()),
    }
}

fn clean_term(term: String) -> Option<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == term.len() {
        Some(term)
    } else {
        Some(trimmed.to_string())
    }
}

fn looks_like_json(raw: &str) -> bool {
    matches!(raw.as_bytes().first(), Some(b'{' | b'[' | b'"'))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
