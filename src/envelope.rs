//! Helpers for the `{success, data, timestamp}` response envelope.

use serde_json::Value;

/// Unwrap the envelope: an object with a `data` key yields that value,
/// anything else is returned unchanged.
pub fn extract_data(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Parse a raw body and unwrap it. Bodies that are not JSON yield `None`.
pub fn extract_data_from_text(body: &str) -> Option<Value> {
    serde_json::from_str::<Value>(body).ok().map(extract_data)
}

/// `id` of an unwrapped object, rendered as a string.
pub fn extract_id(data: &Value) -> Option<String> {
    string_field(data, "id")
}

/// A string or numeric field of an object. Empty strings count as missing.
pub fn string_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// An `{id, name}` row from the games or issue-types listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntity {
    pub id: String,
    pub name: Option<String>,
}

impl NamedEntity {
    pub fn new(id: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.map(str::to_string),
        }
    }
}

/// Rows of an unwrapped list. Entries without an id are skipped; a
/// non-list payload is an empty listing.
pub fn named_entities(data: &Value) -> Vec<NamedEntity> {
    data.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(NamedEntity {
                        id: extract_id(item)?,
                        name: item.get("name").and_then(Value::as_str).map(str::to_string),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
