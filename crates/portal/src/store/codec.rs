//! Firestore typed-value codec.
//!
//! The REST API wraps every value in a single-key object naming its type
//! (`{"stringValue": "..."}`, `{"integerValue": "42"}`, ...). Integers travel
//! as decimal strings. Timestamps, references and bytes decode to their
//! string form; geo points decode to `{latitude, longitude}`.

use serde_json::{Map, Number, Value, json};

use super::{Document, StoreError};

/// Encode a document into Firestore `fields`.
#[must_use]
pub fn encode_fields(document: &Document) -> Map<String, Value> {
    document
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

/// Encode one JSON value as a Firestore typed value.
#[must_use]
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Decode Firestore `fields` into a document.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] if any field is not a recognised typed value.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Document, StoreError> {
    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), decode_value(value)?)))
        .collect()
}

/// Decode one Firestore typed value.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] for unknown or malformed typed values.
pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Some((kind, inner)) = value.as_object().and_then(|map| map.iter().next()) else {
        return Err(StoreError::Decode(format!("expected typed value, got {value}")));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| malformed(kind, inner)),
        "integerValue" => decode_integer(inner).ok_or_else(|| malformed(kind, inner)),
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| malformed(kind, inner)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| malformed(kind, inner)),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            // An empty array comes back as `{"arrayValue": {}}`.
            let values = inner.get("values").and_then(Value::as_array);
            values
                .map_or_else(|| Ok(Vec::new()), |items| items.iter().map(decode_value).collect())
                .map(Value::Array)
        }
        "mapValue" => {
            let fields = inner.get("fields").and_then(Value::as_object);
            fields
                .map_or_else(|| Ok(Document::new()), decode_fields)
                .map(Value::Object)
        }
        other => Err(StoreError::Decode(format!("unsupported value type `{other}`"))),
    }
}

fn decode_integer(inner: &Value) -> Option<Value> {
    match inner {
        Value::String(s) => s.parse::<i64>().ok().map(Value::from),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(Value::Number(n.clone())),
        _ => None,
    }
}

fn malformed(kind: &str, inner: &Value) -> StoreError {
    StoreError::Decode(format!("malformed `{kind}`: {inner}"))
}
