//! Conversion between plain JSON documents and Firestore typed values.
//!
//! Firestore REST bodies wrap every value in a single-key object such as
//! `{"stringValue": "x"}`. Integers travel as decimal strings.

use super::{Document, StoreError, StoreResult};
use serde_json::{json, Map, Number, Value};

/// Encodes a document into a Firestore `fields` map.
pub(crate) fn encode_fields(document: &Document) -> Map<String, Value> {
    document
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Decodes a Firestore `fields` map into a plain document.
pub(crate) fn decode_fields(fields: &Map<String, Value>) -> StoreResult<Document> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => json!({ "integerValue": integer.to_string() }),
            None => json!({ "doubleValue": number.as_f64() }),
        },
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn decode_value(value: &Value) -> StoreResult<Value> {
    let Some((kind, inner)) = value.as_object().and_then(|map| map.iter().next()) else {
        return Err(invalid(format!("expected typed value object, got {value}")));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| invalid(format!("booleanValue is not a bool: {inner}"))),
        "integerValue" => decode_integer(inner),
        "doubleValue" => decode_double(inner),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|text| Value::String(text.to_string()))
            .ok_or_else(|| invalid(format!("{kind} is not a string: {inner}"))),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let items = match inner.get("values") {
                Some(Value::Array(items)) => items.as_slice(),
                Some(other) => return Err(invalid(format!("arrayValue.values is not a list: {other}"))),
                None => &[],
            };
            items
                .iter()
                .map(decode_value)
                .collect::<StoreResult<Vec<_>>>()
                .map(Value::Array)
        }
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => decode_fields(fields).map(Value::Object),
            Some(other) => Err(invalid(format!("mapValue.fields is not an object: {other}"))),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(invalid(format!("unsupported Firestore value type `{other}`"))),
    }
}

fn decode_integer(inner: &Value) -> StoreResult<Value> {
    let parsed = match inner {
        Value::String(text) => text.parse::<i64>().ok(),
        Value::Number(number) => number.as_i64(),
        _ => None,
    };
    parsed
        .map(|integer| Value::Number(integer.into()))
        .ok_or_else(|| invalid(format!("integerValue is not an integer: {inner}")))
}

fn decode_double(inner: &Value) -> StoreResult<Value> {
    inner
        .as_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| invalid(format!("doubleValue is not a finite number: {inner}")))
}

fn invalid(message: String) -> StoreError {
    StoreError::InvalidData(message)
}

#[cfg(test)]
mod tests {
    use super::{decode_fields, encode_fields};
    use serde_json::json;

    #[test]
    fn event_document_survives_firestore_encoding() {
        let document = json!({
            "title": "Meetup",
            "tag": ["social", "social"],
            "capacity": 40,
            "rating": 4.5,
            "published": true,
            "extra": { "note": null }
        });
        let document = document.as_object().cloned().unwrap();

        let encoded = encode_fields(&document);
        assert_eq!(encoded["title"], json!({ "stringValue": "Meetup" }));
        assert_eq!(encoded["capacity"], json!({ "integerValue": "40" }));

        let decoded = decode_fields(&encoded).unwrap();
        assert_eq!(decoded, document);
    }

    #[test]
    fn empty_array_value_without_values_decodes_to_empty_list() {
        let fields = json!({ "tag": { "arrayValue": {} } });
        let decoded = decode_fields(fields.as_object().unwrap()).unwrap();
        assert_eq!(decoded["tag"], json!([]));
    }

    #[test]
    fn timestamp_values_decode_as_strings() {
        let fields = json!({ "seen": { "timestampValue": "2024-06-01T18:00:00Z" } });
        let decoded = decode_fields(fields.as_object().unwrap()).unwrap();
        assert_eq!(decoded["seen"], "2024-06-01T18:00:00Z");
    }

    #[test]
    fn unknown_value_type_is_rejected() {
        let fields = json!({ "x": { "mysteryValue": 1 } });
        assert!(decode_fields(fields.as_object().unwrap()).is_err());
    }
}
