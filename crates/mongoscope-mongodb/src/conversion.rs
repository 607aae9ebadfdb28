//! BSON → JSON conversion for HTTP responses
//!
//! Documents are forwarded without a schema. Values are rendered the way a
//! Node.js client would see them: ObjectIds as hex strings, dates as ISO-8601
//! strings, numbers as plain JSON numbers. Types with no natural JSON shape
//! fall back to relaxed Extended JSON.

use bson::{Bson, Document as BsonDocument};
use serde_json::{json, Map, Number, Value as JsonValue};

use crate::timestamp::to_iso_string;

/// Convert a whole document, preserving field order
pub fn document_to_json(doc: &BsonDocument) -> JsonValue {
    let fields: Map<String, JsonValue> = doc
        .iter()
        .map(|(k, v)| (k.clone(), bson_to_json(v)))
        .collect();
    JsonValue::Object(fields)
}

/// Convert a single BSON value
pub fn bson_to_json(value: &Bson) -> JsonValue {
    match value {
        Bson::Null | Bson::Undefined => JsonValue::Null,
        Bson::Boolean(b) => JsonValue::Bool(*b),
        Bson::Int32(i) => JsonValue::from(*i),
        Bson::Int64(i) => JsonValue::from(*i),
        // Non-finite doubles have no JSON form; JSON.stringify emits null too
        Bson::Double(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Bson::String(s) => JsonValue::String(s.clone()),
        Bson::Symbol(s) => JsonValue::String(s.clone()),
        Bson::ObjectId(oid) => JsonValue::String(oid.to_hex()),
        Bson::DateTime(dt) => JsonValue::String(to_iso_string(*dt)),
        Bson::Decimal128(d) => json!({ "$numberDecimal": d.to_string() }),
        Bson::Timestamp(ts) => json!({ "$timestamp": { "t": ts.time, "i": ts.increment } }),
        Bson::Array(arr) => JsonValue::Array(arr.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => document_to_json(doc),
        other => other.clone().into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId, spec::BinarySubtype, Binary, DateTime, Timestamp};

    #[test]
    fn test_scalar_values() {
        assert_eq!(bson_to_json(&Bson::Int32(90)), json!(90));
        assert_eq!(bson_to_json(&Bson::Int64(1 << 40)), json!(1_i64 << 40));
        assert_eq!(bson_to_json(&Bson::Double(99.5)), json!(99.5));
        assert_eq!(bson_to_json(&Bson::Boolean(true)), json!(true));
        assert_eq!(bson_to_json(&Bson::Null), JsonValue::Null);
        assert_eq!(bson_to_json(&Bson::String("p99".into())), json!("p99"));
    }

    #[test]
    fn test_non_finite_double_becomes_null() {
        assert_eq!(bson_to_json(&Bson::Double(f64::NAN)), JsonValue::Null);
        assert_eq!(bson_to_json(&Bson::Double(f64::INFINITY)), JsonValue::Null);
    }

    #[test]
    fn test_object_id_and_date() {
        let oid = ObjectId::parse_str("650000000000000000000001").unwrap();
        let dt = DateTime::from_millis(1_700_000_000_000);
        let converted = document_to_json(&doc! { "_id": oid, "at": dt });
        assert_eq!(
            converted,
            json!({ "_id": "650000000000000000000001", "at": "2023-11-14T22:13:20.000Z" })
        );
    }

    #[test]
    fn test_nested_structures_keep_order() {
        let source = doc! {
            "z": 1,
            "a": { "inner": [1, "two", { "three": 3.0 }] },
        };
        let converted = document_to_json(&source);
        let keys: Vec<&String> = converted.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(converted["a"]["inner"][2]["three"], json!(3.0));
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = Timestamp { time: 5, increment: 2 };
        assert_eq!(
            bson_to_json(&Bson::Timestamp(ts)),
            json!({ "$timestamp": { "t": 5, "i": 2 } })
        );
    }

    #[test]
    fn test_binary_falls_back_to_extended_json() {
        let bin = Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: vec![1, 2, 3],
        });
        let converted = bson_to_json(&bin);
        assert!(converted.get("$binary").is_some());
    }
}
