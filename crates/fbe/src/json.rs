//! JSON representation of values.
//!
//! UUIDs and decimals are strings, timestamps are integer nanoseconds, byte
//! blobs are standard base64, maps are arrays of `[key, value]` pairs and
//! absent optionals are `null`. Non-finite floats become `null` and do not
//! read back.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fbe_buffers::{parse_uuid, Decimal};
use serde_json::{Map, Number, Value as Json};

use crate::error::FbeError;
use crate::record::Record;
use crate::schema::StructSchema;
use crate::types::{FieldType, Primitive, VariableKind};
use crate::value::Value;

/// Converts a value to JSON: bytes as base64, uuids and decimals as strings,
/// maps as `[[key, value], ...]`.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Bool(b) => Json::Bool(*b),
        Value::Byte(v) | Value::Char(v) | Value::U8(v) => Json::from(*v),
        Value::WChar(c) => Json::String(c.to_string()),
        Value::I8(v) => Json::from(*v),
        Value::I16(v) => Json::from(*v),
        Value::U16(v) => Json::from(*v),
        Value::I32(v) => Json::from(*v),
        Value::U32(v) => Json::from(*v),
        Value::I64(v) => Json::from(*v),
        Value::U64(v) | Value::Timestamp(v) => Json::from(*v),
        Value::F32(v) => float(*v as f64),
        Value::F64(v) => float(*v),
        Value::Uuid(u) => Json::String(u.hyphenated().to_string()),
        Value::Decimal(d) => Json::String(d.to_string()),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::String(STANDARD.encode(b)),
        Value::Seq(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Map(entries) => Json::Array(
            entries
                .iter()
                .map(|(k, v)| Json::Array(vec![to_json(k), to_json(v)]))
                .collect(),
        ),
        Value::Optional(None) => Json::Null,
        Value::Optional(Some(v)) => to_json(v),
        Value::Struct(record) => record_to_json(record),
    }
}

fn float(v: f64) -> Json {
    Number::from_f64(v).map(Json::Number).unwrap_or(Json::Null)
}

/// Converts a record to a JSON object with members in field order.
pub fn record_to_json(record: &Record) -> Json {
    let object: Map<String, Json> = record
        .iter()
        .map(|(name, value)| (name.to_owned(), to_json(value)))
        .collect();
    Json::Object(object)
}

/// Reads `json` as a value of type `ty`.
///
/// ```
/// use fbe::json::{from_json, to_json};
/// use fbe::{FieldType, Value};
/// use serde_json::json;
///
/// let ty = FieldType::map(FieldType::string(), FieldType::optional(FieldType::i32()));
/// let value = from_json(&ty, &json!([["a", 1], ["b", null]])).unwrap();
/// assert_eq!(to_json(&value), json!([["a", 1], ["b", null]]));
/// ```
pub fn from_json(ty: &FieldType, json: &Json) -> Result<Value, FbeError> {
    let mismatch = || FbeError::mismatch(ty, json_kind(json));
    match ty {
        FieldType::Primitive(p) => primitive_from_json(*p, json).ok_or_else(mismatch),
        FieldType::Variable(VariableKind::String) => {
            json.as_str().map(Value::from).ok_or_else(mismatch)
        }
        FieldType::Variable(VariableKind::Bytes) => {
            let text = json.as_str().ok_or_else(mismatch)?;
            STANDARD
                .decode(text)
                .map(Value::Bytes)
                .map_err(|_| mismatch())
        }
        FieldType::Array(item, len) => {
            let items = json.as_array().ok_or_else(mismatch)?;
            if items.len() != *len {
                return Err(FbeError::SizeMismatch {
                    expected: *len,
                    actual: items.len(),
                });
            }
            seq_from_json(item, items)
        }
        FieldType::Collection(_, item) => seq_from_json(item, json.as_array().ok_or_else(mismatch)?),
        FieldType::Map(_, key, val) => {
            let pairs = json.as_array().ok_or_else(mismatch)?;
            pairs
                .iter()
                .map(|pair| match pair.as_array().map(Vec::as_slice) {
                    Some([k, v]) => Ok((from_json(key, k)?, from_json(val, v)?)),
                    _ => Err(FbeError::mismatch("[key, value] pair", json_kind(pair))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Map)
        }
        FieldType::Optional(_) if json.is_null() => Ok(Value::Optional(None)),
        FieldType::Optional(inner) => Ok(Value::Optional(Some(Box::new(from_json(inner, json)?)))),
        FieldType::Struct(schema) => record_from_json(schema, json).map(Value::Struct),
    }
}

/// Reads a JSON object as a record of `schema`. Missing members are left
/// out of the record and encode as defaults.
pub fn record_from_json(schema: &StructSchema, json: &Json) -> Result<Record, FbeError> {
    let object = json
        .as_object()
        .ok_or_else(|| FbeError::mismatch(schema.name(), json_kind(json)))?;
    let mut record = Record::new();
    for (name, member) in object {
        let field = schema
            .field(name)
            .ok_or_else(|| FbeError::UnknownField(name.clone()))?;
        record.set(name.clone(), from_json(&field.ty, member)?);
    }
    Ok(record)
}

fn seq_from_json(item: &FieldType, items: &[Json]) -> Result<Value, FbeError> {
    items
        .iter()
        .map(|v| from_json(item, v))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Seq)
}

fn primitive_from_json(primitive: Primitive, json: &Json) -> Option<Value> {
    let int = || json.as_i64();
    let uint = || json.as_u64();
    Some(match primitive {
        Primitive::Bool => Value::Bool(json.as_bool()?),
        Primitive::Byte => Value::Byte(u8::try_from(uint()?).ok()?),
        Primitive::Char => Value::Char(u8::try_from(uint()?).ok()?),
        Primitive::WChar => {
            let mut chars = json.as_str()?.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::WChar(c),
                _ => return None,
            }
        }
        Primitive::Int8 => Value::I8(i8::try_from(int()?).ok()?),
        Primitive::UInt8 => Value::U8(u8::try_from(uint()?).ok()?),
        Primitive::Int16 => Value::I16(i16::try_from(int()?).ok()?),
        Primitive::UInt16 => Value::U16(u16::try_from(uint()?).ok()?),
        Primitive::Int32 => Value::I32(i32::try_from(int()?).ok()?),
        Primitive::UInt32 => Value::U32(u32::try_from(uint()?).ok()?),
        Primitive::Int64 => Value::I64(int()?),
        Primitive::UInt64 => Value::U64(uint()?),
        Primitive::Float => Value::F32(json.as_f64()? as f32),
        Primitive::Double => Value::F64(json.as_f64()?),
        Primitive::Uuid => Value::Uuid(parse_uuid(json.as_str()?).ok()?),
        Primitive::Decimal => Value::Decimal(json.as_str()?.parse::<Decimal>().ok()?),
        Primitive::Timestamp => Value::Timestamp(uint()?),
    })
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbe_buffers::Uuid;
    use serde_json::json;

    #[test]
    fn test_special_types_are_strings() {
        let uuid = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        assert_eq!(
            to_json(&Value::Uuid(uuid)),
            json!("01234567-89ab-cdef-0123-456789abcdef")
        );
        let d: Decimal = "-1.50".parse().unwrap();
        assert_eq!(to_json(&Value::Decimal(d)), json!("-1.50"));
        assert_eq!(to_json(&Value::Timestamp(1_000)), json!(1000));
        assert_eq!(to_json(&Value::Bytes(vec![1, 2, 3])), json!("AQID"));
    }

    #[test]
    fn test_from_json_ranges() {
        assert_eq!(from_json(&FieldType::u8(), &json!(255)).unwrap(), Value::U8(255));
        assert!(matches!(
            from_json(&FieldType::u8(), &json!(256)),
            Err(FbeError::TypeMismatch { .. })
        ));
        assert!(from_json(&FieldType::i32(), &json!("1")).is_err());
        assert!(from_json(&FieldType::uuid(), &json!("not-a-uuid")).is_err());
    }

    #[test]
    fn test_array_length_checked() {
        assert_eq!(
            from_json(&FieldType::array(FieldType::i32(), 2), &json!([1])),
            Err(FbeError::SizeMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(to_json(&Value::F64(f64::NAN)), Json::Null);
    }
}
