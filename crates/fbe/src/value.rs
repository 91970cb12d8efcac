//! Dynamic values carried by field models.

use std::cmp::Ordering;

use fbe_buffers::{Decimal, Uuid};

use crate::error::FbeError;
use crate::types::{CollectionKind, FieldType, Primitive, VariableKind};
use crate::Record;

/// A decoded or to-be-encoded field value.
///
/// `Value` has a total order: variants are ordered by declaration, values of
/// the same variant by content, and floats by their IEEE 754 total order
/// (so `NaN` equals itself and `-0.0 < 0.0`). Set items and map keys are
/// sorted with it.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Char(u8),
    WChar(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Uuid(Uuid),
    Decimal(Decimal),
    /// Nanoseconds since the Unix epoch.
    Timestamp(u64),
    String(String),
    Bytes(Vec<u8>),
    /// Items of an array, vector, list or set.
    Seq(Vec<Value>),
    /// Entries of a map or hash.
    Map(Vec<(Value, Value)>),
    Optional(Option<Box<Value>>),
    Struct(Record),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Char(_) => "char",
            Value::WChar(_) => "wchar",
            Value::I8(_) => "int8",
            Value::U8(_) => "uint8",
            Value::I16(_) => "int16",
            Value::U16(_) => "uint16",
            Value::I32(_) => "int32",
            Value::U32(_) => "uint32",
            Value::I64(_) => "int64",
            Value::U64(_) => "uint64",
            Value::F32(_) => "float",
            Value::F64(_) => "double",
            Value::Uuid(_) => "uuid",
            Value::Decimal(_) => "decimal",
            Value::Timestamp(_) => "timestamp",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Optional(_) => "optional",
            Value::Struct(_) => "struct",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Byte(_) => 1,
            Value::Char(_) => 2,
            Value::WChar(_) => 3,
            Value::I8(_) => 4,
            Value::U8(_) => 5,
            Value::I16(_) => 6,
            Value::U16(_) => 7,
            Value::I32(_) => 8,
            Value::U32(_) => 9,
            Value::I64(_) => 10,
            Value::U64(_) => 11,
            Value::F32(_) => 12,
            Value::F64(_) => 13,
            Value::Uuid(_) => 14,
            Value::Decimal(_) => 15,
            Value::Timestamp(_) => 16,
            Value::String(_) => 17,
            Value::Bytes(_) => 18,
            Value::Seq(_) => 19,
            Value::Map(_) => 20,
            Value::Optional(_) => 21,
            Value::Struct(_) => 22,
        }
    }

    /// Checks that the value can be encoded as `ty`.
    ///
    /// Array lengths are checked too; records are checked field by field
    /// against the struct schema.
    pub fn type_check(&self, ty: &FieldType) -> Result<(), FbeError> {
        match (ty, self) {
            (FieldType::Primitive(p), value) => {
                if primitive_matches(*p, value) {
                    Ok(())
                } else {
                    Err(FbeError::mismatch(ty, value.type_name()))
                }
            }
            (FieldType::Variable(VariableKind::String), Value::String(_))
            | (FieldType::Variable(VariableKind::Bytes), Value::Bytes(_)) => Ok(()),
            (FieldType::Array(item, len), Value::Seq(items)) => {
                if items.len() != *len {
                    return Err(FbeError::SizeMismatch {
                        expected: *len,
                        actual: items.len(),
                    });
                }
                items.iter().try_for_each(|v| v.type_check(item))
            }
            (FieldType::Collection(_, item), Value::Seq(items)) => {
                items.iter().try_for_each(|v| v.type_check(item))
            }
            (FieldType::Map(_, key, value), Value::Map(entries)) => {
                entries.iter().try_for_each(|(k, v)| {
                    k.type_check(key)?;
                    v.type_check(value)
                })
            }
            (FieldType::Optional(_), Value::Optional(None)) => Ok(()),
            (FieldType::Optional(inner), Value::Optional(Some(v))) => v.type_check(inner),
            (FieldType::Struct(schema), Value::Struct(record)) => schema.check_record(record),
            (ty, value) => Err(FbeError::mismatch(ty, value.type_name())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Struct(record) => Some(record),
            _ => None,
        }
    }

    /// Inner value of an optional; `None` for absent optionals and for
    /// non-optional values.
    pub fn as_optional(&self) -> Option<&Value> {
        match self {
            Value::Optional(inner) => inner.as_deref(),
            _ => None,
        }
    }
}

fn primitive_matches(primitive: Primitive, value: &Value) -> bool {
    matches!(
        (primitive, value),
        (Primitive::Bool, Value::Bool(_))
            | (Primitive::Byte, Value::Byte(_))
            | (Primitive::Char, Value::Char(_))
            | (Primitive::WChar, Value::WChar(_))
            | (Primitive::Int8, Value::I8(_))
            | (Primitive::UInt8, Value::U8(_))
            | (Primitive::Int16, Value::I16(_))
            | (Primitive::UInt16, Value::U16(_))
            | (Primitive::Int32, Value::I32(_))
            | (Primitive::UInt32, Value::U32(_))
            | (Primitive::Int64, Value::I64(_))
            | (Primitive::UInt64, Value::U64(_))
            | (Primitive::Float, Value::F32(_))
            | (Primitive::Double, Value::F64(_))
            | (Primitive::Uuid, Value::Uuid(_))
            | (Primitive::Decimal, Value::Decimal(_))
            | (Primitive::Timestamp, Value::Timestamp(_))
    )
}

/// Items of a set in write order: ascending and without duplicates.
pub(crate) fn set_items(items: &[Value]) -> Vec<&Value> {
    let mut sorted: Vec<&Value> = items.iter().collect();
    sorted.sort();
    sorted.dedup();
    sorted
}

/// Entries of an ordered map in write order: ascending by key, the last
/// presented value winning for a repeated key.
pub(crate) fn map_entries(entries: &[(Value, Value)]) -> Vec<(&Value, &Value)> {
    let mut sorted: Vec<(&Value, &Value)> = entries.iter().map(|(k, v)| (k, v)).collect();
    // stable, so equal keys keep their presentation order
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let mut out: Vec<(&Value, &Value)> = Vec::with_capacity(sorted.len());
    for entry in sorted {
        match out.last_mut() {
            Some(last) if last.0 == entry.0 => *last = entry,
            _ => out.push(entry),
        }
    }
    out
}

/// Decoded items of a collection kind; sets are normalized on read too.
pub(crate) fn finish_collection(kind: CollectionKind, mut items: Vec<Value>) -> Value {
    if kind == CollectionKind::Set {
        items.sort();
        items.dedup();
    }
    Value::Seq(items)
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Byte(a), Value::Byte(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::WChar(a), Value::WChar(b)) => a.cmp(b),
            (Value::I8(a), Value::I8(b)) => a.cmp(b),
            (Value::U8(a), Value::U8(b)) => a.cmp(b),
            (Value::I16(a), Value::I16(b)) => a.cmp(b),
            (Value::U16(a), Value::U16(b)) => a.cmp(b),
            (Value::I32(a), Value::I32(b)) => a.cmp(b),
            (Value::U32(a), Value::U32(b)) => a.cmp(b),
            (Value::I64(a), Value::I64(b)) => a.cmp(b),
            (Value::U64(a), Value::U64(b)) => a.cmp(b),
            (Value::F32(a), Value::F32(b)) => a.total_cmp(b),
            (Value::F64(a), Value::F64(b)) => a.total_cmp(b),
            (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Seq(a), Value::Seq(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::Optional(a), Value::Optional(b)) => a.cmp(b),
            (Value::Struct(a), Value::Struct(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

macro_rules! scalar_value {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }

        impl TryFrom<Value> for $ty {
            type Error = FbeError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(FbeError::mismatch(
                        stringify!($variant),
                        other.type_name(),
                    )),
                }
            }
        }
    };
}

scalar_value!(Bool, bool);
scalar_value!(WChar, char);
scalar_value!(I8, i8);
scalar_value!(U8, u8);
scalar_value!(I16, i16);
scalar_value!(U16, u16);
scalar_value!(I32, i32);
scalar_value!(U32, u32);
scalar_value!(I64, i64);
scalar_value!(U64, u64);
scalar_value!(F32, f32);
scalar_value!(F64, f64);
scalar_value!(Uuid, Uuid);
scalar_value!(Decimal, Decimal);
scalar_value!(String, String);
scalar_value!(Bytes, Vec<u8>);
scalar_value!(Struct, Record);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        Value::Optional(value.map(|v| Box::new(v.into())))
    }
}
