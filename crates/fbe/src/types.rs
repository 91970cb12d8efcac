//! Field type model.
//!
//! A closed set of tagged variants describes every type a schema field can
//! have. Field models dispatch on it instead of having one codec type per
//! type and wire format.

use std::fmt;
use std::sync::Arc;

use fbe_buffers::{Decimal, Uuid, PREFIX_SIZE};

use crate::schema::StructSchema;
use crate::value::Value;

/// Fixed-width scalar types. They encode identically in both wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Byte,
    /// 1-byte character.
    Char,
    /// 4-byte Unicode code point.
    WChar,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Uuid,
    Decimal,
    /// Nanoseconds since the Unix epoch.
    Timestamp,
}

impl Primitive {
    /// Encoded width in bytes.
    pub const fn width(self) -> usize {
        match self {
            Primitive::Bool | Primitive::Byte | Primitive::Char => 1,
            Primitive::Int8 | Primitive::UInt8 => 1,
            Primitive::Int16 | Primitive::UInt16 => 2,
            Primitive::WChar | Primitive::Int32 | Primitive::UInt32 | Primitive::Float => 4,
            Primitive::Int64 | Primitive::UInt64 | Primitive::Double | Primitive::Timestamp => 8,
            Primitive::Uuid | Primitive::Decimal => 16,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Primitive::Int8
                | Primitive::Int16
                | Primitive::Int32
                | Primitive::Int64
                | Primitive::Float
                | Primitive::Double
                | Primitive::Decimal
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::WChar => "wchar",
            Primitive::Int8 => "int8",
            Primitive::UInt8 => "uint8",
            Primitive::Int16 => "int16",
            Primitive::UInt16 => "uint16",
            Primitive::Int32 => "int32",
            Primitive::UInt32 => "uint32",
            Primitive::Int64 => "int64",
            Primitive::UInt64 => "uint64",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Uuid => "uuid",
            Primitive::Decimal => "decimal",
            Primitive::Timestamp => "timestamp",
        }
    }

    pub fn default_value(self) -> Value {
        match self {
            Primitive::Bool => Value::Bool(false),
            Primitive::Byte => Value::Byte(0),
            Primitive::Char => Value::Char(0),
            Primitive::WChar => Value::WChar('\0'),
            Primitive::Int8 => Value::I8(0),
            Primitive::UInt8 => Value::U8(0),
            Primitive::Int16 => Value::I16(0),
            Primitive::UInt16 => Value::U16(0),
            Primitive::Int32 => Value::I32(0),
            Primitive::UInt32 => Value::U32(0),
            Primitive::Int64 => Value::I64(0),
            Primitive::UInt64 => Value::U64(0),
            Primitive::Float => Value::F32(0.0),
            Primitive::Double => Value::F64(0.0),
            Primitive::Uuid => Value::Uuid(Uuid::nil()),
            Primitive::Decimal => Value::Decimal(Decimal::default()),
            Primitive::Timestamp => Value::Timestamp(0),
        }
    }
}

/// Length-prefixed payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    String,
    Bytes,
}

/// Count-prefixed sequences of one item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Vector,
    List,
    /// Deduplicated and written in ascending [`Value`] order.
    Set,
}

/// Count-prefixed key/value sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    /// Written in ascending key order with one entry per key.
    Ordered,
    /// Written in the order presented, without sorting.
    Hash,
}

/// The type of a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Primitive(Primitive),
    Variable(VariableKind),
    /// Exactly `N` items, no count prefix.
    Array(Box<FieldType>, usize),
    Collection(CollectionKind, Box<FieldType>),
    Map(MapKind, Box<FieldType>, Box<FieldType>),
    Optional(Box<FieldType>),
    Struct(Arc<StructSchema>),
}

impl FieldType {
    pub fn bool() -> Self {
        FieldType::Primitive(Primitive::Bool)
    }

    pub fn byte() -> Self {
        FieldType::Primitive(Primitive::Byte)
    }

    pub fn char() -> Self {
        FieldType::Primitive(Primitive::Char)
    }

    pub fn wchar() -> Self {
        FieldType::Primitive(Primitive::WChar)
    }

    pub fn i8() -> Self {
        FieldType::Primitive(Primitive::Int8)
    }

    pub fn u8() -> Self {
        FieldType::Primitive(Primitive::UInt8)
    }

    pub fn i16() -> Self {
        FieldType::Primitive(Primitive::Int16)
    }

    pub fn u16() -> Self {
        FieldType::Primitive(Primitive::UInt16)
    }

    pub fn i32() -> Self {
        FieldType::Primitive(Primitive::Int32)
    }

    pub fn u32() -> Self {
        FieldType::Primitive(Primitive::UInt32)
    }

    pub fn i64() -> Self {
        FieldType::Primitive(Primitive::Int64)
    }

    pub fn u64() -> Self {
        FieldType::Primitive(Primitive::UInt64)
    }

    pub fn f32() -> Self {
        FieldType::Primitive(Primitive::Float)
    }

    pub fn f64() -> Self {
        FieldType::Primitive(Primitive::Double)
    }

    pub fn uuid() -> Self {
        FieldType::Primitive(Primitive::Uuid)
    }

    pub fn decimal() -> Self {
        FieldType::Primitive(Primitive::Decimal)
    }

    pub fn timestamp() -> Self {
        FieldType::Primitive(Primitive::Timestamp)
    }

    pub fn string() -> Self {
        FieldType::Variable(VariableKind::String)
    }

    pub fn bytes() -> Self {
        FieldType::Variable(VariableKind::Bytes)
    }

    pub fn array(item: FieldType, len: usize) -> Self {
        FieldType::Array(Box::new(item), len)
    }

    pub fn vector(item: FieldType) -> Self {
        FieldType::Collection(CollectionKind::Vector, Box::new(item))
    }

    pub fn list(item: FieldType) -> Self {
        FieldType::Collection(CollectionKind::List, Box::new(item))
    }

    pub fn set(item: FieldType) -> Self {
        FieldType::Collection(CollectionKind::Set, Box::new(item))
    }

    pub fn map(key: FieldType, value: FieldType) -> Self {
        FieldType::Map(MapKind::Ordered, Box::new(key), Box::new(value))
    }

    pub fn hash(key: FieldType, value: FieldType) -> Self {
        FieldType::Map(MapKind::Hash, Box::new(key), Box::new(value))
    }

    pub fn optional(inner: FieldType) -> Self {
        FieldType::Optional(Box::new(inner))
    }

    pub fn structure(schema: Arc<StructSchema>) -> Self {
        FieldType::Struct(schema)
    }

    /// Bytes the field occupies at its own offset in the Standard format.
    pub fn head_size(&self) -> usize {
        match self {
            FieldType::Primitive(p) => p.width(),
            FieldType::Array(item, len) => item.head_size() * len,
            // presence flag + pointer
            FieldType::Optional(_) => 1 + PREFIX_SIZE,
            FieldType::Variable(_)
            | FieldType::Collection(..)
            | FieldType::Map(..)
            | FieldType::Struct(_) => PREFIX_SIZE,
        }
    }

    /// Smallest possible Final-format encoding, used to sanity-check counts
    /// before decoding.
    pub fn final_min_size(&self) -> usize {
        match self {
            FieldType::Primitive(p) => p.width(),
            FieldType::Array(item, len) => item.final_min_size() * len,
            FieldType::Optional(_) => 1,
            FieldType::Variable(_) | FieldType::Collection(..) | FieldType::Map(..) => PREFIX_SIZE,
            FieldType::Struct(schema) => schema
                .fields()
                .iter()
                .map(|field| field.ty.final_min_size())
                .sum(),
        }
    }

    /// Value a missing struct field is encoded as.
    pub fn default_value(&self) -> Value {
        match self {
            FieldType::Primitive(p) => p.default_value(),
            FieldType::Variable(VariableKind::String) => Value::String(String::new()),
            FieldType::Variable(VariableKind::Bytes) => Value::Bytes(Vec::new()),
            FieldType::Array(item, len) => Value::Seq(vec![item.default_value(); *len]),
            FieldType::Collection(..) => Value::Seq(Vec::new()),
            FieldType::Map(..) => Value::Map(Vec::new()),
            FieldType::Optional(_) => Value::Optional(None),
            FieldType::Struct(schema) => Value::Struct(schema.default_record()),
        }
    }

    /// Whether the Standard encoding is fully inline (no extra bytes).
    pub fn is_fixed(&self) -> bool {
        match self {
            FieldType::Primitive(_) => true,
            FieldType::Array(item, _) => item.is_fixed(),
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive(p) => f.write_str(p.name()),
            FieldType::Variable(VariableKind::String) => f.write_str("string"),
            FieldType::Variable(VariableKind::Bytes) => f.write_str("bytes"),
            FieldType::Array(item, len) => write!(f, "{item}[{len}]"),
            FieldType::Collection(CollectionKind::Vector, item) => write!(f, "{item}[]"),
            FieldType::Collection(CollectionKind::List, item) => write!(f, "{item}()"),
            FieldType::Collection(CollectionKind::Set, item) => write!(f, "{{{item}}}"),
            FieldType::Map(MapKind::Ordered, key, value) => write!(f, "<{key}, {value}>"),
            FieldType::Map(MapKind::Hash, key, value) => write!(f, "{{{key}: {value}}}"),
            FieldType::Optional(inner) => write!(f, "{inner}?"),
            FieldType::Struct(schema) => f.write_str(schema.name()),
        }
    }
}

impl From<Primitive> for FieldType {
    fn from(primitive: Primitive) -> Self {
        FieldType::Primitive(primitive)
    }
}

impl From<Arc<StructSchema>> for FieldType {
    fn from(schema: Arc<StructSchema>) -> Self {
        FieldType::Struct(schema)
    }
}
