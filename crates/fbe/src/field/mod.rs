//! Field models for both wire formats.
//!
//! A field model is a borrowed view of `(buffer, field type, offset)`. The
//! Standard family keeps a fixed-width head at the offset and appends
//! variable payloads at the buffer tail behind 4-byte pointers; the Final
//! family writes everything inline. Both dispatch on [`FieldType`].
//!
//! Sizes are value-driven: [`standard_extra`] and [`final_size`] compute the
//! exact number of bytes a value will occupy before anything is written.

mod final_format;
mod standard;

use std::borrow::Cow;

use fbe_buffers::{ReadBuffer, WriteBuffer, PREFIX_SIZE};

use crate::error::FbeError;
use crate::record::Record;
use crate::schema::StructSchema;
use crate::types::{CollectionKind, FieldType, MapKind, Primitive, VariableKind};
use crate::value::{map_entries, set_items, Value};

pub use final_format::{FinalFieldModel, FinalFieldModelMut};
pub use standard::{FieldModel, FieldModelMut};

pub(crate) use final_format::{measure_struct, read_final_struct, write_final_struct};
pub(crate) use standard::{read_struct, verify_struct, write_struct};

/// Bytes a value occupies outside its Standard head.
///
/// ```
/// use fbe::{standard_extra, FieldType, Value};
///
/// let ty = FieldType::vector(FieldType::i32());
/// let value = Value::Seq(vec![Value::I32(10), Value::I32(20), Value::I32(30)]);
/// assert_eq!(standard_extra(&ty, &value).unwrap(), 16);
/// ```
pub fn standard_extra(ty: &FieldType, value: &Value) -> Result<usize, FbeError> {
    match (ty, value) {
        (FieldType::Primitive(_), _) => {
            value.type_check(ty)?;
            Ok(0)
        }
        (FieldType::Variable(kind), value) => Ok(PREFIX_SIZE + variable_bytes(*kind, value)?.len()),
        (FieldType::Array(item, len), Value::Seq(items)) => {
            check_array_len(*len, items)?;
            items.iter().map(|v| standard_extra(item, v)).sum()
        }
        (FieldType::Collection(kind, item), Value::Seq(items)) => {
            let items = collection_items(*kind, items);
            check_item_width(item.head_size(), items.len())?;
            let extras = items
                .iter()
                .map(|v| standard_extra(item, v))
                .sum::<Result<usize, _>>()?;
            Ok(PREFIX_SIZE + items.len() * item.head_size() + extras)
        }
        (FieldType::Map(kind, key, val), Value::Map(entries)) => {
            let entries = map_items(*kind, entries);
            let head = key.head_size() + val.head_size();
            check_item_width(head, entries.len())?;
            let mut extras = 0;
            for (k, v) in &entries {
                extras += standard_extra(key, k)? + standard_extra(val, v)?;
            }
            Ok(PREFIX_SIZE + entries.len() * head + extras)
        }
        (FieldType::Optional(_), Value::Optional(None)) => Ok(0),
        (FieldType::Optional(inner), Value::Optional(Some(v))) => {
            Ok(inner.head_size() + standard_extra(inner, v)?)
        }
        (FieldType::Struct(schema), Value::Struct(record)) => {
            standard_struct_size(schema, &struct_values(schema, record)?)
        }
        (ty, value) => Err(FbeError::mismatch(ty, value.type_name())),
    }
}

/// Bytes a value occupies in the Final format.
pub fn final_size(ty: &FieldType, value: &Value) -> Result<usize, FbeError> {
    match (ty, value) {
        (FieldType::Primitive(p), _) => {
            value.type_check(ty)?;
            Ok(p.width())
        }
        (FieldType::Variable(kind), value) => Ok(PREFIX_SIZE + variable_bytes(*kind, value)?.len()),
        (FieldType::Array(item, len), Value::Seq(items)) => {
            check_array_len(*len, items)?;
            items.iter().map(|v| final_size(item, v)).sum()
        }
        (FieldType::Collection(kind, item), Value::Seq(items)) => {
            let items = collection_items(*kind, items);
            check_item_width(item.final_min_size(), items.len())?;
            let body = items
                .into_iter()
                .map(|v| final_size(item, v))
                .sum::<Result<usize, _>>()?;
            Ok(PREFIX_SIZE + body)
        }
        (FieldType::Map(kind, key, val), Value::Map(entries)) => {
            let entries = map_items(*kind, entries);
            check_item_width(key.final_min_size() + val.final_min_size(), entries.len())?;
            let mut body = 0;
            for (k, v) in entries {
                body += final_size(key, k)? + final_size(val, v)?;
            }
            Ok(PREFIX_SIZE + body)
        }
        (FieldType::Optional(_), Value::Optional(None)) => Ok(1),
        (FieldType::Optional(inner), Value::Optional(Some(v))) => Ok(1 + final_size(inner, v)?),
        (FieldType::Struct(schema), Value::Struct(record)) => {
            final_struct_size(schema, &struct_values(schema, record)?)
        }
        (ty, value) => Err(FbeError::mismatch(ty, value.type_name())),
    }
}

/// Values of every schema field in wire order, defaults filled in.
pub(crate) fn struct_values<'r>(
    schema: &StructSchema,
    record: &'r Record,
) -> Result<Vec<Cow<'r, Value>>, FbeError> {
    if let Some(unknown) = record.names().find(|name| schema.field(name).is_none()) {
        return Err(FbeError::UnknownField(unknown.to_owned()));
    }
    Ok(schema
        .fields()
        .iter()
        .map(|field| match record.get(&field.name) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(field.ty.default_value()),
        })
        .collect())
}

/// Header, heads and tail of a Standard struct block.
pub(crate) fn standard_struct_size(
    schema: &StructSchema,
    values: &[Cow<'_, Value>],
) -> Result<usize, FbeError> {
    let mut size = PREFIX_SIZE + schema.head_size();
    for (field, value) in schema.fields().iter().zip(values) {
        size += standard_extra(&field.ty, value)?;
    }
    Ok(size)
}

pub(crate) fn final_struct_size(
    schema: &StructSchema,
    values: &[Cow<'_, Value>],
) -> Result<usize, FbeError> {
    schema
        .fields()
        .iter()
        .zip(values)
        .map(|(field, value)| final_size(&field.ty, value))
        .sum()
}

fn check_array_len(expected: usize, items: &[Value]) -> Result<(), FbeError> {
    if items.len() != expected {
        return Err(FbeError::SizeMismatch {
            expected,
            actual: items.len(),
        });
    }
    Ok(())
}

/// Non-empty collections need items at least one byte wide on the wire;
/// [`read_count`] bounds counts by the bytes that follow.
fn check_item_width(width: usize, count: usize) -> Result<(), FbeError> {
    if width == 0 && count > 0 {
        return Err(FbeError::SizeMismatch {
            expected: 0,
            actual: count,
        });
    }
    Ok(())
}

fn variable_bytes(kind: VariableKind, value: &Value) -> Result<&[u8], FbeError> {
    match (kind, value) {
        (VariableKind::String, Value::String(s)) => Ok(s.as_bytes()),
        (VariableKind::Bytes, Value::Bytes(b)) => Ok(b),
        (kind, value) => Err(FbeError::mismatch(
            FieldType::Variable(kind),
            value.type_name(),
        )),
    }
}

/// Items in write order.
fn collection_items(kind: CollectionKind, items: &[Value]) -> Vec<&Value> {
    match kind {
        CollectionKind::Set => set_items(items),
        CollectionKind::Vector | CollectionKind::List => items.iter().collect(),
    }
}

/// Entries in write order.
fn map_items(kind: MapKind, entries: &[(Value, Value)]) -> Vec<(&Value, &Value)> {
    match kind {
        MapKind::Ordered => map_entries(entries),
        MapKind::Hash => entries.iter().map(|(k, v)| (k, v)).collect(),
    }
}

/// Reads a count prefix and checks that `count` items of at least
/// `item_min` bytes fit after it. Zero-width items are counted as one byte
/// each, so a count never exceeds the bytes left in the buffer.
fn read_count(buffer: &ReadBuffer<'_>, offset: usize, item_min: usize) -> Result<usize, FbeError> {
    let count = buffer.read_u32(offset)? as usize;
    let available = buffer.remaining(offset + PREFIX_SIZE);
    match count.checked_mul(item_min.max(1)) {
        Some(needed) if needed <= available => Ok(count),
        _ => Err(fbe_buffers::BufferError::InvalidLength {
            length: count,
            available,
        }
        .into()),
    }
}

fn read_primitive(
    buffer: &ReadBuffer<'_>,
    primitive: Primitive,
    offset: usize,
) -> Result<Value, FbeError> {
    Ok(match primitive {
        Primitive::Bool => Value::Bool(buffer.read_bool(offset)?),
        Primitive::Byte => Value::Byte(buffer.read_u8(offset)?),
        Primitive::Char => Value::Char(buffer.read_char(offset)?),
        Primitive::WChar => Value::WChar(buffer.read_wchar(offset)?),
        Primitive::Int8 => Value::I8(buffer.read_i8(offset)?),
        Primitive::UInt8 => Value::U8(buffer.read_u8(offset)?),
        Primitive::Int16 => Value::I16(buffer.read_i16(offset)?),
        Primitive::UInt16 => Value::U16(buffer.read_u16(offset)?),
        Primitive::Int32 => Value::I32(buffer.read_i32(offset)?),
        Primitive::UInt32 => Value::U32(buffer.read_u32(offset)?),
        Primitive::Int64 => Value::I64(buffer.read_i64(offset)?),
        Primitive::UInt64 => Value::U64(buffer.read_u64(offset)?),
        Primitive::Float => Value::F32(buffer.read_f32(offset)?),
        Primitive::Double => Value::F64(buffer.read_f64(offset)?),
        Primitive::Uuid => Value::Uuid(buffer.read_uuid(offset)?),
        Primitive::Decimal => Value::Decimal(buffer.read_decimal(offset)?),
        Primitive::Timestamp => Value::Timestamp(buffer.read_timestamp(offset)?),
    })
}

fn write_primitive(
    buffer: &mut WriteBuffer,
    primitive: Primitive,
    offset: usize,
    value: &Value,
) -> Result<(), FbeError> {
    match (primitive, value) {
        (Primitive::Bool, Value::Bool(v)) => buffer.write_bool(offset, *v)?,
        (Primitive::Byte, Value::Byte(v)) => buffer.write_u8(offset, *v)?,
        (Primitive::Char, Value::Char(v)) => buffer.write_char(offset, *v)?,
        (Primitive::WChar, Value::WChar(v)) => buffer.write_wchar(offset, *v)?,
        (Primitive::Int8, Value::I8(v)) => buffer.write_i8(offset, *v)?,
        (Primitive::UInt8, Value::U8(v)) => buffer.write_u8(offset, *v)?,
        (Primitive::Int16, Value::I16(v)) => buffer.write_i16(offset, *v)?,
        (Primitive::UInt16, Value::U16(v)) => buffer.write_u16(offset, *v)?,
        (Primitive::Int32, Value::I32(v)) => buffer.write_i32(offset, *v)?,
        (Primitive::UInt32, Value::U32(v)) => buffer.write_u32(offset, *v)?,
        (Primitive::Int64, Value::I64(v)) => buffer.write_i64(offset, *v)?,
        (Primitive::UInt64, Value::U64(v)) => buffer.write_u64(offset, *v)?,
        (Primitive::Float, Value::F32(v)) => buffer.write_f32(offset, *v)?,
        (Primitive::Double, Value::F64(v)) => buffer.write_f64(offset, *v)?,
        (Primitive::Uuid, Value::Uuid(v)) => buffer.write_uuid(offset, v)?,
        (Primitive::Decimal, Value::Decimal(v)) => buffer.write_decimal(offset, v)?,
        (Primitive::Timestamp, Value::Timestamp(v)) => buffer.write_timestamp(offset, *v)?,
        (primitive, value) => return Err(FbeError::mismatch(primitive.name(), value.type_name())),
    }
    Ok(())
}

/// Validates UTF-8 without copying.
fn check_utf8(raw: &[u8]) -> Result<(), FbeError> {
    std::str::from_utf8(raw)
        .map(|_| ())
        .map_err(|_| fbe_buffers::BufferError::InvalidUtf8.into())
}
