//! Final format: every value inline at its own offset.

use std::borrow::Cow;

use fbe_buffers::{ReadBuffer, WriteBuffer, PREFIX_SIZE};
use tracing::debug;

use super::{
    check_array_len, check_item_width, check_utf8, collection_items, map_items, read_count,
    read_primitive, struct_values, variable_bytes, write_primitive,
};
use crate::error::FbeError;
use crate::record::Record;
use crate::schema::StructSchema;
use crate::types::{FieldType, VariableKind};
use crate::value::{finish_collection, Value};

const FLAG_ABSENT: u8 = 0;
const FLAG_PRESENT: u8 = 1;

/// Read view of one Final field. Its size depends on the encoded data.
#[derive(Debug, Clone, Copy)]
pub struct FinalFieldModel<'a> {
    buffer: ReadBuffer<'a>,
    ty: &'a FieldType,
    offset: usize,
}

impl<'a> FinalFieldModel<'a> {
    pub fn new(buffer: ReadBuffer<'a>, ty: &'a FieldType, offset: usize) -> Self {
        Self { buffer, ty, offset }
    }

    pub fn field_type(&self) -> &'a FieldType {
        self.ty
    }

    /// Encoded length of the value at the offset.
    pub fn size(&self) -> Result<usize, FbeError> {
        measure(&self.buffer, self.ty, self.offset)
    }

    /// Always 0: nothing lives outside the field.
    pub fn extra(&self) -> usize {
        0
    }

    /// Decodes the value and the number of bytes it consumed.
    pub fn get(&self) -> Result<(Value, usize), FbeError> {
        read_value(&self.buffer, self.ty, self.offset)
    }

    pub fn verify(&self) -> bool {
        match measure(&self.buffer, self.ty, self.offset) {
            Ok(_) => true,
            Err(err) => {
                debug!(ty = %self.ty, offset = self.offset, error = %err, "final field verification failed");
                false
            }
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn shift(&mut self, by: usize) {
        self.offset += by;
    }

    pub fn unshift(&mut self, by: usize) {
        self.offset -= by;
    }
}

/// Write view of one Final field.
///
/// The region must already be allocated, sized with [`super::final_size`].
///
/// ```
/// use fbe::{final_size, FinalFieldModelMut, FieldType, Value};
/// use fbe_buffers::WriteBuffer;
///
/// let ty = FieldType::vector(FieldType::i32());
/// let value = Value::Seq(vec![Value::I32(10), Value::I32(20), Value::I32(30)]);
///
/// let mut buffer = WriteBuffer::new();
/// let at = buffer.allocate(final_size(&ty, &value).unwrap()).unwrap();
/// let written = FinalFieldModelMut::new(&mut buffer, &ty, at).set(&value).unwrap();
/// assert_eq!(written, 16);
/// assert_eq!(&buffer.data()[..4], &[3, 0, 0, 0]);
/// ```
#[derive(Debug)]
pub struct FinalFieldModelMut<'a> {
    buffer: &'a mut WriteBuffer,
    ty: &'a FieldType,
    offset: usize,
}

impl<'a> FinalFieldModelMut<'a> {
    pub fn new(buffer: &'a mut WriteBuffer, ty: &'a FieldType, offset: usize) -> Self {
        Self { buffer, ty, offset }
    }

    /// Writes `value` and returns its encoded length.
    pub fn set(&mut self, value: &Value) -> Result<usize, FbeError> {
        write_value(self.buffer, self.ty, self.offset, value)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn shift(&mut self, by: usize) {
        self.offset += by;
    }

    pub fn unshift(&mut self, by: usize) {
        self.offset -= by;
    }
}

fn write_value(
    buffer: &mut WriteBuffer,
    ty: &FieldType,
    offset: usize,
    value: &Value,
) -> Result<usize, FbeError> {
    match (ty, value) {
        (FieldType::Primitive(p), value) => {
            write_primitive(buffer, *p, offset, value)?;
            Ok(p.width())
        }
        (FieldType::Variable(kind), value) => {
            let bytes = variable_bytes(*kind, value)?;
            buffer.write_bytes(offset, bytes)?;
            Ok(PREFIX_SIZE + bytes.len())
        }
        (FieldType::Array(item, len), Value::Seq(items)) => {
            check_array_len(*len, items)?;
            let mut cursor = offset;
            for v in items {
                cursor += write_value(buffer, item, cursor, v)?;
            }
            Ok(cursor - offset)
        }
        (FieldType::Collection(kind, item), Value::Seq(items)) => {
            let items = collection_items(*kind, items);
            check_item_width(item.final_min_size(), items.len())?;
            buffer.write_length(offset, items.len())?;
            let mut cursor = offset + PREFIX_SIZE;
            for v in items {
                cursor += write_value(buffer, item, cursor, v)?;
            }
            Ok(cursor - offset)
        }
        (FieldType::Map(kind, key, val), Value::Map(entries)) => {
            let entries = map_items(*kind, entries);
            check_item_width(key.final_min_size() + val.final_min_size(), entries.len())?;
            buffer.write_length(offset, entries.len())?;
            let mut cursor = offset + PREFIX_SIZE;
            for (k, v) in entries {
                cursor += write_value(buffer, key, cursor, k)?;
                cursor += write_value(buffer, val, cursor, v)?;
            }
            Ok(cursor - offset)
        }
        (FieldType::Optional(_), Value::Optional(None)) => {
            buffer.write_u8(offset, FLAG_ABSENT)?;
            Ok(1)
        }
        (FieldType::Optional(inner), Value::Optional(Some(v))) => {
            buffer.write_u8(offset, FLAG_PRESENT)?;
            Ok(1 + write_value(buffer, inner, offset + 1, v)?)
        }
        (FieldType::Struct(schema), Value::Struct(record)) => {
            let values = struct_values(schema, record)?;
            write_fields(buffer, schema, offset, &values)
        }
        (ty, value) => Err(FbeError::mismatch(ty, value.type_name())),
    }
}

fn write_fields(
    buffer: &mut WriteBuffer,
    schema: &StructSchema,
    offset: usize,
    values: &[Cow<'_, Value>],
) -> Result<usize, FbeError> {
    let mut cursor = offset;
    for (field, value) in schema.fields().iter().zip(values) {
        cursor += write_value(buffer, &field.ty, cursor, value)?;
    }
    Ok(cursor - offset)
}

/// Writes the fields of a record back to back at `offset`, inside an
/// already allocated region.
pub(crate) fn write_final_struct(
    buffer: &mut WriteBuffer,
    schema: &StructSchema,
    offset: usize,
    record: &Record,
) -> Result<usize, FbeError> {
    let values = struct_values(schema, record)?;
    write_fields(buffer, schema, offset, &values)
}

fn read_value(
    buffer: &ReadBuffer<'_>,
    ty: &FieldType,
    offset: usize,
) -> Result<(Value, usize), FbeError> {
    match ty {
        FieldType::Primitive(p) => Ok((read_primitive(buffer, *p, offset)?, p.width())),
        FieldType::Variable(VariableKind::String) => {
            let s = buffer.read_string(offset)?;
            let size = PREFIX_SIZE + s.len();
            Ok((Value::String(s), size))
        }
        FieldType::Variable(VariableKind::Bytes) => {
            let b = buffer.read_bytes(offset)?;
            let size = PREFIX_SIZE + b.len();
            Ok((Value::Bytes(b), size))
        }
        FieldType::Array(item, len) => {
            let mut items = Vec::with_capacity(*len);
            let mut cursor = offset;
            for _ in 0..*len {
                let (v, n) = read_value(buffer, item, cursor)?;
                items.push(v);
                cursor += n;
            }
            Ok((Value::Seq(items), cursor - offset))
        }
        FieldType::Collection(kind, item) => {
            let count = read_count(buffer, offset, item.final_min_size())?;
            let mut items = Vec::with_capacity(count);
            let mut cursor = offset + PREFIX_SIZE;
            for _ in 0..count {
                let (v, n) = read_value(buffer, item, cursor)?;
                items.push(v);
                cursor += n;
            }
            Ok((finish_collection(*kind, items), cursor - offset))
        }
        FieldType::Map(_, key, val) => {
            let count = read_count(buffer, offset, key.final_min_size() + val.final_min_size())?;
            let mut entries = Vec::with_capacity(count);
            let mut cursor = offset + PREFIX_SIZE;
            for _ in 0..count {
                let (k, n) = read_value(buffer, key, cursor)?;
                cursor += n;
                let (v, n) = read_value(buffer, val, cursor)?;
                cursor += n;
                entries.push((k, v));
            }
            Ok((Value::Map(entries), cursor - offset))
        }
        FieldType::Optional(inner) => match buffer.read_u8(offset)? {
            FLAG_ABSENT => Ok((Value::Optional(None), 1)),
            FLAG_PRESENT => {
                let (v, n) = read_value(buffer, inner, offset + 1)?;
                Ok((Value::Optional(Some(Box::new(v))), 1 + n))
            }
            flag => Err(FbeError::InvalidFlag(flag)),
        },
        FieldType::Struct(schema) => {
            let (record, n) = read_final_struct(buffer, schema, offset)?;
            Ok((Value::Struct(record), n))
        }
    }
}

/// Reads the fields of a struct back to back from `offset`.
pub(crate) fn read_final_struct(
    buffer: &ReadBuffer<'_>,
    schema: &StructSchema,
    offset: usize,
) -> Result<(Record, usize), FbeError> {
    let mut record = Record::new();
    let mut cursor = offset;
    for field in schema.fields() {
        let (v, n) = read_value(buffer, &field.ty, cursor)?;
        record.set(field.name.clone(), v);
        cursor += n;
    }
    Ok((record, cursor - offset))
}

/// Walks the encoded value without building it, validating as it goes.
pub(crate) fn measure(
    buffer: &ReadBuffer<'_>,
    ty: &FieldType,
    offset: usize,
) -> Result<usize, FbeError> {
    match ty {
        FieldType::Primitive(p) => {
            read_primitive(buffer, *p, offset)?;
            Ok(p.width())
        }
        FieldType::Variable(kind) => {
            let length = buffer.read_length(offset)?;
            let raw = buffer.slice(offset + PREFIX_SIZE, length)?;
            if *kind == VariableKind::String {
                check_utf8(raw)?;
            }
            Ok(PREFIX_SIZE + length)
        }
        FieldType::Array(item, len) => {
            let mut cursor = offset;
            for _ in 0..*len {
                cursor += measure(buffer, item, cursor)?;
            }
            Ok(cursor - offset)
        }
        FieldType::Collection(_, item) => {
            let count = read_count(buffer, offset, item.final_min_size())?;
            let mut cursor = offset + PREFIX_SIZE;
            for _ in 0..count {
                cursor += measure(buffer, item, cursor)?;
            }
            Ok(cursor - offset)
        }
        FieldType::Map(_, key, val) => {
            let count = read_count(buffer, offset, key.final_min_size() + val.final_min_size())?;
            let mut cursor = offset + PREFIX_SIZE;
            for _ in 0..count {
                cursor += measure(buffer, key, cursor)?;
                cursor += measure(buffer, val, cursor)?;
            }
            Ok(cursor - offset)
        }
        FieldType::Optional(inner) => match buffer.read_u8(offset)? {
            FLAG_ABSENT => Ok(1),
            FLAG_PRESENT => Ok(1 + measure(buffer, inner, offset + 1)?),
            flag => Err(FbeError::InvalidFlag(flag)),
        },
        FieldType::Struct(schema) => measure_struct(buffer, schema, offset),
    }
}

pub(crate) fn measure_struct(
    buffer: &ReadBuffer<'_>,
    schema: &StructSchema,
    offset: usize,
) -> Result<usize, FbeError> {
    let mut cursor = offset;
    for field in schema.fields() {
        cursor += measure(buffer, &field.ty, cursor)?;
    }
    Ok(cursor - offset)
}
