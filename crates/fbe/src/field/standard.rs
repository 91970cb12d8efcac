//! Standard format: fixed heads, variable payloads behind relative pointers.

use std::borrow::Cow;

use fbe_buffers::{ReadBuffer, WriteBuffer, PREFIX_SIZE};
use tracing::debug;

use super::{
    check_item_width, check_utf8, collection_items, map_items, read_count, read_primitive,
    standard_struct_size, struct_values, variable_bytes, write_primitive,
};
use crate::error::FbeError;
use crate::record::Record;
use crate::schema::StructSchema;
use crate::types::{FieldType, VariableKind};
use crate::value::{finish_collection, Value};

const FLAG_ABSENT: u8 = 0;
const FLAG_PRESENT: u8 = 1;

/// Read view of one Standard field.
///
/// ```
/// use fbe::{FieldModel, FieldType, Value};
/// use fbe_buffers::ReadBuffer;
///
/// // pointer 4 -> [count 2][7][9]
/// let data = [4, 0, 0, 0, 2, 0, 0, 0, 7, 0, 0, 0, 9, 0, 0, 0];
/// let ty = FieldType::vector(FieldType::i32());
/// let model = FieldModel::new(ReadBuffer::new(&data), &ty, 0);
///
/// assert_eq!(model.size(), 4);
/// assert_eq!(model.extra().unwrap(), 12);
/// assert_eq!(model.get().unwrap(), Value::Seq(vec![Value::I32(7), Value::I32(9)]));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FieldModel<'a> {
    buffer: ReadBuffer<'a>,
    ty: &'a FieldType,
    offset: usize,
}

impl<'a> FieldModel<'a> {
    pub fn new(buffer: ReadBuffer<'a>, ty: &'a FieldType, offset: usize) -> Self {
        Self { buffer, ty, offset }
    }

    pub fn field_type(&self) -> &'a FieldType {
        self.ty
    }

    /// Head size; does not depend on the data.
    pub fn size(&self) -> usize {
        self.ty.head_size()
    }

    /// Bytes the field's payload occupies outside its head.
    pub fn extra(&self) -> Result<usize, FbeError> {
        read_extra(&self.buffer, self.ty, self.offset)
    }

    pub fn get(&self) -> Result<Value, FbeError> {
        read_value(&self.buffer, self.ty, self.offset)
    }

    /// Whether the head and everything it points to is well formed.
    pub fn verify(&self) -> bool {
        match verify_value(&self.buffer, self.ty, self.offset) {
            Ok(()) => true,
            Err(err) => {
                debug!(ty = %self.ty, offset = self.offset, error = %err, "field verification failed");
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

    /// Moves the model forward, e.g. to the next item of an array.
    pub fn shift(&mut self, by: usize) {
        self.offset += by;
    }

    pub fn unshift(&mut self, by: usize) {
        self.offset -= by;
    }
}

/// Write view of one Standard field.
///
/// The head must already be allocated; payloads are allocated at the tail.
#[derive(Debug)]
pub struct FieldModelMut<'a> {
    buffer: &'a mut WriteBuffer,
    ty: &'a FieldType,
    offset: usize,
}

impl<'a> FieldModelMut<'a> {
    pub fn new(buffer: &'a mut WriteBuffer, ty: &'a FieldType, offset: usize) -> Self {
        Self { buffer, ty, offset }
    }

    pub fn size(&self) -> usize {
        self.ty.head_size()
    }

    /// Writes `value` and returns the bytes written, head plus extra.
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

/// Allocates `length` bytes at the tail and stores their pointer at `head`.
fn allocate_behind(buffer: &mut WriteBuffer, head: usize, length: usize) -> Result<usize, FbeError> {
    let at = buffer.allocate(length)?;
    let pointer = buffer.pointer_to(at)?;
    buffer.write_u32(head, pointer)?;
    Ok(pointer as usize)
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
            let pointer = allocate_behind(buffer, offset, PREFIX_SIZE + bytes.len())?;
            buffer.write_bytes(pointer, bytes)?;
            Ok(PREFIX_SIZE + PREFIX_SIZE + bytes.len())
        }
        (FieldType::Array(item, len), Value::Seq(items)) => {
            super::check_array_len(*len, items)?;
            let head = item.head_size();
            let mut written = 0;
            for (i, v) in items.iter().enumerate() {
                written += write_value(buffer, item, offset + i * head, v)?;
            }
            Ok(written)
        }
        (FieldType::Collection(kind, item), Value::Seq(items)) => {
            let items = collection_items(*kind, items);
            let head = item.head_size();
            check_item_width(head, items.len())?;
            let pointer = allocate_behind(buffer, offset, PREFIX_SIZE + items.len() * head)?;
            buffer.write_length(pointer, items.len())?;
            let mut written = PREFIX_SIZE + PREFIX_SIZE;
            for (i, v) in items.into_iter().enumerate() {
                written += write_value(buffer, item, pointer + PREFIX_SIZE + i * head, v)?;
            }
            Ok(written)
        }
        (FieldType::Map(kind, key, val), Value::Map(entries)) => {
            let entries = map_items(*kind, entries);
            let key_head = key.head_size();
            let head = key_head + val.head_size();
            check_item_width(head, entries.len())?;
            let pointer = allocate_behind(buffer, offset, PREFIX_SIZE + entries.len() * head)?;
            buffer.write_length(pointer, entries.len())?;
            let mut written = PREFIX_SIZE + PREFIX_SIZE;
            for (i, (k, v)) in entries.into_iter().enumerate() {
                let at = pointer + PREFIX_SIZE + i * head;
                written += write_value(buffer, key, at, k)?;
                written += write_value(buffer, val, at + key_head, v)?;
            }
            Ok(written)
        }
        (FieldType::Optional(_), Value::Optional(None)) => {
            buffer.write_u8(offset, FLAG_ABSENT)?;
            buffer.write_u32(offset + 1, 0)?;
            Ok(1 + PREFIX_SIZE)
        }
        (FieldType::Optional(inner), Value::Optional(Some(v))) => {
            buffer.write_u8(offset, FLAG_PRESENT)?;
            let pointer = allocate_behind(buffer, offset + 1, inner.head_size())?;
            buffer.shift(pointer);
            let written = write_value(buffer, inner, 0, v);
            buffer.unshift(pointer);
            Ok(1 + PREFIX_SIZE + written?)
        }
        (FieldType::Struct(schema), Value::Struct(record)) => {
            let values = struct_values(schema, record)?;
            let pointer = allocate_behind(buffer, offset, PREFIX_SIZE + schema.head_size())?;
            buffer.shift(pointer);
            let written = write_struct_values(buffer, schema, &values);
            buffer.unshift(pointer);
            Ok(PREFIX_SIZE + written?)
        }
        (ty, value) => Err(FbeError::mismatch(ty, value.type_name())),
    }
}

/// Writes a struct block at the buffer base, whose header and heads are
/// already allocated. Returns the size stored in the header.
pub(crate) fn write_struct(
    buffer: &mut WriteBuffer,
    schema: &StructSchema,
    record: &Record,
) -> Result<usize, FbeError> {
    let values = struct_values(schema, record)?;
    write_struct_values(buffer, schema, &values)
}

fn write_struct_values(
    buffer: &mut WriteBuffer,
    schema: &StructSchema,
    values: &[Cow<'_, Value>],
) -> Result<usize, FbeError> {
    let size = standard_struct_size(schema, values)?;
    buffer.write_length(0, size)?;
    let mut offset = PREFIX_SIZE;
    let mut written = PREFIX_SIZE;
    for (field, value) in schema.fields().iter().zip(values) {
        written += write_value(buffer, &field.ty, offset, value)?;
        offset += field.ty.head_size();
    }
    debug_assert_eq!(written, size, "struct `{}` size drift", schema.name());
    Ok(size)
}

/// Resolves a pointer; `None` for the null pointer of an empty value.
fn pointer(buffer: &ReadBuffer<'_>, offset: usize) -> Result<Option<usize>, FbeError> {
    match buffer.read_u32(offset)? {
        0 => Ok(None),
        p => Ok(Some(p as usize)),
    }
}

/// Presence flag and payload pointer of an optional.
fn optional_pointer(buffer: &ReadBuffer<'_>, offset: usize) -> Result<Option<usize>, FbeError> {
    match buffer.read_u8(offset)? {
        FLAG_ABSENT => Ok(None),
        FLAG_PRESENT => match pointer(buffer, offset + 1)? {
            Some(p) => Ok(Some(p)),
            None => Err(FbeError::NullPointer),
        },
        flag => Err(FbeError::InvalidFlag(flag)),
    }
}

fn read_value(buffer: &ReadBuffer<'_>, ty: &FieldType, offset: usize) -> Result<Value, FbeError> {
    match ty {
        FieldType::Primitive(p) => read_primitive(buffer, *p, offset),
        FieldType::Variable(kind) => match (pointer(buffer, offset)?, kind) {
            (None, _) => Ok(ty.default_value()),
            (Some(p), VariableKind::String) => Ok(Value::String(buffer.read_string(p)?)),
            (Some(p), VariableKind::Bytes) => Ok(Value::Bytes(buffer.read_bytes(p)?)),
        },
        FieldType::Array(item, len) => {
            let head = item.head_size();
            (0..*len)
                .map(|i| read_value(buffer, item, offset + i * head))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Seq)
        }
        FieldType::Collection(kind, item) => {
            let Some(p) = pointer(buffer, offset)? else {
                return Ok(Value::Seq(Vec::new()));
            };
            let head = item.head_size();
            let count = read_count(buffer, p, head)?;
            let items = (0..count)
                .map(|i| read_value(buffer, item, p + PREFIX_SIZE + i * head))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(finish_collection(*kind, items))
        }
        FieldType::Map(_, key, val) => {
            let Some(p) = pointer(buffer, offset)? else {
                return Ok(Value::Map(Vec::new()));
            };
            let key_head = key.head_size();
            let head = key_head + val.head_size();
            let count = read_count(buffer, p, head)?;
            let mut entries = Vec::with_capacity(count);
            for i in 0..count {
                let at = p + PREFIX_SIZE + i * head;
                entries.push((
                    read_value(buffer, key, at)?,
                    read_value(buffer, val, at + key_head)?,
                ));
            }
            Ok(Value::Map(entries))
        }
        FieldType::Optional(inner) => match optional_pointer(buffer, offset)? {
            None => Ok(Value::Optional(None)),
            Some(p) => {
                let v = read_value(&buffer.shifted(p), inner, 0)?;
                Ok(Value::Optional(Some(Box::new(v))))
            }
        },
        FieldType::Struct(schema) => match pointer(buffer, offset)? {
            None => Ok(Value::Struct(schema.default_record())),
            Some(p) => Ok(Value::Struct(read_struct(&buffer.shifted(p), schema)?.0)),
        },
    }
}

/// Checks the header of a struct block at the buffer base and returns the
/// size it states.
fn struct_size(buffer: &ReadBuffer<'_>, schema: &StructSchema) -> Result<usize, FbeError> {
    let size = buffer.read_u32(0)? as usize;
    let required = PREFIX_SIZE + schema.head_size();
    if size < required {
        return Err(FbeError::InvalidStructSize { size, required });
    }
    buffer.absolute(0, size)?;
    Ok(size)
}

/// Reads a struct block at the buffer base.
///
/// Trailing fields the schema does not know are skipped, which is what lets
/// a parent schema read a derived payload.
pub(crate) fn read_struct(
    buffer: &ReadBuffer<'_>,
    schema: &StructSchema,
) -> Result<(Record, usize), FbeError> {
    let size = struct_size(buffer, schema)?;
    let mut record = Record::new();
    let mut offset = PREFIX_SIZE;
    for field in schema.fields() {
        record.set(field.name.clone(), read_value(buffer, &field.ty, offset)?);
        offset += field.ty.head_size();
    }
    Ok((record, size))
}

fn read_extra(buffer: &ReadBuffer<'_>, ty: &FieldType, offset: usize) -> Result<usize, FbeError> {
    match ty {
        FieldType::Primitive(_) => Ok(0),
        FieldType::Variable(_) => match pointer(buffer, offset)? {
            None => Ok(0),
            Some(p) => Ok(PREFIX_SIZE + buffer.read_length(p)?),
        },
        FieldType::Array(item, len) => {
            let head = item.head_size();
            (0..*len)
                .map(|i| read_extra(buffer, item, offset + i * head))
                .sum()
        }
        FieldType::Collection(_, item) => {
            let Some(p) = pointer(buffer, offset)? else {
                return Ok(0);
            };
            let head = item.head_size();
            let count = read_count(buffer, p, head)?;
            let mut extra = PREFIX_SIZE + count * head;
            if !item.is_fixed() {
                for i in 0..count {
                    extra += read_extra(buffer, item, p + PREFIX_SIZE + i * head)?;
                }
            }
            Ok(extra)
        }
        FieldType::Map(_, key, val) => {
            let Some(p) = pointer(buffer, offset)? else {
                return Ok(0);
            };
            let key_head = key.head_size();
            let head = key_head + val.head_size();
            let count = read_count(buffer, p, head)?;
            let mut extra = PREFIX_SIZE + count * head;
            for i in 0..count {
                let at = p + PREFIX_SIZE + i * head;
                extra += read_extra(buffer, key, at)? + read_extra(buffer, val, at + key_head)?;
            }
            Ok(extra)
        }
        FieldType::Optional(inner) => match optional_pointer(buffer, offset)? {
            None => Ok(0),
            Some(p) => Ok(inner.head_size() + read_extra(&buffer.shifted(p), inner, 0)?),
        },
        FieldType::Struct(schema) => match pointer(buffer, offset)? {
            None => Ok(0),
            Some(p) => struct_size(&buffer.shifted(p), schema),
        },
    }
}

fn verify_value(buffer: &ReadBuffer<'_>, ty: &FieldType, offset: usize) -> Result<(), FbeError> {
    match ty {
        FieldType::Primitive(p) => read_primitive(buffer, *p, offset).map(|_| ()),
        FieldType::Variable(kind) => {
            let Some(p) = pointer(buffer, offset)? else {
                return Ok(());
            };
            let length = buffer.read_length(p)?;
            let raw = buffer.slice(p + PREFIX_SIZE, length)?;
            match kind {
                VariableKind::String => check_utf8(raw),
                VariableKind::Bytes => Ok(()),
            }
        }
        FieldType::Array(item, len) => {
            let head = item.head_size();
            (0..*len).try_for_each(|i| verify_value(buffer, item, offset + i * head))
        }
        FieldType::Collection(_, item) => {
            let Some(p) = pointer(buffer, offset)? else {
                return Ok(());
            };
            let head = item.head_size();
            let count = read_count(buffer, p, head)?;
            (0..count).try_for_each(|i| verify_value(buffer, item, p + PREFIX_SIZE + i * head))
        }
        FieldType::Map(_, key, val) => {
            let Some(p) = pointer(buffer, offset)? else {
                return Ok(());
            };
            let key_head = key.head_size();
            let head = key_head + val.head_size();
            let count = read_count(buffer, p, head)?;
            (0..count).try_for_each(|i| {
                let at = p + PREFIX_SIZE + i * head;
                verify_value(buffer, key, at)?;
                verify_value(buffer, val, at + key_head)
            })
        }
        FieldType::Optional(inner) => match optional_pointer(buffer, offset)? {
            None => Ok(()),
            Some(p) => verify_value(&buffer.shifted(p), inner, 0),
        },
        FieldType::Struct(schema) => match pointer(buffer, offset)? {
            None => Ok(()),
            Some(p) => verify_struct(&buffer.shifted(p), schema).map(|_| ()),
        },
    }
}

/// Verifies a struct block at the buffer base and returns its size.
pub(crate) fn verify_struct(
    buffer: &ReadBuffer<'_>,
    schema: &StructSchema,
) -> Result<usize, FbeError> {
    let size = struct_size(buffer, schema)?;
    let mut offset = PREFIX_SIZE;
    for field in schema.fields() {
        verify_value(buffer, &field.ty, offset)?;
        offset += field.ty.head_size();
    }
    Ok(size)
}
