//! Whole-struct encoding in both wire formats.

use std::sync::Arc;

use fbe_buffers::{print_octets, BufferConfig, ReadBuffer, WriteBuffer, PREFIX_SIZE};
use tracing::{debug, trace};

use crate::error::FbeError;
use crate::field::{
    final_struct_size, measure_struct, read_final_struct, read_struct, struct_values,
    verify_struct, write_final_struct, write_struct,
};
use crate::record::Record;
use crate::schema::StructSchema;

/// Bytes of a rejected payload included in debug logs.
const LOGGED_OCTETS: usize = 64;

/// Standard-format struct codec.
///
/// The block starts with a 4-byte total size (header, heads and tail),
/// followed by the fixed-width field heads in schema order; variable
/// payloads follow behind relative pointers. Readers skip trailing fields
/// they do not know, so a newer producer may append fields.
///
/// ```
/// use fbe::{FieldType, Record, StructModel, StructSchema, Value};
///
/// let schema = StructSchema::builder("Quote")
///     .field("id", FieldType::i32())
///     .field("symbol", FieldType::string())
///     .field("price", FieldType::f64())
///     .build()
///     .unwrap();
/// let quote = Record::new()
///     .with("id", 42i32)
///     .with("symbol", "EURUSD")
///     .with("price", 1.23456f64);
///
/// let mut model = StructModel::new(schema);
/// let size = model.serialize(&quote).unwrap();
/// assert_eq!(size, 30);
/// assert_eq!(&model.data()[..4], &30u32.to_le_bytes());
///
/// let (decoded, read) = model.deserialize(model.data()).unwrap();
/// assert_eq!(read, 30);
/// assert_eq!(decoded.get("symbol"), Some(&Value::from("EURUSD")));
/// ```
#[derive(Debug, Clone)]
pub struct StructModel {
    schema: Arc<StructSchema>,
    buffer: WriteBuffer,
}

impl StructModel {
    pub fn new(schema: Arc<StructSchema>) -> Self {
        Self::with_config(schema, BufferConfig::default())
    }

    pub fn with_config(schema: Arc<StructSchema>, config: BufferConfig) -> Self {
        Self {
            schema,
            buffer: WriteBuffer::with_config(config),
        }
    }

    pub fn schema(&self) -> &Arc<StructSchema> {
        &self.schema
    }

    /// Bytes of the last [`StructModel::serialize`] call.
    pub fn data(&self) -> &[u8] {
        self.buffer.data()
    }

    pub fn buffer(&self) -> &WriteBuffer {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer.into_inner()
    }

    /// Encodes `record` into the model's own buffer, replacing its previous
    /// contents, and returns the encoded size.
    pub fn serialize(&mut self, record: &Record) -> Result<usize, FbeError> {
        self.buffer.reset();
        let size = serialize_standard(&mut self.buffer, &self.schema, record)?;
        debug_assert_eq!(size, self.buffer.size());
        Ok(size)
    }

    /// Appends `record` to `buffer`, after whatever the caller already
    /// wrote there. Returns the size of the struct block.
    pub fn serialize_at(&self, buffer: &mut WriteBuffer, record: &Record) -> Result<usize, FbeError> {
        serialize_standard(buffer, &self.schema, record)
    }

    /// Decodes a struct at the start of `data`. Returns the record and the
    /// size stated in its header.
    pub fn deserialize(&self, data: &[u8]) -> Result<(Record, usize), FbeError> {
        self.deserialize_at(ReadBuffer::new(data))
    }

    /// Decodes a struct at the base offset of `buffer`.
    pub fn deserialize_at(&self, buffer: ReadBuffer<'_>) -> Result<(Record, usize), FbeError> {
        let (record, size) = read_struct(&buffer, &self.schema)?;
        trace!(schema = self.schema.name(), offset = buffer.offset(), size, "deserialized struct");
        Ok((record, size))
    }

    /// Whether `data` starts with a well-formed struct of this schema.
    pub fn verify(&self, data: &[u8]) -> bool {
        match verify_struct(&ReadBuffer::new(data), &self.schema) {
            Ok(_) => true,
            Err(err) => {
                debug!(
                    schema = self.schema.name(),
                    error = %err,
                    data = %print_octets(data, LOGGED_OCTETS),
                    "struct verification failed"
                );
                false
            }
        }
    }
}

fn serialize_standard(
    buffer: &mut WriteBuffer,
    schema: &StructSchema,
    record: &Record,
) -> Result<usize, FbeError> {
    let start = buffer.size();
    let result = write_standard_block(buffer, schema, record);
    if result.is_err() {
        buffer.truncate(start);
    }
    let size = result?;
    trace!(schema = schema.name(), offset = start, size, "serialized struct");
    Ok(size)
}

fn write_standard_block(
    buffer: &mut WriteBuffer,
    schema: &StructSchema,
    record: &Record,
) -> Result<usize, FbeError> {
    let at = buffer.allocate(PREFIX_SIZE + schema.head_size())?;
    let base = buffer.pointer_to(at)? as usize;
    buffer.shift(base);
    let size = write_struct(buffer, schema, record);
    buffer.unshift(base);
    size
}

/// Final-format struct codec.
///
/// Fields are written back to back with no header and no pointers, so the
/// payload is as small as possible but producer and consumer must agree on
/// the schema exactly.
#[derive(Debug, Clone)]
pub struct StructFinalModel {
    schema: Arc<StructSchema>,
    buffer: WriteBuffer,
}

impl StructFinalModel {
    pub fn new(schema: Arc<StructSchema>) -> Self {
        Self::with_config(schema, BufferConfig::default())
    }

    pub fn with_config(schema: Arc<StructSchema>, config: BufferConfig) -> Self {
        Self {
            schema,
            buffer: WriteBuffer::with_config(config),
        }
    }

    pub fn schema(&self) -> &Arc<StructSchema> {
        &self.schema
    }

    pub fn data(&self) -> &[u8] {
        self.buffer.data()
    }

    pub fn buffer(&self) -> &WriteBuffer {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer.into_inner()
    }

    pub fn serialize(&mut self, record: &Record) -> Result<usize, FbeError> {
        self.buffer.reset();
        serialize_final(&mut self.buffer, &self.schema, record)
    }

    pub fn serialize_at(&self, buffer: &mut WriteBuffer, record: &Record) -> Result<usize, FbeError> {
        serialize_final(buffer, &self.schema, record)
    }

    /// Decodes a struct at the start of `data`. Returns the record and the
    /// number of bytes consumed.
    pub fn deserialize(&self, data: &[u8]) -> Result<(Record, usize), FbeError> {
        self.deserialize_at(ReadBuffer::new(data))
    }

    pub fn deserialize_at(&self, buffer: ReadBuffer<'_>) -> Result<(Record, usize), FbeError> {
        let (record, size) = read_final_struct(&buffer, &self.schema, 0)?;
        trace!(schema = self.schema.name(), offset = buffer.offset(), size, "deserialized final struct");
        Ok((record, size))
    }

    pub fn verify(&self, data: &[u8]) -> bool {
        match measure_struct(&ReadBuffer::new(data), &self.schema, 0) {
            Ok(_) => true,
            Err(err) => {
                debug!(
                    schema = self.schema.name(),
                    error = %err,
                    data = %print_octets(data, LOGGED_OCTETS),
                    "final struct verification failed"
                );
                false
            }
        }
    }
}

fn serialize_final(
    buffer: &mut WriteBuffer,
    schema: &StructSchema,
    record: &Record,
) -> Result<usize, FbeError> {
    let size = final_struct_size(schema, &struct_values(schema, record)?)?;
    let at = buffer.allocate(size)?;
    let written = buffer
        .pointer_to(at)
        .map_err(FbeError::from)
        .and_then(|offset| write_final_struct(buffer, schema, offset as usize, record));
    let written = match written {
        Ok(written) => written,
        Err(err) => {
            buffer.truncate(at);
            return Err(err);
        }
    };
    debug_assert_eq!(written, size);
    trace!(schema = schema.name(), offset = at, size, "serialized final struct");
    Ok(size)
}
