//! Growable buffer with a bump allocator.

use crate::{BufferConfig, BufferError, Decimal, Uuid, PREFIX_SIZE};

/// A write buffer that owns its bytes.
///
/// `size` is the high-water mark of allocated bytes and is independent of
/// the capacity. Regions are reserved with [`WriteBuffer::allocate`] and then
/// filled with the `write_*` methods, whose offsets are relative to the base
/// offset. Writes outside the allocated region fail instead of growing the
/// buffer implicitly.
///
/// Growing reallocates, so slices obtained from [`WriteBuffer::data`] must
/// not be kept across an `allocate` call.
///
/// # Example
///
/// ```
/// use fbe_buffers::WriteBuffer;
///
/// let mut buffer = WriteBuffer::new();
/// let at = buffer.allocate(4 + 5).unwrap();
/// buffer.write_string(at, "hello").unwrap();
/// assert_eq!(buffer.data(), b"\x05\x00\x00\x00hello");
/// ```
#[derive(Debug, Clone)]
pub struct WriteBuffer {
    data: Vec<u8>,
    size: usize,
    offset: usize,
    config: BufferConfig,
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteBuffer {
    /// Creates a buffer with the default [`BufferConfig`].
    pub fn new() -> Self {
        Self::with_config(BufferConfig::default())
    }

    /// Creates a buffer with `capacity` bytes preallocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(BufferConfig::with_initial_capacity(capacity))
    }

    /// Creates a buffer sized and capped by `config`.
    pub fn with_config(config: BufferConfig) -> Self {
        Self {
            data: vec![0; config.initial_capacity.min(config.max_capacity)],
            size: 0,
            offset: 0,
            config,
        }
    }

    /// Growth limits of this buffer.
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Allocated bytes, from the start of the buffer.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.size]
    }

    /// Consumes the buffer and returns the allocated bytes.
    pub fn into_inner(mut self) -> Vec<u8> {
        self.data.truncate(self.size);
        self.data
    }

    /// Bytes backing the buffer, allocated or not.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// High-water mark of allocated bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Current base offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Ensures the capacity is at least `capacity` bytes.
    pub fn reserve(&mut self, capacity: usize) -> Result<(), BufferError> {
        if capacity <= self.data.len() {
            return Ok(());
        }
        let grown = self
            .config
            .grow(self.data.len(), capacity)
            .ok_or(BufferError::CapacityExceeded {
                requested: capacity,
                limit: self.config.max_capacity,
            })?;
        self.data.resize(grown, 0);
        Ok(())
    }

    /// Reserves `length` zero-filled bytes at the tail and returns their
    /// absolute offset.
    pub fn allocate(&mut self, length: usize) -> Result<usize, BufferError> {
        let at = self.size;
        let total = at
            .checked_add(length)
            .ok_or(BufferError::CapacityExceeded {
                requested: usize::MAX,
                limit: self.config.max_capacity,
            })?;
        self.reserve(total)?;
        // a reset buffer still holds the previous payload
        self.data[at..total].fill(0);
        self.size = total;
        Ok(at)
    }

    /// Converts an absolute offset returned by [`WriteBuffer::allocate`]
    /// into the relative pointer stored on the wire.
    pub fn pointer_to(&self, absolute: usize) -> Result<u32, BufferError> {
        absolute
            .checked_sub(self.offset)
            .and_then(|relative| u32::try_from(relative).ok())
            .ok_or(BufferError::OutOfBounds {
                offset: absolute,
                length: 0,
                size: self.size,
            })
    }

    /// Forgets allocations past `size`, e.g. to undo a failed encode. Has no
    /// effect when the buffer is already smaller.
    pub fn truncate(&mut self, size: usize) {
        self.size = self.size.min(size);
    }

    /// Forgets all allocations; capacity is kept for reuse.
    pub fn reset(&mut self) {
        self.size = 0;
        self.offset = 0;
    }

    /// Moves the base offset forward by `by` bytes.
    pub fn shift(&mut self, by: usize) {
        self.offset += by;
    }

    /// Undoes a matching [`WriteBuffer::shift`].
    pub fn unshift(&mut self, by: usize) {
        debug_assert!(by <= self.offset, "unshift past the start of the buffer");
        self.offset = self.offset.saturating_sub(by);
    }

    /// Absolute index of `relative`, checking that `length` allocated bytes
    /// fit.
    pub fn absolute(&self, relative: usize, length: usize) -> Result<usize, BufferError> {
        let out_of_bounds = || BufferError::OutOfBounds {
            offset: self.offset.saturating_add(relative),
            length,
            size: self.size,
        };
        let at = self.offset.checked_add(relative).ok_or_else(out_of_bounds)?;
        match at.checked_add(length) {
            Some(end) if end <= self.size => Ok(at),
            _ => Err(out_of_bounds()),
        }
    }

    /// Copies raw bytes to `offset`.
    pub fn write_raw(&mut self, offset: usize, bytes: &[u8]) -> Result<(), BufferError> {
        let at = self.absolute(offset, bytes.len())?;
        self.data[at..at + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Writes a bool as one byte, `0` or `1`.
    #[inline]
    pub fn write_bool(&mut self, offset: usize, value: bool) -> Result<(), BufferError> {
        self.write_u8(offset, value as u8)
    }

    /// Writes a 1-byte character.
    #[inline]
    pub fn write_char(&mut self, offset: usize, value: u8) -> Result<(), BufferError> {
        self.write_u8(offset, value)
    }

    /// Writes a 4-byte Unicode code point.
    #[inline]
    pub fn write_wchar(&mut self, offset: usize, value: char) -> Result<(), BufferError> {
        self.write_u32(offset, value as u32)
    }

    /// Writes a `u8`.
    #[inline]
    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<(), BufferError> {
        self.write_raw(offset, &[value])
    }

    /// Writes an `i8`.
    #[inline]
    pub fn write_i8(&mut self, offset: usize, value: i8) -> Result<(), BufferError> {
        self.write_raw(offset, &value.to_le_bytes())
    }

    /// Writes a little-endian `u16`.
    #[inline]
    pub fn write_u16(&mut self, offset: usize, value: u16) -> Result<(), BufferError> {
        self.write_raw(offset, &value.to_le_bytes())
    }

    /// Writes a little-endian `i16`.
    #[inline]
    pub fn write_i16(&mut self, offset: usize, value: i16) -> Result<(), BufferError> {
        self.write_raw(offset, &value.to_le_bytes())
    }

    /// Writes a little-endian `u32`.
    #[inline]
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<(), BufferError> {
        self.write_raw(offset, &value.to_le_bytes())
    }

    /// Writes a little-endian `i32`.
    #[inline]
    pub fn write_i32(&mut self, offset: usize, value: i32) -> Result<(), BufferError> {
        self.write_raw(offset, &value.to_le_bytes())
    }

    /// Writes a little-endian `u64`.
    #[inline]
    pub fn write_u64(&mut self, offset: usize, value: u64) -> Result<(), BufferError> {
        self.write_raw(offset, &value.to_le_bytes())
    }

    /// Writes a little-endian `i64`.
    #[inline]
    pub fn write_i64(&mut self, offset: usize, value: i64) -> Result<(), BufferError> {
        self.write_raw(offset, &value.to_le_bytes())
    }

    /// Writes a little-endian IEEE-754 `f32`.
    #[inline]
    pub fn write_f32(&mut self, offset: usize, value: f32) -> Result<(), BufferError> {
        self.write_raw(offset, &value.to_le_bytes())
    }

    /// Writes a little-endian IEEE-754 `f64`.
    #[inline]
    pub fn write_f64(&mut self, offset: usize, value: f64) -> Result<(), BufferError> {
        self.write_raw(offset, &value.to_le_bytes())
    }

    /// Writes nanoseconds since the Unix epoch.
    #[inline]
    pub fn write_timestamp(&mut self, offset: usize, value: u64) -> Result<(), BufferError> {
        self.write_u64(offset, value)
    }

    /// Writes the 16 UUID bytes in RFC 4122 order.
    pub fn write_uuid(&mut self, offset: usize, value: &Uuid) -> Result<(), BufferError> {
        self.write_raw(offset, value.as_bytes())
    }

    /// Writes the 16-byte form of a [`Decimal`].
    pub fn write_decimal(&mut self, offset: usize, value: &Decimal) -> Result<(), BufferError> {
        self.write_raw(offset, &value.to_bytes())
    }

    /// Writes a 4-byte length prefix.
    pub fn write_length(&mut self, offset: usize, length: usize) -> Result<(), BufferError> {
        let length = u32::try_from(length).map_err(|_| BufferError::CapacityExceeded {
            requested: length,
            limit: u32::MAX as usize,
        })?;
        self.write_u32(offset, length)
    }

    /// Writes a length-prefixed byte blob.
    pub fn write_bytes(&mut self, offset: usize, value: &[u8]) -> Result<(), BufferError> {
        self.write_length(offset, value.len())?;
        self.write_raw(offset + PREFIX_SIZE, value)
    }

    /// Writes a length-prefixed UTF-8 string, without terminator.
    pub fn write_string(&mut self, offset: usize, value: &str) -> Result<(), BufferError> {
        self.write_bytes(offset, value.as_bytes())
    }
}
