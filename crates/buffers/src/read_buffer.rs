//! Immutable view over received bytes.

use crate::{BufferError, Decimal, Uuid, PREFIX_SIZE};

/// A read-only buffer over a byte slice.
///
/// Offsets passed to the `read_*` methods are relative to the base offset;
/// [`ReadBuffer::absolute`] is the single place where they are turned into
/// indices into the slice. The view is `Copy`, so re-basing for an embedded
/// struct is done with [`ReadBuffer::shifted`] rather than by mutation.
///
/// # Example
///
/// ```
/// use fbe_buffers::ReadBuffer;
///
/// let data = [0xff, 0x03, 0x00, 0x00, 0x00, b'a', b'b', b'c'];
/// let buffer = ReadBuffer::new(&data).shifted(1);
///
/// assert_eq!(buffer.read_string(0).unwrap(), "abc");
/// assert!(buffer.read_u64(4).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ReadBuffer<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ReadBuffer<'a> {
    /// Creates a reader with base offset 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Creates a reader with the given base offset.
    pub fn with_offset(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    /// The whole underlying slice, ignoring the base offset.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Total number of bytes in the underlying slice.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Current base offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Moves the base offset forward by `by` bytes.
    pub fn shift(&mut self, by: usize) {
        self.offset += by;
    }

    /// Undoes a matching [`ReadBuffer::shift`].
    pub fn unshift(&mut self, by: usize) {
        debug_assert!(by <= self.offset, "unshift past the start of the buffer");
        self.offset = self.offset.saturating_sub(by);
    }

    /// A copy of this view with the base moved forward by `by` bytes.
    pub fn shifted(&self, by: usize) -> Self {
        Self {
            data: self.data,
            offset: self.offset + by,
        }
    }

    /// Absolute index of `relative`, checking that `length` bytes fit.
    pub fn absolute(&self, relative: usize, length: usize) -> Result<usize, BufferError> {
        let out_of_bounds = || BufferError::OutOfBounds {
            offset: self.offset.saturating_add(relative),
            length,
            size: self.data.len(),
        };
        let at = self.offset.checked_add(relative).ok_or_else(out_of_bounds)?;
        match at.checked_add(length) {
            Some(end) if end <= self.data.len() => Ok(at),
            _ => Err(out_of_bounds()),
        }
    }

    /// Bytes available from `relative` to the end of the slice.
    pub fn remaining(&self, relative: usize) -> usize {
        self.data
            .len()
            .saturating_sub(self.offset.saturating_add(relative))
    }

    /// Borrows `length` raw bytes.
    pub fn slice(&self, offset: usize, length: usize) -> Result<&'a [u8], BufferError> {
        let at = self.absolute(offset, length)?;
        Ok(&self.data[at..at + length])
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N], BufferError> {
        let at = self.absolute(offset, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[at..at + N]);
        Ok(out)
    }

    /// Reads a boolean; any non-zero byte is `true`.
    #[inline]
    pub fn read_bool(&self, offset: usize) -> Result<bool, BufferError> {
        Ok(self.read_u8(offset)? != 0)
    }

    /// Reads a 1-byte character.
    #[inline]
    pub fn read_char(&self, offset: usize) -> Result<u8, BufferError> {
        self.read_u8(offset)
    }

    /// Reads a 4-byte Unicode code point.
    pub fn read_wchar(&self, offset: usize) -> Result<char, BufferError> {
        let code = self.read_u32(offset)?;
        char::from_u32(code).ok_or(BufferError::InvalidChar(code))
    }

    /// Reads a `u8`.
    #[inline]
    pub fn read_u8(&self, offset: usize) -> Result<u8, BufferError> {
        Ok(self.array::<1>(offset)?[0])
    }

    /// Reads an `i8`.
    #[inline]
    pub fn read_i8(&self, offset: usize) -> Result<i8, BufferError> {
        Ok(self.read_u8(offset)? as i8)
    }

    /// Reads a little-endian `u16`.
    #[inline]
    pub fn read_u16(&self, offset: usize) -> Result<u16, BufferError> {
        Ok(u16::from_le_bytes(self.array(offset)?))
    }

    /// Reads a little-endian `i16`.
    #[inline]
    pub fn read_i16(&self, offset: usize) -> Result<i16, BufferError> {
        Ok(i16::from_le_bytes(self.array(offset)?))
    }

    /// Reads a little-endian `u32`.
    #[inline]
    pub fn read_u32(&self, offset: usize) -> Result<u32, BufferError> {
        Ok(u32::from_le_bytes(self.array(offset)?))
    }

    /// Reads a little-endian `i32`.
    #[inline]
    pub fn read_i32(&self, offset: usize) -> Result<i32, BufferError> {
        Ok(i32::from_le_bytes(self.array(offset)?))
    }

    /// Reads a little-endian `u64`.
    #[inline]
    pub fn read_u64(&self, offset: usize) -> Result<u64, BufferError> {
        Ok(u64::from_le_bytes(self.array(offset)?))
    }

    /// Reads a little-endian `i64`.
    #[inline]
    pub fn read_i64(&self, offset: usize) -> Result<i64, BufferError> {
        Ok(i64::from_le_bytes(self.array(offset)?))
    }

    /// Reads a little-endian IEEE-754 `f32`.
    #[inline]
    pub fn read_f32(&self, offset: usize) -> Result<f32, BufferError> {
        Ok(f32::from_le_bytes(self.array(offset)?))
    }

    /// Reads a little-endian IEEE-754 `f64`.
    #[inline]
    pub fn read_f64(&self, offset: usize) -> Result<f64, BufferError> {
        Ok(f64::from_le_bytes(self.array(offset)?))
    }

    /// Reads nanoseconds since the Unix epoch.
    #[inline]
    pub fn read_timestamp(&self, offset: usize) -> Result<u64, BufferError> {
        self.read_u64(offset)
    }

    /// Reads 16 UUID bytes in RFC 4122 order.
    pub fn read_uuid(&self, offset: usize) -> Result<Uuid, BufferError> {
        Ok(Uuid::from_bytes(self.array(offset)?))
    }

    /// Reads a 16-byte [`Decimal`].
    pub fn read_decimal(&self, offset: usize) -> Result<Decimal, BufferError> {
        Decimal::from_bytes(&self.array(offset)?)
    }

    /// Reads a 4-byte length prefix and checks it against the bytes that
    /// follow it.
    pub fn read_length(&self, offset: usize) -> Result<usize, BufferError> {
        let length = self.read_u32(offset)? as usize;
        let available = self.remaining(offset + PREFIX_SIZE);
        if length > available {
            return Err(BufferError::InvalidLength { length, available });
        }
        Ok(length)
    }

    /// Reads a length-prefixed byte blob.
    pub fn read_bytes(&self, offset: usize) -> Result<Vec<u8>, BufferError> {
        let length = self.read_length(offset)?;
        Ok(self.slice(offset + PREFIX_SIZE, length)?.to_vec())
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&self, offset: usize) -> Result<String, BufferError> {
        let length = self.read_length(offset)?;
        let raw = self.slice(offset + PREFIX_SIZE, length)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| BufferError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let reader = ReadBuffer::new(&data);
        assert_eq!(reader.read_u16(0).unwrap(), 0x0201);
        assert_eq!(reader.read_u32(0).unwrap(), 0x04030201);
    }

    #[test]
    fn test_base_offset() {
        let data = [0x00, 0x00, 0x2a, 0x00];
        let reader = ReadBuffer::with_offset(&data, 2);
        assert_eq!(reader.read_u16(0).unwrap(), 42);
        assert_eq!(reader.absolute(0, 2).unwrap(), 2);
    }

    #[test]
    fn test_out_of_bounds() {
        let data = [0u8; 3];
        let reader = ReadBuffer::new(&data);
        assert_eq!(
            reader.read_u32(0),
            Err(BufferError::OutOfBounds {
                offset: 0,
                length: 4,
                size: 3
            })
        );
        assert!(reader.read_u8(3).is_err());
        assert!(reader.absolute(usize::MAX, 1).is_err());
    }

    #[test]
    fn test_length_prefix_too_large() {
        let data = [0x05, 0, 0, 0, b'a', b'b'];
        let reader = ReadBuffer::new(&data);
        assert_eq!(
            reader.read_string(0),
            Err(BufferError::InvalidLength {
                length: 5,
                available: 2
            })
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let data = [0x02, 0, 0, 0, 0xc3, 0x28];
        let reader = ReadBuffer::new(&data);
        assert_eq!(reader.read_string(0), Err(BufferError::InvalidUtf8));
        assert_eq!(reader.read_bytes(0).unwrap(), vec![0xc3, 0x28]);
    }

    #[test]
    fn test_invalid_wchar() {
        let data = 0xD800u32.to_le_bytes();
        let reader = ReadBuffer::new(&data);
        assert_eq!(reader.read_wchar(0), Err(BufferError::InvalidChar(0xD800)));
    }

    #[test]
    fn test_shifted_is_independent() {
        let data = [1, 2, 3];
        let reader = ReadBuffer::new(&data);
        let shifted = reader.shifted(2);
        assert_eq!(reader.read_u8(0).unwrap(), 1);
        assert_eq!(shifted.read_u8(0).unwrap(), 3);
    }
}
