//! Growable output for marshalling cache objects.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CacheWireError, Result};
use crate::protocol::constants::NULL_ARRAY_LENGTH;

/// Trait for writing primitive values in the marshalled object format.
///
/// All multi-byte values are written in big-endian byte order.
pub trait DataOutput {
    /// Writes a single signed byte.
    fn write_byte(&mut self, v: i8) -> Result<()>;

    /// Writes a boolean as `0` or `1`.
    fn write_bool(&mut self, v: bool) -> Result<()>;

    /// Writes a 32-bit signed integer.
    fn write_int(&mut self, v: i32) -> Result<()>;

    /// Writes a 64-bit signed integer.
    fn write_long(&mut self, v: i64) -> Result<()>;

    /// Writes raw bytes without a length prefix.
    fn write_bytes(&mut self, v: &[u8]) -> Result<()>;

    /// Writes an `i32` length prefix followed by the bytes, or
    /// [`NULL_ARRAY_LENGTH`] when `v` is `None`.
    fn write_byte_array(&mut self, v: Option<&[u8]>) -> Result<()> {
        match v {
            Some(bytes) => {
                let len = i32::try_from(bytes.len()).map_err(|_| {
                    CacheWireError::Serialization(format!(
                        "byte array too long: {} bytes",
                        bytes.len()
                    ))
                })?;
                self.write_int(len)?;
                self.write_bytes(bytes)
            }
            None => self.write_int(NULL_ARRAY_LENGTH),
        }
    }

    /// Writes a UTF-8 string as a length-prefixed byte array.
    fn write_string(&mut self, v: &str) -> Result<()> {
        self.write_byte_array(Some(v.as_bytes()))
    }
}

/// A `BytesMut`-backed implementation of [`DataOutput`].
#[derive(Debug)]
pub struct ObjectDataOutput {
    buffer: BytesMut,
}

impl ObjectDataOutput {
    /// Creates an output with a small default capacity.
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Creates an output with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the output, returning the written bytes without copying.
    pub fn freeze(self) -> Bytes {
        self.buffer.freeze()
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for ObjectDataOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl DataOutput for ObjectDataOutput {
    fn write_byte(&mut self, v: i8) -> Result<()> {
        self.buffer.put_i8(v);
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.buffer.put_u8(u8::from(v));
        Ok(())
    }

    fn write_int(&mut self, v: i32) -> Result<()> {
        self.buffer.put_i32(v);
        Ok(())
    }

    fn write_long(&mut self, v: i64) -> Result<()> {
        self.buffer.put_i64(v);
        Ok(())
    }

    fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.buffer.put_slice(v);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_output_is_empty() {
        let output = ObjectDataOutput::new();
        assert!(output.is_empty());
        assert_eq!(output.len(), 0);
    }

    #[test]
    fn test_write_byte_negative() {
        let mut output = ObjectDataOutput::new();
        output.write_byte(-1).unwrap();
        assert_eq!(output.as_bytes(), &[0xFF]);
    }

    #[test]
    fn test_write_bool() {
        let mut output = ObjectDataOutput::new();
        output.write_bool(true).unwrap();
        output.write_bool(false).unwrap();
        assert_eq!(output.as_bytes(), &[1, 0]);
    }

    #[test]
    fn test_write_int_big_endian() {
        let mut output = ObjectDataOutput::new();
        output.write_int(0x01020304).unwrap();
        assert_eq!(output.as_bytes(), &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_write_long_big_endian() {
        let mut output = ObjectDataOutput::new();
        output.write_long(0x0102030405060708).unwrap();
        assert_eq!(
            output.as_bytes(),
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
    }

    #[test]
    fn test_write_byte_array() {
        let mut output = ObjectDataOutput::new();
        output.write_byte_array(Some(&[9u8, 8][..])).unwrap();
        assert_eq!(output.as_bytes(), &[0, 0, 0, 2, 9, 8]);
    }

    #[test]
    fn test_write_null_byte_array() {
        let mut output = ObjectDataOutput::new();
        output.write_byte_array(None).unwrap();
        assert_eq!(output.as_bytes(), &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_write_string() {
        let mut output = ObjectDataOutput::new();
        output.write_string("ab").unwrap();
        assert_eq!(output.as_bytes(), &[0, 0, 0, 2, b'a', b'b']);
    }

    #[test]
    fn test_freeze() {
        let mut output = ObjectDataOutput::with_capacity(8);
        output.write_int(42).unwrap();
        assert_eq!(&output.freeze()[..], &[0, 0, 0, 42]);
    }
}
