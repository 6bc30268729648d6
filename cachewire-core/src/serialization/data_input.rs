//! Bounds-checked input for unmarshalling cache objects.

use bytes::{Buf, Bytes};

use crate::error::{CacheWireError, Result};
use crate::protocol::constants::NULL_ARRAY_LENGTH;

/// Trait for reading primitive values in the marshalled object format.
///
/// All multi-byte values are read in big-endian byte order.
pub trait DataInput {
    /// Reads a single signed byte.
    fn read_byte(&mut self) -> Result<i8>;

    /// Reads a boolean; any non-zero byte is `true`.
    fn read_bool(&mut self) -> Result<bool>;

    /// Reads a 32-bit signed integer.
    fn read_int(&mut self) -> Result<i32>;

    /// Reads a 64-bit signed integer.
    fn read_long(&mut self) -> Result<i64>;

    /// Reads exactly `len` raw bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Bytes>;

    /// Reads a length-prefixed byte array; a length of `-1` yields `None`.
    fn read_byte_array(&mut self) -> Result<Option<Bytes>> {
        match self.read_int()? {
            NULL_ARRAY_LENGTH => Ok(None),
            len if len < 0 => Err(CacheWireError::Serialization(format!(
                "invalid byte array length: {}",
                len
            ))),
            len => self.read_bytes(len as usize).map(Some),
        }
    }

    /// Reads a UTF-8 string written by `DataOutput::write_string`.
    fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_byte_array()?.ok_or_else(|| {
            CacheWireError::Serialization("unexpected null string".to_string())
        })?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CacheWireError::Serialization(format!("invalid UTF-8 string: {}", e)))
    }
}

/// A [`DataInput`] over an immutable `Bytes` buffer.
///
/// Byte arrays are returned as zero-copy slices of the source buffer.
#[derive(Debug)]
pub struct ObjectDataInput {
    data: Bytes,
    len: usize,
}

impl ObjectDataInput {
    /// Creates an input reading from the start of `data`.
    pub fn new(data: Bytes) -> Self {
        let len = data.len();
        Self { data, len }
    }

    /// Creates an input from a borrowed slice, copying it once.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Returns the number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }

    /// Returns the number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.len - self.data.remaining()
    }

    fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.data.remaining() < n {
            Err(CacheWireError::Serialization(format!(
                "insufficient data: need {} bytes, have {}",
                n,
                self.data.remaining()
            )))
        } else {
            Ok(())
        }
    }
}

impl DataInput for ObjectDataInput {
    fn read_byte(&mut self) -> Result<i8> {
        self.ensure_remaining(1)?;
        Ok(self.data.get_i8())
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.ensure_remaining(1)?;
        Ok(self.data.get_u8() != 0)
    }

    fn read_int(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(self.data.get_i32())
    }

    fn read_long(&mut self) -> Result<i64> {
        self.ensure_remaining(8)?;
        Ok(self.data.get_i64())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.ensure_remaining(len)?;
        Ok(self.data.split_to(len))
    }
}
