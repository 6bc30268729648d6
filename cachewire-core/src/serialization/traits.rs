//! Serialization traits and implementations for primitive types.

use bytes::Bytes;

use super::{DataInput, DataOutput};
use crate::error::{CacheWireError, Result};

/// Trait for types that can be written to the marshalled object format.
pub trait Serializable {
    /// Serializes this value to the given output.
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()>;

    /// Convenience method: serializes this value to bytes.
    fn to_bytes(&self) -> Result<Bytes>
    where
        Self: Sized,
    {
        let mut output = super::ObjectDataOutput::new();
        self.serialize(&mut output)?;
        Ok(output.freeze())
    }
}

/// Trait for types that can be read from the marshalled object format.
pub trait Deserializable: Sized {
    /// Deserializes a value from the given input.
    fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self>;

    /// Convenience method: deserializes a value from a byte slice.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut input = super::ObjectDataInput::from_slice(data);
        Self::deserialize(&mut input)
    }
}

impl Serializable for i8 {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        output.write_byte(*self)
    }
}

impl Deserializable for i8 {
    fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self> {
        input.read_byte()
    }
}

impl Serializable for bool {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        output.write_bool(*self)
    }
}

impl Deserializable for bool {
    fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self> {
        input.read_bool()
    }
}

impl Serializable for i32 {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        output.write_int(*self)
    }
}

impl Deserializable for i32 {
    fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self> {
        input.read_int()
    }
}

impl Serializable for i64 {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        output.write_long(*self)
    }
}

impl Deserializable for i64 {
    fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self> {
        input.read_long()
    }
}

impl Serializable for String {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        output.write_string(self)
    }
}

impl Serializable for str {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        output.write_string(self)
    }
}

impl Deserializable for String {
    fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self> {
        input.read_string()
    }
}

/// Byte arrays are length-prefixed; the null array is rejected.
impl Serializable for Bytes {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        output.write_byte_array(Some(&self[..]))
    }
}

impl Deserializable for Bytes {
    fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self> {
        input.read_byte_array()?.ok_or_else(|| {
            CacheWireError::Serialization("unexpected null byte array".to_string())
        })
    }
}

impl<T: Serializable> Serializable for Option<T> {
    fn serialize<W: DataOutput + ?Sized>(&self, output: &mut W) -> Result<()> {
        match self {
            Some(value) => {
                output.write_bool(true)?;
                value.serialize(output)
            }
            None => output.write_bool(false),
        }
    }
}

impl<T: Deserializable> Deserializable for Option<T> {
    fn deserialize<R: DataInput + ?Sized>(input: &mut R) -> Result<Self> {
        if input.read_bool()? {
            T::deserialize(input).map(Some)
        } else {
            Ok(None)
        }
    }
}
