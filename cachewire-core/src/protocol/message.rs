//! The trait implemented by every type that travels as a direct message.

use bytes::{Buf, BufMut};

use super::{MessageReader, MessageWriter};
use crate::error::Result;

/// A message encoded field by field with a resumable cursor.
///
/// `write_to` and `read_from` are called repeatedly with successive buffers.
/// Each call continues at the field recorded in the writer or reader,
/// returns `Ok(false)` when the buffer runs out, and `Ok(true)` once the
/// last field is done. Fields must be visited in the same order in both
/// directions since the cursor addresses them by ordinal.
pub trait WireMessage {
    /// Type tag written in the message header.
    const DIRECT_TYPE: i8;

    /// Number of fields written after the header.
    const FIELDS_COUNT: u8;

    /// Writes the header and every field not yet written.
    fn write_to<B: BufMut>(&self, buf: &mut B, writer: &mut MessageWriter) -> Result<bool>;

    /// Reads the field count and every field not yet read.
    ///
    /// The type tag has already been consumed by the caller.
    fn read_from<B: Buf>(&mut self, buf: &mut B, reader: &mut MessageReader) -> Result<bool>;
}

/// Unwraps `Poll::Ready`, or returns `Ok(false)` from the enclosing
/// `read_from` when the reader needs more bytes.
macro_rules! ready_or_suspend {
    ($e:expr) => {
        match $e {
            std::task::Poll::Ready(v) => v,
            std::task::Poll::Pending => return Ok(false),
        }
    };
}

pub(crate) use ready_or_suspend;
