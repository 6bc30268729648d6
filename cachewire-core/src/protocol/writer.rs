//! Resumable writer for direct messages.

use bytes::BufMut;
use tracing::trace;

use super::constants::{NULL_ARRAY_LENGTH, NULL_MESSAGE_TYPE};
use super::WireMessage;
use crate::error::{CacheWireError, Result};

/// Progress of one message in the nesting stack.
#[derive(Debug, Default, Clone, Copy)]
struct WriteLevel {
    state: usize,
    header_written: bool,
}

/// Cursor for writing one message tree across successive buffers.
///
/// The writer keeps a stack with one level per message being written (the
/// root plus any nested message in flight) and the byte offset reached
/// inside the field currently being written. Values are re-serialized on
/// every call and the already written prefix is skipped, so the output does
/// not depend on where buffer boundaries fall.
#[derive(Debug, Default)]
pub struct MessageWriter {
    levels: Vec<WriteLevel>,
    depth: usize,
    offset: usize,
    complete: bool,
}

impl MessageWriter {
    /// Creates a writer positioned before the header of a new message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes as much of `msg` as fits into `buf`.
    ///
    /// Returns `Ok(true)` once the whole message has been written across
    /// this and previous calls.
    pub fn write<M: WireMessage, B: BufMut>(&mut self, buf: &mut B, msg: &M) -> Result<bool> {
        if self.complete {
            return Err(CacheWireError::ContractViolation(
                "message already fully written; reset the writer before reuse".to_string(),
            ));
        }

        if self.levels.is_empty() {
            self.levels.push(WriteLevel::default());
        }
        self.depth = 0;

        let done = msg.write_to(buf, self)?;
        if done {
            self.levels.clear();
            self.complete = true;
        }
        Ok(done)
    }

    /// Returns `true` once a root message has been fully written.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Discards all progress so the writer can be used for a new message.
    pub fn reset(&mut self) {
        self.levels.clear();
        self.depth = 0;
        self.offset = 0;
        self.complete = false;
    }

    /// Returns `true` if the current message's header has been written.
    pub fn is_header_written(&self) -> bool {
        self.levels[self.depth].header_written
    }

    /// Marks the current message's header as written.
    pub fn on_header_written(&mut self) {
        self.levels[self.depth].header_written = true;
    }

    /// Returns the ordinal of the next field of the current message.
    pub fn state(&self) -> usize {
        self.levels[self.depth].state
    }

    /// Advances the current message to its next field.
    pub fn increment_state(&mut self) {
        self.levels[self.depth].state += 1;
    }

    /// Writes a message header.
    pub fn write_header<B: BufMut>(&mut self, buf: &mut B, direct_type: i8, fields: u8) -> bool {
        self.put(buf, &[&[direct_type as u8, fields]])
    }

    /// Writes the current message's header unless an earlier call already did.
    pub fn write_header_once<B: BufMut>(&mut self, buf: &mut B, direct_type: i8, fields: u8) -> bool {
        if self.is_header_written() {
            return true;
        }
        if !self.write_header(buf, direct_type, fields) {
            return false;
        }
        self.on_header_written();
        true
    }

    /// Writes a signed byte.
    pub fn write_byte<B: BufMut>(&mut self, buf: &mut B, v: i8) -> bool {
        self.put(buf, &[&[v as u8]])
    }

    /// Writes a big-endian `i32`.
    pub fn write_int<B: BufMut>(&mut self, buf: &mut B, v: i32) -> bool {
        self.put(buf, &[&v.to_be_bytes()])
    }

    /// Writes a big-endian `i64`.
    pub fn write_long<B: BufMut>(&mut self, buf: &mut B, v: i64) -> bool {
        self.put(buf, &[&v.to_be_bytes()])
    }

    /// Writes a length-prefixed byte array, or a `-1` length for `None`.
    pub fn write_byte_array<B: BufMut>(&mut self, buf: &mut B, v: Option<&[u8]>) -> Result<bool> {
        match v {
            Some(bytes) => {
                let len = array_length_prefix(bytes.len())?;
                Ok(self.put(buf, &[&len.to_be_bytes(), bytes]))
            }
            None => Ok(self.put(buf, &[&NULL_ARRAY_LENGTH.to_be_bytes()])),
        }
    }

    /// Writes a nested message, or the null marker for `None`.
    pub fn write_message<M: WireMessage, B: BufMut>(
        &mut self,
        buf: &mut B,
        msg: Option<&M>,
    ) -> Result<bool> {
        let Some(msg) = msg else {
            return Ok(self.write_byte(buf, NULL_MESSAGE_TYPE));
        };

        let parent = self.depth;
        if self.levels.len() == parent + 1 {
            self.levels.push(WriteLevel::default());
        }

        self.depth = parent + 1;
        let result = msg.write_to(buf, self);
        self.depth = parent;

        let done = result?;
        if done {
            self.levels.truncate(parent + 1);
        }
        Ok(done)
    }

    /// Copies the not yet written part of `parts` into `buf`.
    ///
    /// `parts` is treated as one contiguous field; `self.offset` bytes of it
    /// were written by earlier calls.
    fn put<B: BufMut>(&mut self, buf: &mut B, parts: &[&[u8]]) -> bool {
        let mut skip = self.offset;
        for part in parts {
            if skip >= part.len() {
                skip -= part.len();
                continue;
            }

            let pending = &part[skip..];
            skip = 0;

            let n = pending.len().min(buf.remaining_mut());
            buf.put_slice(&pending[..n]);
            self.offset += n;

            if n < pending.len() {
                trace!(
                    depth = self.depth,
                    field = self.levels[self.depth].state,
                    offset = self.offset,
                    "buffer full, suspending write"
                );
                return false;
            }
        }

        self.offset = 0;
        true
    }
}

/// Converts an array length into its `i32` wire prefix.
fn array_length_prefix(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| {
        CacheWireError::ContractViolation(format!(
            "byte array of {len} bytes cannot be length-prefixed"
        ))
    })
}
