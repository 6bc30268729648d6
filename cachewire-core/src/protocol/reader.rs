//! Resumable reader for direct messages.

use std::task::Poll;

use bytes::{Buf, Bytes, BytesMut};
use tracing::{trace, warn};

use super::constants::{DEFAULT_MAX_BYTE_ARRAY_LEN, NULL_ARRAY_LENGTH, NULL_MESSAGE_TYPE};
use super::WireMessage;
use crate::error::{CacheWireError, Result};

/// Progress of one message in the nesting stack.
#[derive(Debug, Default, Clone, Copy)]
struct ReadLevel {
    state: usize,
    header_read: bool,
    nested_type_read: bool,
}

/// Cursor for reading one message tree from successive buffers.
///
/// Partially received values are accumulated internally, so every byte
/// handed to the reader is consumed and callers never need to retain or
/// re-feed input.
#[derive(Debug)]
pub struct MessageReader {
    levels: Vec<ReadLevel>,
    depth: usize,
    root_type_read: bool,
    scratch: [u8; 8],
    filled: usize,
    array_len: Option<usize>,
    array: BytesMut,
    max_array_len: usize,
    complete: bool,
}

impl Default for MessageReader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BYTE_ARRAY_LEN)
    }
}

impl MessageReader {
    /// Creates a reader that rejects byte arrays longer than `max_array_len`.
    pub fn new(max_array_len: usize) -> Self {
        Self {
            levels: Vec::new(),
            depth: 0,
            root_type_read: false,
            scratch: [0; 8],
            filled: 0,
            array_len: None,
            array: BytesMut::new(),
            max_array_len,
            complete: false,
        }
    }

    /// Reads as much of `msg` as `buf` provides, starting with its type tag.
    ///
    /// Returns `Ok(true)` once the whole message has been read across this
    /// and previous calls.
    pub fn read<M: WireMessage, B: Buf>(&mut self, buf: &mut B, msg: &mut M) -> Result<bool> {
        if self.complete {
            return Err(CacheWireError::ContractViolation(
                "message already fully read; reset the reader before reuse".to_string(),
            ));
        }

        if !self.root_type_read {
            let Poll::Ready(direct_type) = self.read_byte(buf) else {
                return Ok(false);
            };
            check_type::<M>(direct_type)?;
            self.root_type_read = true;
            self.levels.push(ReadLevel::default());
        }
        self.depth = 0;

        let done = msg.read_from(buf, self)?;
        if done {
            self.levels.clear();
            self.complete = true;
        }
        Ok(done)
    }

    /// Returns `true` once a root message has been fully read.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Discards all progress so the reader can be used for a new message.
    pub fn reset(&mut self) {
        self.levels.clear();
        self.depth = 0;
        self.root_type_read = false;
        self.filled = 0;
        self.array_len = None;
        self.array.clear();
        self.complete = false;
    }

    /// Returns the ordinal of the next field of the current message.
    pub fn state(&self) -> usize {
        self.levels[self.depth].state
    }

    /// Advances the current message to its next field.
    pub fn increment_state(&mut self) {
        self.levels[self.depth].state += 1;
    }

    /// Reads and checks the field count that follows the type tag.
    pub fn before_message_read<B: Buf>(&mut self, buf: &mut B, fields: u8) -> Result<Poll<()>> {
        if self.levels[self.depth].header_read {
            return Ok(Poll::Ready(()));
        }

        let Poll::Ready(count) = self.read_byte(buf) else {
            return Ok(Poll::Pending);
        };
        if count as u8 != fields {
            warn!(expected = fields, actual = count as u8, "field count mismatch");
            return Err(CacheWireError::Protocol(format!(
                "expected {} fields, header declares {}",
                fields, count as u8
            )));
        }

        self.levels[self.depth].header_read = true;
        Ok(Poll::Ready(()))
    }

    /// Reads a signed byte.
    pub fn read_byte<B: Buf>(&mut self, buf: &mut B) -> Poll<i8> {
        self.read_fixed::<1, B>(buf).map(|b| b[0] as i8)
    }

    /// Reads a big-endian `i32`.
    pub fn read_int<B: Buf>(&mut self, buf: &mut B) -> Poll<i32> {
        self.read_fixed::<4, B>(buf).map(i32::from_be_bytes)
    }

    /// Reads a big-endian `i64`.
    pub fn read_long<B: Buf>(&mut self, buf: &mut B) -> Poll<i64> {
        self.read_fixed::<8, B>(buf).map(i64::from_be_bytes)
    }

    /// Reads a length-prefixed byte array; a `-1` length yields `None`.
    pub fn read_byte_array<B: Buf>(&mut self, buf: &mut B) -> Result<Poll<Option<Bytes>>> {
        let len = match self.array_len {
            Some(len) => len,
            None => {
                let Poll::Ready(raw) = self.read_int(buf) else {
                    return Ok(Poll::Pending);
                };
                let len = self.check_array_len(raw)?;
                match len {
                    Some(len) => {
                        self.array_len = Some(len);
                        self.array.reserve(len.min(buf.remaining()));
                        len
                    }
                    None => return Ok(Poll::Ready(None)),
                }
            }
        };

        while self.array.len() < len && buf.has_remaining() {
            let chunk = buf.chunk();
            let n = chunk.len().min(len - self.array.len());
            self.array.extend_from_slice(&chunk[..n]);
            buf.advance(n);
        }

        if self.array.len() < len {
            trace!(read = self.array.len(), len, "byte array incomplete, suspending read");
            return Ok(Poll::Pending);
        }

        self.array_len = None;
        Ok(Poll::Ready(Some(self.array.split().freeze())))
    }

    /// Reads a nested message into `slot`.
    ///
    /// A null marker leaves `slot` empty. Otherwise a fresh `M` is placed in
    /// `slot` as soon as the type tag is read and filled in across calls, so
    /// the caller must hand back the same slot until the read completes.
    pub fn read_message<M: WireMessage + Default, B: Buf>(
        &mut self,
        buf: &mut B,
        slot: &mut Option<M>,
    ) -> Result<Poll<()>> {
        let parent = self.depth;

        if !self.levels[parent].nested_type_read {
            let Poll::Ready(direct_type) = self.read_byte(buf) else {
                return Ok(Poll::Pending);
            };
            if direct_type == NULL_MESSAGE_TYPE {
                *slot = None;
                return Ok(Poll::Ready(()));
            }
            check_type::<M>(direct_type)?;

            *slot = Some(M::default());
            self.levels[parent].nested_type_read = true;
            self.levels.push(ReadLevel::default());
        }

        let Some(msg) = slot.as_mut() else {
            return Err(CacheWireError::ContractViolation(
                "nested message slot emptied while its read was in progress".to_string(),
            ));
        };

        self.depth = parent + 1;
        let result = msg.read_from(buf, self);
        self.depth = parent;

        if !result? {
            return Ok(Poll::Pending);
        }

        self.levels.truncate(parent + 1);
        self.levels[parent].nested_type_read = false;
        Ok(Poll::Ready(()))
    }

    fn read_fixed<const N: usize, B: Buf>(&mut self, buf: &mut B) -> Poll<[u8; N]> {
        while self.filled < N && buf.has_remaining() {
            let n = (N - self.filled).min(buf.remaining());
            buf.copy_to_slice(&mut self.scratch[self.filled..self.filled + n]);
            self.filled += n;
        }

        if self.filled < N {
            return Poll::Pending;
        }

        let mut out = [0u8; N];
        out.copy_from_slice(&self.scratch[..N]);
        self.filled = 0;
        Poll::Ready(out)
    }

    fn check_array_len(&self, raw: i32) -> Result<Option<usize>> {
        match raw {
            NULL_ARRAY_LENGTH => Ok(None),
            len if len < 0 => Err(CacheWireError::Protocol(format!(
                "invalid byte array length: {}",
                len
            ))),
            len if len as usize > self.max_array_len => {
                warn!(len, max = self.max_array_len, "rejecting oversized byte array");
                Err(CacheWireError::Protocol(format!(
                    "byte array of {} bytes exceeds limit of {}",
                    len, self.max_array_len
                )))
            }
            len => Ok(Some(len as usize)),
        }
    }
}

fn check_type<M: WireMessage>(direct_type: i8) -> Result<()> {
    if direct_type == M::DIRECT_TYPE {
        return Ok(());
    }
    warn!(expected = M::DIRECT_TYPE, actual = direct_type, "unexpected message type");
    Err(CacheWireError::Protocol(format!(
        "expected message type {}, got {}",
        M::DIRECT_TYPE,
        direct_type
    )))
}
