//! Encoder and decoder for cache entry records.
//!
//! Both are driven by a non-blocking transport: each call is handed
//! whatever buffer space (or input) is available and returns `Ok(false)`
//! when it runs out, keeping its progress for the next call.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::entry::EntryInfo;
use crate::error::{CacheWireError, Result};
use crate::protocol::constants::{ARRAY_LENGTH_SIZE, MESSAGE_HEADER_SIZE};
use crate::protocol::{MessageReader, MessageWriter};

/// Header plus the cache ID, expire time and ttl fields.
const ENTRY_FIXED_SIZE: usize = MESSAGE_HEADER_SIZE + 4 + 8 + 8;

/// Encoded size of a version message.
const VERSION_SIZE: usize = MESSAGE_HEADER_SIZE + 8 + 4 + 8 + 4;

/// Encoded size of an absent nested message or byte array.
const NULL_MESSAGE_SIZE: usize = 1;

/// Resumable encoder for one [`EntryInfo`] at a time.
#[derive(Debug, Default)]
pub struct EntryEncoder {
    writer: MessageWriter,
    bytes_written: usize,
}

impl EntryEncoder {
    /// Creates an encoder positioned before the first byte of an entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes as much of `entry` as fits into `dst`.
    ///
    /// Returns `Ok(true)` once the entry has been written completely. The
    /// entry must be passed unchanged on every call until then, and its key
    /// and value must already be marshalled (see
    /// [`EntryInfo::prepare_for_wire`]).
    pub fn encode<B: BufMut>(&mut self, entry: &EntryInfo, dst: &mut B) -> Result<bool> {
        let before = dst.remaining_mut();
        let result = self.writer.write(dst, entry);
        self.bytes_written += before.saturating_sub(dst.remaining_mut());

        let done = result?;
        if done {
            debug!(
                cache_id = entry.cache_id(),
                bytes = self.bytes_written,
                "entry encoded"
            );
        } else {
            trace!(
                cache_id = entry.cache_id(),
                bytes = self.bytes_written,
                "entry encode suspended"
            );
        }
        Ok(done)
    }

    /// Returns `true` once the current entry has been written completely.
    pub fn is_complete(&self) -> bool {
        self.writer.is_complete()
    }

    /// Returns the number of bytes written for the current entry so far.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Prepares the encoder for a new entry.
    pub fn reset(&mut self) {
        self.writer.reset();
        self.bytes_written = 0;
    }

    /// Returns the exact number of bytes [`encode`](Self::encode) produces
    /// for `entry`.
    pub fn encoded_len(entry: &EntryInfo) -> Result<usize> {
        let key_len = match (entry.key_object(), entry.key_bytes()) {
            (Some(key), None) => {
                let bytes = key.bytes().ok_or_else(unmarshalled)?;
                nested_object_size(bytes.len()) + ARRAY_LENGTH_SIZE
            }
            (None, Some(bytes)) => NULL_MESSAGE_SIZE + ARRAY_LENGTH_SIZE + bytes.len(),
            _ => {
                return Err(CacheWireError::ContractViolation(
                    "entry has neither a key nor key bytes".to_string(),
                ))
            }
        };
        let value_len = match entry.value() {
            Some(value) => nested_object_size(value.bytes().ok_or_else(unmarshalled)?.len()),
            None => NULL_MESSAGE_SIZE,
        };
        Ok(ENTRY_FIXED_SIZE + key_len + value_len + VERSION_SIZE)
    }

    /// Encodes `entry` into a single buffer.
    pub fn encode_to_bytes(entry: &EntryInfo) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(Self::encoded_len(entry)?);
        Self::new().encode(entry, &mut dst)?;
        Ok(dst.freeze())
    }
}

fn nested_object_size(payload_len: usize) -> usize {
    MESSAGE_HEADER_SIZE + ARRAY_LENGTH_SIZE + payload_len
}

fn unmarshalled() -> CacheWireError {
    CacheWireError::ContractViolation("entry must be marshalled before encoding".to_string())
}

/// Resumable decoder for one [`EntryInfo`] at a time.
///
/// Every byte handed to [`decode`](Self::decode) is consumed up to the end
/// of the entry; bytes after it are left in the buffer.
#[derive(Debug)]
pub struct EntryDecoder {
    reader: MessageReader,
    bytes_read: usize,
}

impl Default for EntryDecoder {
    fn default() -> Self {
        Self::with_config(&CodecConfig::default())
    }
}

impl EntryDecoder {
    /// Creates a decoder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decoder using the limits in `config`.
    pub fn with_config(config: &CodecConfig) -> Self {
        Self {
            reader: MessageReader::new(config.max_byte_array_len()),
            bytes_read: 0,
        }
    }

    /// Reads as much of an entry from `src` into `entry` as is available.
    ///
    /// Returns `Ok(true)` once the entry has been read completely. The same
    /// `entry` must be passed on every call until then.
    pub fn decode<B: Buf>(&mut self, src: &mut B, entry: &mut EntryInfo) -> Result<bool> {
        let before = src.remaining();
        let result = self.reader.read(src, entry);
        self.bytes_read += before.saturating_sub(src.remaining());

        let done = result?;
        if done {
            debug!(
                cache_id = entry.cache_id(),
                bytes = self.bytes_read,
                tombstone = entry.is_tombstone(),
                "entry decoded"
            );
        } else {
            trace!(bytes = self.bytes_read, "entry decode suspended");
        }
        Ok(done)
    }

    /// Returns `true` once the current entry has been read completely.
    pub fn is_complete(&self) -> bool {
        self.reader.is_complete()
    }

    /// Returns the number of bytes consumed for the current entry so far.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Prepares the decoder for a new entry.
    pub fn reset(&mut self) {
        self.reader.reset();
        self.bytes_read = 0;
    }

    /// Decodes one complete entry from `src`.
    ///
    /// Fails with [`CacheWireError::Protocol`] if `src` ends before the
    /// entry does.
    pub fn decode_from_bytes(&mut self, mut src: &[u8]) -> Result<EntryInfo> {
        let mut entry = EntryInfo::default();
        if !self.decode(&mut src, &mut entry)? {
            return Err(CacheWireError::Protocol(format!(
                "entry truncated after {} bytes",
                self.bytes_read
            )));
        }
        Ok(entry)
    }
}
