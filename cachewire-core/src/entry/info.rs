//! The cache entry record exchanged between nodes.

use std::fmt;

use bytes::{Buf, BufMut, Bytes};
use tracing::{error, warn};

use super::cache_object::{CacheObject, KeyCacheObject};
use super::expiry;
use super::version::CacheVersion;
use crate::error::{CacheWireError, Result};
use crate::protocol::constants::ENTRY_INFO_TYPE;
use crate::protocol::{ready_or_suspend, MessageReader, MessageWriter, WireMessage};

/// The key of an entry: a key object, or raw key bytes read from storage.
#[derive(Debug, Clone)]
pub enum EntryKey {
    /// A key object, materialized or still in byte form.
    Decoded(KeyCacheObject),
    /// Raw encoded key bytes.
    Raw(Bytes),
}

impl EntryKey {
    /// Returns the key object, if this is a decoded key.
    pub fn as_object(&self) -> Option<&KeyCacheObject> {
        match self {
            EntryKey::Decoded(key) => Some(key),
            EntryKey::Raw(_) => None,
        }
    }

    /// Returns the raw key bytes, if this is a raw key.
    pub fn as_raw(&self) -> Option<&Bytes> {
        match self {
            EntryKey::Decoded(_) => None,
            EntryKey::Raw(bytes) => Some(bytes),
        }
    }

    /// Returns `true` for raw key bytes.
    pub fn is_raw(&self) -> bool {
        matches!(self, EntryKey::Raw(_))
    }
}

impl From<KeyCacheObject> for EntryKey {
    fn from(key: KeyCacheObject) -> Self {
        EntryKey::Decoded(key)
    }
}

impl From<Bytes> for EntryKey {
    fn from(bytes: Bytes) -> Self {
        EntryKey::Raw(bytes)
    }
}

/// A single cache entry as shipped between nodes.
///
/// Field order on the wire is fixed:
/// `cache_id, expire_time, key, key_bytes, ttl, value, version`.
/// The `is_new` and `deleted` flags are local and never encoded.
#[derive(Debug, Clone, Default)]
pub struct EntryInfo {
    pub(super) cache_id: i32,
    pub(super) key: Option<EntryKey>,
    pub(super) value: Option<CacheObject>,
    pub(super) ttl: i64,
    pub(super) expire_time: i64,
    pub(super) version: CacheVersion,
    is_new: bool,
    deleted: bool,
}

impl EntryInfo {
    /// Creates an entry for `cache_id` with no key, no value and no expiry.
    pub fn new(cache_id: i32) -> Self {
        Self {
            cache_id,
            ..Self::default()
        }
    }

    /// Sets the key object.
    pub fn with_key(mut self, key: KeyCacheObject) -> Self {
        self.key = Some(EntryKey::Decoded(key));
        self
    }

    /// Sets raw key bytes.
    pub fn with_key_bytes(mut self, bytes: Bytes) -> Self {
        self.key = Some(EntryKey::Raw(bytes));
        self
    }

    /// Sets the value.
    pub fn with_value(mut self, value: CacheObject) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets the time to live in milliseconds.
    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the absolute expire time in epoch milliseconds.
    pub fn with_expire_time(mut self, expire_time: i64) -> Self {
        self.expire_time = expire_time;
        self
    }

    /// Sets the version.
    pub fn with_version(mut self, version: CacheVersion) -> Self {
        self.version = version;
        self
    }

    /// Returns the ID of the owning cache.
    pub fn cache_id(&self) -> i32 {
        self.cache_id
    }

    /// Sets the ID of the owning cache.
    pub fn set_cache_id(&mut self, cache_id: i32) {
        self.cache_id = cache_id;
    }

    /// Returns the key in whichever form it is held.
    pub fn key(&self) -> Option<&EntryKey> {
        self.key.as_ref()
    }

    /// Returns the key object, if the key is held as one.
    pub fn key_object(&self) -> Option<&KeyCacheObject> {
        self.key.as_ref().and_then(EntryKey::as_object)
    }

    /// Returns the raw key bytes, if the key is held as such.
    pub fn key_bytes(&self) -> Option<&Bytes> {
        self.key.as_ref().and_then(EntryKey::as_raw)
    }

    /// Replaces the key.
    pub fn set_key(&mut self, key: impl Into<EntryKey>) {
        self.key = Some(key.into());
    }

    /// Removes and returns the key.
    pub fn take_key(&mut self) -> Option<EntryKey> {
        self.key.take()
    }

    /// Returns the value; `None` for a tombstone.
    pub fn value(&self) -> Option<&CacheObject> {
        self.value.as_ref()
    }

    /// Replaces the value.
    pub fn set_value(&mut self, value: Option<CacheObject>) {
        self.value = value;
    }

    /// Returns `true` if the entry carries no value.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the time to live in milliseconds; `0` means no TTL.
    pub fn ttl(&self) -> i64 {
        self.ttl
    }

    /// Sets the time to live in milliseconds.
    pub fn set_ttl(&mut self, ttl: i64) {
        self.ttl = ttl;
    }

    /// Returns the absolute expire time; `0` means never.
    pub fn expire_time(&self) -> i64 {
        self.expire_time
    }

    /// Sets the absolute expire time.
    pub fn set_expire_time(&mut self, expire_time: i64) {
        self.expire_time = expire_time;
    }

    /// Returns the version.
    pub fn version(&self) -> CacheVersion {
        self.version
    }

    /// Sets the version.
    pub fn set_version(&mut self, version: CacheVersion) {
        self.version = version;
    }

    /// Returns `true` if the entry was created by the update being shipped.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Marks the entry as newly created.
    pub fn set_new(&mut self, is_new: bool) {
        self.is_new = is_new;
    }

    /// Returns `true` if the entry was removed locally.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Marks the entry as removed locally.
    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    /// Returns the lifetime left at `now_ms`; `None` if the entry never expires.
    pub fn remaining_time(&self, now_ms: i64) -> Option<i64> {
        expiry::remaining_time(self.expire_time, now_ms)
    }

    /// Sets the expire time from a remaining lifetime measured at `now_ms`.
    pub fn set_remaining_time(&mut self, remaining: Option<i64>, now_ms: i64) {
        self.expire_time = expiry::expire_time_from_remaining(remaining, now_ms);
    }

    /// Returns `true` if the entry has expired at `now_ms`.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        expiry::is_expired(self.expire_time, now_ms)
    }

    fn check_wire_ready(&self) -> Result<()> {
        match &self.key {
            None => return Err(self.contract_violation("entry has neither a key nor key bytes")),
            Some(EntryKey::Decoded(key)) if !key.is_marshalled() => {
                return Err(self.contract_violation("key must be marshalled before encoding"))
            }
            Some(_) => {}
        }

        if self.value.as_ref().is_some_and(|v| !v.is_marshalled()) {
            return Err(self.contract_violation("value must be marshalled before encoding"));
        }
        Ok(())
    }

    fn contract_violation(&self, msg: &str) -> CacheWireError {
        error!(cache_id = self.cache_id, "{}", msg);
        CacheWireError::ContractViolation(msg.to_string())
    }
}

impl WireMessage for EntryInfo {
    const DIRECT_TYPE: i8 = ENTRY_INFO_TYPE;
    const FIELDS_COUNT: u8 = 7;

    fn write_to<B: BufMut>(&self, buf: &mut B, writer: &mut MessageWriter) -> Result<bool> {
        if !writer.is_header_written() {
            self.check_wire_ready()?;
        }
        if !writer.write_header_once(buf, Self::DIRECT_TYPE, Self::FIELDS_COUNT) {
            return Ok(false);
        }

        loop {
            let done = match writer.state() {
                0 => writer.write_int(buf, self.cache_id),
                1 => writer.write_long(buf, self.expire_time),
                2 => writer.write_message(buf, self.key_object())?,
                3 => writer.write_byte_array(buf, self.key_bytes().map(|b| &b[..]))?,
                4 => writer.write_long(buf, self.ttl),
                5 => writer.write_message(buf, self.value.as_ref())?,
                6 => writer.write_message(buf, Some(&self.version))?,
                _ => return Ok(true),
            };
            if !done {
                return Ok(false);
            }
            writer.increment_state();
        }
    }

    fn read_from<B: Buf>(&mut self, buf: &mut B, reader: &mut MessageReader) -> Result<bool> {
        ready_or_suspend!(reader.before_message_read(buf, Self::FIELDS_COUNT)?);

        loop {
            match reader.state() {
                0 => self.cache_id = ready_or_suspend!(reader.read_int(buf)),
                1 => self.expire_time = ready_or_suspend!(reader.read_long(buf)),
                2 => {
                    let mut slot = match self.key.take() {
                        Some(EntryKey::Decoded(key)) => Some(key),
                        _ => None,
                    };
                    let poll = reader.read_message(buf, &mut slot);
                    self.key = slot.map(EntryKey::Decoded);
                    ready_or_suspend!(poll?);
                }
                3 => {
                    if let Some(bytes) = ready_or_suspend!(reader.read_byte_array(buf)?) {
                        if self.key.is_some() {
                            warn!(cache_id = self.cache_id, "entry carries both a key and key bytes");
                            return Err(CacheWireError::Protocol(
                                "entry carries both a key and key bytes".to_string(),
                            ));
                        }
                        self.key = Some(EntryKey::Raw(bytes));
                    }
                }
                4 => self.ttl = ready_or_suspend!(reader.read_long(buf)),
                5 => ready_or_suspend!(reader.read_message(buf, &mut self.value)?),
                6 => {
                    let mut slot = Some(self.version);
                    let poll = reader.read_message(buf, &mut slot)?;
                    let Some(version) = slot else {
                        warn!(cache_id = self.cache_id, "entry arrived without a version");
                        return Err(CacheWireError::Protocol(
                            "entry arrived without a version".to_string(),
                        ));
                    };
                    self.version = version;
                    ready_or_suspend!(poll);
                }
                _ => return Ok(true),
            }
            reader.increment_state();
        }
    }
}

impl fmt::Display for EntryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryInfo[cache_id={}, key=", self.cache_id)?;
        match &self.key {
            None => write!(f, "none")?,
            Some(EntryKey::Raw(bytes)) => write!(f, "raw({} bytes)", bytes.len())?,
            Some(EntryKey::Decoded(key)) => match key.bytes() {
                Some(bytes) => write!(f, "decoded({} bytes)", bytes.len())?,
                None => write!(f, "decoded(unmarshalled)")?,
            },
        }
        match self.value.as_ref().map(|v| v.bytes().map(Bytes::len)) {
            None => write!(f, ", value=tombstone")?,
            Some(Some(len)) => write!(f, ", value={} bytes", len)?,
            Some(None) => write!(f, ", value=unmarshalled")?,
        }
        write!(f, ", ttl={}, expire_time=", self.ttl)?;
        if self.expire_time == expiry::NEVER_EXPIRES {
            write!(f, "never")?;
        } else {
            write!(f, "{}", self.expire_time)?;
        }
        write!(f, ", version={}]", self.version)
    }
}
