//! Resumable wire codec for cache entry records.
//!
//! An [`EntryInfo`] is written and read field by field across buffers of
//! any size. [`EntryEncoder`] and [`EntryDecoder`] return `Ok(false)` when
//! the buffer runs out and continue at the same byte on the next call, so
//! a transport can drive them from a non-blocking I/O loop.
//!
//! Keys and values travel as marshalled bytes. They are produced from
//! domain objects with [`EntryInfo::prepare_for_wire`] before encoding and
//! turned back into objects with [`EntryInfo::materialize_from_wire`] after
//! decoding, using a [`CacheObjectContext`].
//!
//! ```
//! use bytes::Bytes;
//! use cachewire_core::{CacheObject, CacheVersion, EntryDecoder, EntryEncoder, EntryInfo, KeyCacheObject};
//!
//! let entry = EntryInfo::new(7)
//!     .with_key(KeyCacheObject::from_bytes(Bytes::from_static(b"key")))
//!     .with_value(CacheObject::from_bytes(Bytes::from_static(b"value")))
//!     .with_version(CacheVersion::new(1, 0, 1, 0));
//!
//! let mut encoder = EntryEncoder::new();
//! let mut wire = Vec::new();
//! let mut chunk = [0u8; 16];
//! loop {
//!     let mut dst = &mut chunk[..];
//!     let done = encoder.encode(&entry, &mut dst).unwrap();
//!     let written = 16 - dst.len();
//!     wire.extend_from_slice(&chunk[..written]);
//!     if done {
//!         break;
//!     }
//! }
//!
//! let decoded = EntryDecoder::new().decode_from_bytes(&wire).unwrap();
//! assert_eq!(decoded.cache_id(), 7);
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod config;
pub mod entry;
pub mod error;
pub mod marshal;
pub mod protocol;
pub mod serialization;

pub use codec::{EntryDecoder, EntryEncoder};
pub use config::{CodecConfig, CodecConfigBuilder, ConfigError, KeyBytesPolicy};
pub use entry::{CacheObject, CacheVersion, EntryInfo, EntryKey, KeyCacheObject};
pub use error::{CacheWireError, Result};
pub use marshal::{CacheObjectContext, DomainObject, IdentifiedObjectContext};
pub use serialization::{
    DataInput, DataOutput, DataSerializableFactory, Deserializable, FactoryRegistry,
    IdentifiedDataSerializable, ObjectDataInput, ObjectDataOutput, Serializable,
};
