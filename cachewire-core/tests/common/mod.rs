//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::any::Any;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use cachewire_core::serialization::{
    DataInput, DataOutput, DataSerializableFactory, Deserializable, FactoryRegistry,
    IdentifiedDataSerializable, Serializable,
};
use cachewire_core::{
    CacheObject, CacheVersion, EntryDecoder, EntryEncoder, EntryInfo, IdentifiedObjectContext,
    KeyCacheObject, Result,
};

pub const TEST_FACTORY_ID: i32 = 1000;
pub const KEY_CLASS_ID: i32 = 1;
pub const VALUE_CLASS_ID: i32 = 2;

/// Test key type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct K(pub String);

impl IdentifiedDataSerializable for K {
    fn factory_id(&self) -> i32 {
        TEST_FACTORY_ID
    }

    fn class_id(&self) -> i32 {
        KEY_CLASS_ID
    }

    fn write_data(&self, output: &mut dyn DataOutput) -> Result<()> {
        self.0.serialize(output)
    }

    fn read_data(&mut self, input: &mut dyn DataInput) -> Result<()> {
        self.0 = String::deserialize(input)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Test value type carrying a label and an opaque payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct V {
    pub label: String,
    pub payload: Bytes,
}

impl V {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            payload: Bytes::new(),
        }
    }

    pub fn with_payload(label: &str, len: usize) -> Self {
        Self {
            label: label.to_string(),
            payload: (0..len).map(|i| (i % 251) as u8).collect(),
        }
    }
}

impl IdentifiedDataSerializable for V {
    fn factory_id(&self) -> i32 {
        TEST_FACTORY_ID
    }

    fn class_id(&self) -> i32 {
        VALUE_CLASS_ID
    }

    fn write_data(&self, output: &mut dyn DataOutput) -> Result<()> {
        self.label.serialize(output)?;
        self.payload.serialize(output)
    }

    fn read_data(&mut self, input: &mut dyn DataInput) -> Result<()> {
        self.label = String::deserialize(input)?;
        self.payload = Bytes::deserialize(input)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct TestFactory;

impl DataSerializableFactory for TestFactory {
    fn create(&self, class_id: i32) -> Option<Box<dyn IdentifiedDataSerializable>> {
        match class_id {
            KEY_CLASS_ID => Some(Box::new(K::default())),
            VALUE_CLASS_ID => Some(Box::new(V::default())),
            _ => None,
        }
    }
}

pub fn registry() -> FactoryRegistry {
    FactoryRegistry::new().with_factory(TEST_FACTORY_ID, Box::new(TestFactory))
}

pub fn context() -> IdentifiedObjectContext {
    IdentifiedObjectContext::new()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn v1() -> CacheVersion {
    CacheVersion::new(1, 1_700_000_000_000, 1, 1)
}

/// Builds an entry from objects and marshals it for the wire.
pub fn prepared_entry(cache_id: i32, key: K, value: Option<V>) -> EntryInfo {
    let mut entry = EntryInfo::new(cache_id)
        .with_key(KeyCacheObject::from_object(Arc::new(key)))
        .with_version(v1());
    if let Some(value) = value {
        entry = entry.with_value(CacheObject::from_object(Arc::new(value)));
    }
    entry
        .prepare_for_wire(&context())
        .expect("failed to prepare entry");
    entry
}

/// Encodes `entry` into a bounded buffer of `chunk` bytes per call.
pub fn encode_chunked(entry: &EntryInfo, chunk: usize) -> Vec<u8> {
    encode_with_chunks(entry, std::iter::repeat(chunk))
}

/// Encodes `entry`, taking each call's buffer size from `sizes`.
///
/// A size of zero is allowed and must make no progress.
pub fn encode_with_chunks(entry: &EntryInfo, sizes: impl IntoIterator<Item = usize>) -> Vec<u8> {
    let mut encoder = EntryEncoder::new();
    let mut out: Vec<u8> = Vec::new();
    let mut sizes = sizes.into_iter();
    loop {
        let size = sizes.next().unwrap_or(usize::MAX);
        let mut buf = vec![0u8; size.min(1 << 20)];
        let cap = buf.len();
        let mut dst = &mut buf[..];
        let done = encoder.encode(entry, &mut dst).expect("encode failed");
        let written = cap - dst.len();
        out.extend_from_slice(&buf[..written]);
        if done {
            assert!(encoder.is_complete());
            assert_eq!(encoder.bytes_written(), out.len());
            return out;
        }
    }
}

/// Decodes `bytes`, feeding the decoder `chunk` bytes per call.
pub fn decode_chunked(bytes: &[u8], chunk: usize) -> EntryInfo {
    decode_with_chunks(bytes, std::iter::repeat(chunk))
}

/// Decodes `bytes`, taking each call's input size from `sizes`.
pub fn decode_with_chunks(bytes: &[u8], sizes: impl IntoIterator<Item = usize>) -> EntryInfo {
    let mut decoder = EntryDecoder::new();
    let mut entry = EntryInfo::default();
    let mut rest = bytes;
    let mut sizes = sizes.into_iter();
    loop {
        let size = sizes.next().unwrap_or(rest.len()).min(rest.len());
        let mut chunk = &rest[..size];
        let done = decoder.decode(&mut chunk, &mut entry).expect("decode failed");
        assert!(chunk.is_empty() || done, "decoder left bytes mid-entry");
        rest = &rest[size - chunk.len()..];
        if done {
            assert!(rest.is_empty(), "trailing bytes after entry");
            assert!(decoder.is_complete());
            return entry;
        }
        assert!(!rest.is_empty() || size > 0, "input ended before entry");
    }
}

/// Copies `bytes` into a `BytesMut` so decode can consume from it.
pub fn to_bytes_mut(bytes: &[u8]) -> BytesMut {
    BytesMut::from(bytes)
}

/// Asserts that two entries carry the same wire-visible content.
pub fn assert_same_wire_content(a: &EntryInfo, b: &EntryInfo) {
    assert_eq!(a.cache_id(), b.cache_id());
    assert_eq!(a.ttl(), b.ttl());
    assert_eq!(a.expire_time(), b.expire_time());
    assert_eq!(a.version(), b.version());
    assert_eq!(
        a.key_object().and_then(KeyCacheObject::bytes),
        b.key_object().and_then(KeyCacheObject::bytes)
    );
    assert_eq!(a.key_bytes(), b.key_bytes());
    assert_eq!(
        a.value().and_then(CacheObject::bytes),
        b.value().and_then(CacheObject::bytes)
    );
}
