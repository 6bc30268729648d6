//! Integration tests for resumable entry encoding and decoding.

mod common;

use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes};
use cachewire_core::{
    CacheObject, CacheVersion, CacheWireError, CodecConfig, EntryDecoder, EntryEncoder, EntryInfo,
    KeyBytesPolicy, KeyCacheObject,
};

use common::{
    assert_same_wire_content, context, decode_chunked, encode_chunked, init_tracing,
    prepared_entry, registry, v1, K, V,
};

#[test]
fn test_four_byte_chunks_round_trip() {
    init_tracing();

    let entry = prepared_entry(7, K("a".to_string()), Some(V::new("x")));
    let wire = encode_chunked(&entry, 4);
    assert_eq!(wire, EntryEncoder::encode_to_bytes(&entry).unwrap().to_vec());

    let mut decoded = decode_chunked(&wire, 4);
    assert_same_wire_content(&entry, &decoded);

    decoded
        .materialize_from_wire(&context(), &registry(), &CodecConfig::default())
        .unwrap();
    let key = decoded.key_object().unwrap().object().unwrap();
    let value = decoded.value().unwrap().object().unwrap();
    assert_eq!(key.downcast_ref::<K>(), Some(&K("a".to_string())));
    assert_eq!(value.downcast_ref::<V>(), Some(&V::new("x")));
    assert_eq!(decoded.ttl(), 0);
    assert_eq!(decoded.expire_time(), 0);
    assert_eq!(decoded.version(), v1());
}

#[test]
fn test_tombstone_round_trip() {
    init_tracing();

    let entry = prepared_entry(3, K("gone".to_string()), None);
    let wire = EntryEncoder::encode_to_bytes(&entry).unwrap();
    let decoded = EntryDecoder::new().decode_from_bytes(&wire).unwrap();

    assert!(decoded.is_tombstone());
    assert!(decoded.value().is_none());
    assert_same_wire_content(&entry, &decoded);
}

#[test]
fn test_empty_key_no_value_one_byte_chunks() {
    init_tracing();

    let entry = EntryInfo::new(0)
        .with_key_bytes(Bytes::new())
        .with_version(v1());
    let wire = encode_chunked(&entry, 1);
    assert_eq!(wire.len(), EntryEncoder::encoded_len(&entry).unwrap());

    let decoded = decode_chunked(&wire, 1);
    assert_eq!(decoded.key_bytes(), Some(&Bytes::new()));
    assert!(decoded.is_tombstone());
    assert_same_wire_content(&entry, &decoded);
}

#[test]
fn test_large_value_one_byte_chunks() {
    init_tracing();

    let value = V::with_payload("big", 70 * 1024);
    let entry = prepared_entry(11, K("big".to_string()), Some(value.clone()));
    let wire = encode_chunked(&entry, 1);
    assert!(wire.len() > 64 * 1024);

    let mut decoded = decode_chunked(&wire, 1);
    assert_same_wire_content(&entry, &decoded);

    decoded
        .materialize_from_wire(&context(), &registry(), &CodecConfig::default())
        .unwrap();
    let object = decoded.value().unwrap().object().unwrap();
    assert_eq!(object.downcast_ref::<V>(), Some(&value));
}

#[test]
fn test_extreme_ttl_one_byte_chunks() {
    init_tracing();

    let entry = prepared_entry(1, K("k".to_string()), Some(V::new("v")))
        .with_ttl(i64::MAX)
        .with_expire_time(i64::MAX);
    let wire = encode_chunked(&entry, 1);
    let decoded = decode_chunked(&wire, 1);

    assert_eq!(decoded.ttl(), i64::MAX);
    assert_eq!(decoded.expire_time(), i64::MAX);
    assert_same_wire_content(&entry, &decoded);
}

#[test]
fn test_encode_without_key_is_contract_violation() {
    init_tracing();

    let entry = EntryInfo::new(5).with_value(CacheObject::from_bytes(Bytes::from_static(b"v")));
    let mut encoder = EntryEncoder::new();
    let mut out: Vec<u8> = Vec::new();

    let err = encoder.encode(&entry, &mut out).unwrap_err();
    assert!(matches!(err, CacheWireError::ContractViolation(_)));
    assert!(!err.is_recoverable());
    assert!(out.is_empty());
    assert_eq!(encoder.bytes_written(), 0);
}

#[test]
fn test_encode_unprepared_key_is_contract_violation() {
    let entry = EntryInfo::new(5).with_key(KeyCacheObject::from_object(Arc::new(K("k".into()))));
    let err = EntryEncoder::encode_to_bytes(&entry).unwrap_err();
    assert!(matches!(err, CacheWireError::ContractViolation(_)));
}

#[test]
fn test_decode_rejects_key_with_key_bytes() {
    init_tracing();

    let entry = prepared_entry(9, K("dup".to_string()), None);
    let mut wire = EntryEncoder::encode_to_bytes(&entry).unwrap().to_vec();

    // Header, cache ID and expire time precede the key message.
    let key_len = entry.key_object().unwrap().bytes().unwrap().len();
    let key_bytes_at = 2 + 4 + 8 + 2 + 4 + key_len;
    assert_eq!(&wire[key_bytes_at..key_bytes_at + 4], &[0xFF; 4]);
    wire.splice(key_bytes_at..key_bytes_at + 4, [0, 0, 0, 2, 0xAA, 0xBB]);

    let mut decoder = EntryDecoder::new();
    let mut decoded = EntryInfo::default();
    let err = decoder.decode(&mut &wire[..], &mut decoded).unwrap_err();
    assert!(matches!(err, CacheWireError::Protocol(_)));
}

#[test]
fn test_completion_signal() {
    let entry = prepared_entry(2, K("done".to_string()), Some(V::new("v")));
    let wire = EntryEncoder::encode_to_bytes(&entry).unwrap();

    let mut decoder = EntryDecoder::new();
    let mut decoded = EntryInfo::default();
    let mut src = common::to_bytes_mut(&wire);
    src.put_slice(b"next");

    assert!(!decoder.is_complete());
    assert!(decoder.decode(&mut src, &mut decoded).unwrap());
    assert!(decoder.is_complete());
    assert_eq!(src.chunk(), b"next");
    assert_eq!(decoder.bytes_read(), wire.len());
}

#[test]
fn test_zero_capacity_buffer_makes_no_progress() {
    let entry = prepared_entry(2, K("k".to_string()), None);
    let mut encoder = EntryEncoder::new();
    let mut empty: [u8; 0] = [];

    assert!(!encoder.encode(&entry, &mut &mut empty[..]).unwrap());
    assert_eq!(encoder.bytes_written(), 0);

    let wire = encode_chunked(&entry, 3);
    assert_eq!(wire, EntryEncoder::encode_to_bytes(&entry).unwrap().to_vec());
}

#[test]
fn test_decoder_and_encoder_are_reusable_after_reset() {
    let first = prepared_entry(1, K("one".to_string()), Some(V::new("1")));
    let second = prepared_entry(2, K("two".to_string()), None);

    let mut encoder = EntryEncoder::new();
    let mut decoder = EntryDecoder::new();
    for entry in [&first, &second] {
        let mut out: Vec<u8> = Vec::new();
        assert!(encoder.encode(entry, &mut out).unwrap());
        encoder.reset();

        let mut decoded = EntryInfo::default();
        assert!(decoder.decode(&mut &out[..], &mut decoded).unwrap());
        decoder.reset();

        assert_same_wire_content(entry, &decoded);
    }
}

#[test]
fn test_raw_key_materialize_with_clear_policy() {
    let ctx = context();
    let key_bytes = cachewire_core::CacheObjectContext::encode(&ctx, &K("swap".into())).unwrap();
    let entry = EntryInfo::new(4)
        .with_key_bytes(key_bytes)
        .with_version(CacheVersion::new(2, 0, 9, 3));

    let wire = encode_chunked(&entry, 5);
    let mut decoded = decode_chunked(&wire, 5);
    assert!(decoded.key().unwrap().is_raw());

    let config = CodecConfig::builder()
        .key_bytes_policy(KeyBytesPolicy::Clear)
        .build()
        .unwrap();
    decoded
        .materialize_from_wire(&ctx, &registry(), &config)
        .unwrap();
    let key = decoded.key_object().unwrap();
    assert!(key.bytes().is_none());
    assert_eq!(
        key.object().unwrap().downcast_ref::<K>(),
        Some(&K("swap".to_string()))
    );

    // Dropped bytes are recreated on the next marshal.
    decoded.prepare_for_wire(&ctx).unwrap();
    assert!(decoded.key_object().unwrap().is_marshalled());
}

#[test]
fn test_wire_size_matches_payloads() {
    let entry = prepared_entry(8, K("size".to_string()), Some(V::with_payload("p", 100)));
    let key_len = entry.key_object().unwrap().bytes().unwrap().len();
    let value_len = entry.value().unwrap().bytes().unwrap().len();
    assert_eq!(entry.wire_size(&context()).unwrap(), key_len + value_len);
}
