#![no_main]

use bytes::Buf;
use libfuzzer_sys::fuzz_target;

use cachewire_core::{EntryDecoder, EntryInfo};

fuzz_target!(|data: &[u8]| {
    let Some((&step, rest)) = data.split_first() else {
        return;
    };
    let step = usize::from(step % 16) + 1;

    let whole = EntryDecoder::new().decode_from_bytes(rest);

    let mut decoder = EntryDecoder::new();
    let mut entry = EntryInfo::default();
    let mut chunked = None;
    for chunk in rest.chunks(step) {
        let mut chunk = chunk;
        match decoder.decode(&mut chunk, &mut entry) {
            Ok(true) => {
                chunked = Some(Ok(()));
                break;
            }
            Ok(false) => assert!(!chunk.has_remaining()),
            Err(e) => {
                chunked = Some(Err(e));
                break;
            }
        }
    }

    match (whole, chunked) {
        (Ok(a), Some(Ok(()))) => {
            assert_eq!(a.cache_id(), entry.cache_id());
            assert_eq!(a.version(), entry.version());
            assert_eq!(a.ttl(), entry.ttl());
        }
        (Err(_), Some(Err(_))) | (Err(_), None) => {}
        (whole, chunked) => panic!("chunking changed the outcome: {:?} vs {:?}", whole.is_ok(), chunked),
    }
});
