#![no_main]

use libfuzzer_sys::fuzz_target;

use cachewire_core::{EntryDecoder, EntryEncoder};

fuzz_target!(|data: &[u8]| {
    let mut decoder = EntryDecoder::new();
    if let Ok(entry) = decoder.decode_from_bytes(data) {
        let _ = entry.to_string();
        let _ = entry.remaining_time(0);

        // Anything with a key that decodes must re-encode to the bytes it came from.
        match EntryEncoder::encode_to_bytes(&entry) {
            Ok(encoded) => assert_eq!(&encoded[..], &data[..encoded.len()]),
            Err(_) => assert!(entry.key().is_none()),
        }
    }
});
