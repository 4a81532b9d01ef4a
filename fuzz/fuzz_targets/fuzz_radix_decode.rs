#![no_main]

use libfuzzer_sys::fuzz_target;
use phashdb::RadixIndex;

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must re-encode to the same bytes
    if let Ok(index) = RadixIndex::from_bytes(data) {
        let encoded = index.to_bytes();
        assert_eq!(&encoded[..], &data[..encoded.len()]);
    }
});
