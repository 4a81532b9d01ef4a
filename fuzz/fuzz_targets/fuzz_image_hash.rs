#![no_main]

use libfuzzer_sys::fuzz_target;
use phashdb::{DifferenceHasher, Hasher};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the decoder or the hasher
    let _ = DifferenceHasher::new().hash(data);
});
