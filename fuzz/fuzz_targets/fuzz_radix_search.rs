#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use phashdb::{Fingerprint, Index, LinearIndex, RadixIndex};
use std::collections::BTreeSet;

#[derive(Debug, Arbitrary)]
struct Input {
    values: Vec<u64>,
    query: u64,
    distance: u8,
}

fuzz_target!(|input: Input| {
    let mut radix = RadixIndex::new();
    let mut linear = LinearIndex::new();
    for &value in &input.values {
        radix.insert(Fingerprint(value)).unwrap();
        linear.insert(Fingerprint(value)).unwrap();
    }

    let distance = u32::from(input.distance % 65);
    let query = Fingerprint(input.query);
    let from_radix: BTreeSet<_> = radix.search(query, distance).unwrap().into_iter().collect();
    let from_linear: BTreeSet<_> = linear.search(query, distance).unwrap().into_iter().collect();
    assert_eq!(from_radix, from_linear);
});
