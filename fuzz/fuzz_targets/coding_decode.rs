#![no_main]

use libfuzzer_sys::fuzz_target;
use scrip_bits::coding::CodedReader;
use scrip_bits::{BitVector, BitVectorReader};

fuzz_target!(|data: &[u8]| {
    let bits = BitVector::from_bytes(data, data.len() * 8);
    let mut r = CodedReader::new(BitVectorReader::new(&bits));
    let _ = r.read_positive_int();
    let _ = r.read_positive_long();
    let _ = r.read_int();
    let _ = r.read_long();
    let _ = r.read_float();
    let _ = r.read_double();
    let _ = r.read_string();
});
