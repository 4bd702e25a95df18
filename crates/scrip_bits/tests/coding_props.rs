//! Property-based tests for the bit layer and the universal codes.

use proptest::prelude::*;
use scrip_bits::coding::{CodedReader, CodedWriter};
use scrip_bits::{BitRead, BitVector, BitVectorReader, BitVectorWriter, BitWrite};

proptest! {
    #[test]
    fn bit_vectors_round_trip_through_bytes(bits in proptest::collection::vec(any::<bool>(), 0..200)) {
        let mut v = BitVector::new();
        for &b in &bits {
            v.push(b);
        }
        let packed = v.to_bytes();
        prop_assert_eq!(BitVector::from_bytes(&packed, bits.len()), v);
    }

    #[test]
    fn ranges_compose(bits in proptest::collection::vec(any::<bool>(), 1..120), split in any::<prop::sample::Index>()) {
        let mut v = BitVector::new();
        for &b in &bits {
            v.push(b);
        }
        let mid = split.index(bits.len());
        let head = v.range(0, mid);
        let tail = v.range(mid, bits.len());
        let mut glued = BitVectorWriter::new();
        glued.write_vector(&head);
        glued.write_vector(&tail);
        prop_assert_eq!(glued.into_vector(), v);
    }

    #[test]
    fn xor_is_self_inverse(
        bytes in proptest::collection::vec(any::<u8>(), 1..24),
        pad in proptest::collection::vec(any::<u8>(), 24..25)
    ) {
        let len = bytes.len() * 8;
        let original = BitVector::from_bytes(&bytes, len);
        let mask = BitVector::from_bytes(&pad, len);
        let mut masked = original.clone();
        masked.xor_with(&mask);
        masked.xor_with(&mask);
        prop_assert_eq!(masked, original);
    }

    #[test]
    fn positive_longs_round_trip(values in proptest::collection::vec(any::<u64>(), 0..24)) {
        let mut w = CodedWriter::new(BitVectorWriter::new());
        for &v in &values {
            w.write_positive_long(v);
        }
        let bits = w.into_inner().into_vector();
        let mut r = CodedReader::new(BitVectorReader::new(&bits));
        for &v in &values {
            prop_assert_eq!(r.read_positive_long().unwrap(), v);
        }
        prop_assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn signed_values_round_trip(ints in proptest::collection::vec(any::<i32>(), 0..16), longs in proptest::collection::vec(any::<i64>(), 0..16)) {
        let mut w = CodedWriter::new(BitVectorWriter::new());
        for &v in &ints {
            w.write_int(v);
        }
        for &v in &longs {
            w.write_long(v);
        }
        let bits = w.into_inner().into_vector();
        let mut r = CodedReader::new(BitVectorReader::new(&bits));
        for &v in &ints {
            prop_assert_eq!(r.read_int().unwrap(), v);
        }
        for &v in &longs {
            prop_assert_eq!(r.read_long().unwrap(), v);
        }
    }

    #[test]
    fn mixed_streams_round_trip(
        n in any::<u32>(),
        f in any::<f32>(),
        d in any::<f64>(),
        b in any::<bool>(),
        s in "\\PC{0,16}"
    ) {
        let mut w = CodedWriter::new(BitVectorWriter::new());
        w.write_positive_int(n);
        w.write_float(f);
        w.write_boolean(b);
        w.write_double(d);
        w.write_string(&s);
        let bits = w.into_inner().into_vector();
        let mut r = CodedReader::new(BitVectorReader::new(&bits));
        prop_assert_eq!(r.read_positive_int().unwrap(), n);
        prop_assert_eq!(r.read_float().unwrap().to_bits(), f.to_bits());
        prop_assert_eq!(r.read_boolean().unwrap(), b);
        prop_assert_eq!(r.read_double().unwrap().to_bits(), d.to_bits());
        prop_assert_eq!(r.read_string().unwrap(), s);
        prop_assert_eq!(r.remaining(), 0);
    }

    // Decoding arbitrary bits may fail but must never panic, and any
    // successfully decoded value re-encodes into a prefix of the stream.
    #[test]
    fn decoding_noise_is_total(bytes in proptest::collection::vec(any::<u8>(), 0..32)) {
        let bits = BitVector::from_bytes(&bytes, bytes.len() * 8);
        let mut r = CodedReader::new(BitVectorReader::new(&bits));
        if let Ok(value) = r.read_positive_long() {
            let consumed = r.position();
            let mut w = CodedWriter::new(BitVectorWriter::new());
            let written = w.write_positive_long(value);
            prop_assert_eq!(written, consumed);
            prop_assert_eq!(w.into_inner().into_vector(), bits.range(0, consumed));
        }
    }

    #[test]
    fn reader_reports_positions(bytes in proptest::collection::vec(any::<u8>(), 1..16)) {
        let bits = BitVector::from_bytes(&bytes, bytes.len() * 8);
        let mut reader = BitVectorReader::new(&bits);
        let mut expected = 0;
        while reader.remaining() >= 3 {
            reader.read_bits(3).unwrap();
            expected += 3;
            prop_assert_eq!(reader.position(), expected);
        }
    }
}
