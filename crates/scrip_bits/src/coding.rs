//! Extended Elias-omega coding over bit streams.
//!
//! Non-negative integers are coded as omega(n + 1) so that zero is
//! representable; signed integers zig-zag fold onto the non-negative
//! domain first; floats are written as their IEEE-754 bit patterns and
//! strings as a byte-length prefix followed by raw UTF-8 bytes. Every
//! code is self-delimiting, so no out-of-band lengths are required.

use crate::{BitRead, BitWrite, BitsError};

// Largest legal omega group: 2^64 (positive_long u64::MAX + 1) has a
// 65-bit binary form, so a decoder may be asked for at most 64 more bits
// after the leading 1 of the final group.
const MAX_GROUP_LEN: u128 = 64;

/// Universal-code writer over any [`BitWrite`]. All methods return the
/// number of bits emitted.
#[derive(Debug)]
pub struct CodedWriter<W: BitWrite> {
    writer: W,
}

impl<W: BitWrite> CodedWriter<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    pub const fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn write_positive_int(&mut self, value: u32) -> usize {
        self.write_omega(u128::from(value) + 1)
    }

    pub fn write_positive_long(&mut self, value: u64) -> usize {
        self.write_omega(u128::from(value) + 1)
    }

    pub fn write_int(&mut self, value: i32) -> usize {
        self.write_omega(u128::from(zigzag32(value)) + 1)
    }

    pub fn write_long(&mut self, value: i64) -> usize {
        self.write_omega(u128::from(zigzag64(value)) + 1)
    }

    pub fn write_float(&mut self, value: f32) -> usize {
        self.writer.write_bits(u64::from(value.to_bits()), 32)
    }

    pub fn write_double(&mut self, value: f64) -> usize {
        self.writer.write_bits(value.to_bits(), 64)
    }

    pub fn write_boolean(&mut self, value: bool) -> usize {
        self.writer.write_bit(value)
    }

    pub fn write_string(&mut self, value: &str) -> usize {
        let bytes = value.as_bytes();
        let mut written = self.write_omega(bytes.len() as u128 + 1);
        for &b in bytes {
            written += self.writer.write_bits(u64::from(b), 8);
        }
        written
    }

    /// Elias-omega code of `n >= 1`: recursively length-prefixed binary
    /// groups, terminated by a single zero bit.
    fn write_omega(&mut self, mut n: u128) -> usize {
        let mut groups: Vec<(u128, u32)> = Vec::new();
        while n > 1 {
            let bits = 128 - n.leading_zeros();
            groups.push((n, bits));
            n = u128::from(bits - 1);
        }
        let mut written = 0;
        for &(value, bits) in groups.iter().rev() {
            for shift in (0..bits).rev() {
                written += self.writer.write_bit((value >> shift) & 1 != 0);
            }
        }
        written + self.writer.write_bit(false)
    }
}

/// Universal-code reader over any [`BitRead`].
#[derive(Debug)]
pub struct CodedReader<R: BitRead> {
    reader: R,
}

impl<R: BitRead> CodedReader<R> {
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }

    pub const fn reader(&self) -> &R {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn position(&self) -> usize {
        self.reader.position()
    }

    pub fn remaining(&self) -> usize {
        self.reader.remaining()
    }

    pub fn read_positive_int(&mut self) -> Result<u32, BitsError> {
        let n = self.read_omega()?;
        u32::try_from(n - 1).map_err(|_| BitsError::Overlong)
    }

    pub fn read_positive_long(&mut self) -> Result<u64, BitsError> {
        let n = self.read_omega()?;
        u64::try_from(n - 1).map_err(|_| BitsError::Overlong)
    }

    pub fn read_int(&mut self) -> Result<i32, BitsError> {
        let n = self.read_omega()?;
        let folded = u32::try_from(n - 1).map_err(|_| BitsError::Overlong)?;
        Ok(unzigzag32(folded))
    }

    pub fn read_long(&mut self) -> Result<i64, BitsError> {
        let n = self.read_omega()?;
        let folded = u64::try_from(n - 1).map_err(|_| BitsError::Overlong)?;
        Ok(unzigzag64(folded))
    }

    pub fn read_float(&mut self) -> Result<f32, BitsError> {
        let bits = self.reader.read_bits(32)?;
        Ok(f32::from_bits(bits as u32))
    }

    pub fn read_double(&mut self) -> Result<f64, BitsError> {
        Ok(f64::from_bits(self.reader.read_bits(64)?))
    }

    pub fn read_boolean(&mut self) -> Result<bool, BitsError> {
        self.reader.read_bit()
    }

    pub fn read_string(&mut self) -> Result<String, BitsError> {
        let len = self.read_positive_int()? as usize;
        if len * 8 > self.reader.remaining() {
            return Err(BitsError::Underflow);
        }
        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            bytes.push(self.reader.read_bits(8)? as u8);
        }
        String::from_utf8(bytes).map_err(|_| BitsError::Invalid)
    }

    fn read_omega(&mut self) -> Result<u128, BitsError> {
        let mut n: u128 = 1;
        while self.reader.read_bit()? {
            if n > MAX_GROUP_LEN {
                return Err(BitsError::Overlong);
            }
            let mut value: u128 = 1;
            for _ in 0..n {
                value = (value << 1) | u128::from(self.reader.read_bit()?);
            }
            n = value;
        }
        Ok(n)
    }
}

#[allow(clippy::cast_sign_loss)]
const fn zigzag32(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

#[allow(clippy::cast_sign_loss)]
const fn zigzag64(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

#[allow(clippy::cast_possible_wrap)]
const fn unzigzag32(n: u32) -> i32 {
    (n >> 1) as i32 ^ -((n & 1) as i32)
}

#[allow(clippy::cast_possible_wrap)]
const fn unzigzag64(n: u64) -> i64 {
    (n >> 1) as i64 ^ -((n & 1) as i64)
}

#[cfg(test)]
#[allow(clippy::missing_assert_message)]
mod tests {
    use super::*;
    use crate::{BitVectorReader, BitVectorWriter};

    fn coded(build: impl FnOnce(&mut CodedWriter<BitVectorWriter>)) -> crate::BitVector {
        let mut w = CodedWriter::new(BitVectorWriter::new());
        build(&mut w);
        w.into_inner().into_vector()
    }

    #[test]
    fn omega_small_values_match_known_codes() {
        // omega(1) = "0", omega(2) = "100", omega(3) = "110",
        // omega(4) = "101000", omega(16) = "10100100000"
        let cases: [(u32, &str); 5] =
            [(0, "0"), (1, "100"), (2, "110"), (3, "101000"), (15, "10100100000")];
        for (value, expected) in cases {
            let bits = coded(|w| {
                w.write_positive_int(value);
            });
            let rendered: String =
                (0..bits.len()).map(|i| if bits.get(i) { '1' } else { '0' }).collect();
            assert_eq!(rendered, expected, "value {value}");
        }
    }

    #[test]
    fn positive_round_trips_at_boundaries() {
        let values = [0u64, 1, 2, 7, 8, 100, 1_000_000, u64::from(u32::MAX), u64::MAX];
        let bits = coded(|w| {
            for &v in &values {
                w.write_positive_long(v);
            }
        });
        let mut r = CodedReader::new(BitVectorReader::new(&bits));
        for &v in &values {
            assert_eq!(r.read_positive_long().unwrap(), v);
        }
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn positive_int_rejects_long_range_values() {
        let bits = coded(|w| {
            w.write_positive_long(u64::from(u32::MAX) + 1);
        });
        let mut r = CodedReader::new(BitVectorReader::new(&bits));
        assert_eq!(r.read_positive_int(), Err(BitsError::Overlong));
    }

    #[test]
    fn signed_round_trips_at_extremes() {
        let ints = [0i32, 1, -1, 63, -64, i32::MAX, i32::MIN];
        let longs = [0i64, 1, -1, i64::MAX, i64::MIN];
        let bits = coded(|w| {
            for &v in &ints {
                w.write_int(v);
            }
            for &v in &longs {
                w.write_long(v);
            }
        });
        let mut r = CodedReader::new(BitVectorReader::new(&bits));
        for &v in &ints {
            assert_eq!(r.read_int().unwrap(), v);
        }
        for &v in &longs {
            assert_eq!(r.read_long().unwrap(), v);
        }
    }

    #[test]
    fn floats_are_bit_patterns() {
        let bits = coded(|w| {
            w.write_float(core::f32::consts::PI);
            w.write_double(-0.0);
            w.write_double(f64::INFINITY);
        });
        let mut r = CodedReader::new(BitVectorReader::new(&bits));
        assert_eq!(r.read_float().unwrap().to_bits(), core::f32::consts::PI.to_bits());
        assert_eq!(r.read_double().unwrap().to_bits(), (-0.0f64).to_bits());
        assert_eq!(r.read_double().unwrap(), f64::INFINITY);
    }

    #[test]
    fn strings_round_trip_including_empty() {
        let bits = coded(|w| {
            w.write_string("");
            w.write_string("ticket");
            w.write_string("naïve €");
        });
        let mut r = CodedReader::new(BitVectorReader::new(&bits));
        assert_eq!(r.read_string().unwrap(), "");
        assert_eq!(r.read_string().unwrap(), "ticket");
        assert_eq!(r.read_string().unwrap(), "naïve €");
    }

    #[test]
    fn string_length_cannot_exceed_stream() {
        // length prefix of 200 bytes with no payload behind it
        let bits = coded(|w| {
            w.write_positive_int(200);
        });
        let mut r = CodedReader::new(BitVectorReader::new(&bits));
        assert_eq!(r.read_string(), Err(BitsError::Underflow));
    }

    #[test]
    fn truncated_omega_underflows() {
        let bits = coded(|w| {
            w.write_positive_long(1_000_000);
        });
        let cut = bits.range(0, bits.len() - 3);
        let mut r = CodedReader::new(BitVectorReader::new(&cut));
        assert_eq!(r.read_positive_long(), Err(BitsError::Underflow));
    }

    #[test]
    fn runaway_group_length_is_overlong() {
        // An adversarial all-ones stream keeps promising larger groups.
        let ones = crate::BitVector::from_bytes(&[0xFF; 40], 320);
        let mut r = CodedReader::new(BitVectorReader::new(&ones));
        assert_eq!(r.read_positive_long(), Err(BitsError::Overlong));
    }
}
