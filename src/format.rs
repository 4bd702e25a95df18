use scrip_bits::{BitRead, BitVector, BitVectorReader, BitVectorWriter, BitWrite};
use serde::{Deserialize, Serialize};

use crate::errors::TicketError;

// 32-symbol alphabet: digits plus 22 letters. `i`, `l` and `o` are dropped
// as too easily confused with `1` and `0`; `z` is reserved for padding.
const CHARS_LOWER: &[u8; 32] = b"0123456789abcdefghjkmnpqrstuvwxy";
const CHARS_UPPER: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTUVWXY";
const PAD_LOWER: char = 'z';
const PAD_UPPER: char = 'Z';

// Inverse table over printable ASCII; -1 marks a non-symbol.
const SYMBOL_VALUES: [i8; 128] = build_symbol_values();

#[allow(clippy::cast_possible_wrap)]
const fn build_symbol_values() -> [i8; 128] {
    let mut table = [-1i8; 128];
    let mut i = 0;
    while i < 32 {
        table[CHARS_LOWER[i] as usize] = i as i8;
        table[CHARS_UPPER[i] as usize] = i as i8;
        i += 1;
    }
    table
}

const fn symbol_value(c: char) -> i8 {
    if (c as u32) < 128 {
        SYMBOL_VALUES[c as usize]
    } else {
        -1
    }
}

/// Controls the rendering of ticket bits as ASCII strings.
///
/// Any format decodes the output of any other: grouping, padding and case
/// affect presentation only, never the recovered bit image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FormatState", into = "FormatState")]
pub struct TicketFormat {
    upper_case: bool,
    group_length: usize,
    separator: char,
    pad_groups: bool,
}

impl TicketFormat {
    /// The format applied by factories until replaced: lowercase symbols in
    /// `-`-separated groups of five, padded with `z`.
    pub const DEFAULT: Self =
        Self { upper_case: false, group_length: 5, separator: '-', pad_groups: true };

    /// Creates a format. The separator must be printable ASCII and must not
    /// collide with the symbol alphabet in either case; it is case-adjusted
    /// to match `upper_case`.
    pub fn new(
        upper_case: bool,
        group_length: usize,
        separator: char,
        pad_groups: bool,
    ) -> Result<Self, TicketError> {
        if !(' '..='~').contains(&separator) {
            return Err(TicketError::invalid("non-printable or non-ASCII separator"));
        }
        if symbol_value(separator) >= 0 {
            return Err(TicketError::invalid("separator used for ticket encoding"));
        }
        let separator = if upper_case {
            separator.to_ascii_uppercase()
        } else {
            separator.to_ascii_lowercase()
        };
        Ok(Self { upper_case, group_length, separator, pad_groups })
    }

    #[must_use]
    pub const fn upper_case(&self) -> bool {
        self.upper_case
    }

    #[must_use]
    pub const fn group_length(&self) -> usize {
        self.group_length
    }

    #[must_use]
    pub const fn separator_char(&self) -> char {
        self.separator
    }

    #[must_use]
    pub const fn pad_groups(&self) -> bool {
        self.pad_groups
    }

    /// Renders a bit sequence whose length is a multiple of five,
    /// failing `TooLong` when the rendering would exceed `max_len`
    /// characters.
    pub fn encode(&self, bits: &BitVector, max_len: usize) -> Result<String, TicketError> {
        let count = bits.len() / 5;
        let chars = if self.upper_case { CHARS_UPPER } else { CHARS_LOWER };
        let mut reader = BitVectorReader::new(bits);
        if self.group_length == 0 {
            check_length(count, max_len)?;
            let mut out = String::with_capacity(count);
            for _ in 0..count {
                out.push(char::from(chars[next_symbol(&mut reader)]));
            }
            return Ok(out);
        }
        let sep_count = if count == 0 { 0 } else { (count - 1) / self.group_length };
        let pad_count = if self.pad_groups {
            self.group_length - 1 - (count + self.group_length - 1) % self.group_length
        } else {
            0
        };
        check_length(count + sep_count + pad_count, max_len)?;
        let pad = if self.upper_case { PAD_UPPER } else { PAD_LOWER };
        let mut out = String::with_capacity(count + sep_count + pad_count);
        for i in 0..count {
            if i > 0 && i % self.group_length == 0 {
                out.push(self.separator);
            }
            out.push(char::from(chars[next_symbol(&mut reader)]));
        }
        for _ in 0..pad_count {
            out.push(pad);
        }
        Ok(out)
    }

    /// Recovers the bit sequence from a ticket string. Printable
    /// non-symbol characters (including padding) are skipped as
    /// separators; anything else is rejected.
    pub fn decode(&self, str: &str, max_len: usize) -> Result<BitVector, TicketError> {
        let length = str.chars().count();
        check_length(length, max_len)?;
        let mut symbols = 0usize;
        for c in str.chars() {
            if !(' '..='~').contains(&c) {
                return Err(TicketError::InvalidChar);
            }
            if symbol_value(c) >= 0 {
                symbols += 1;
            }
        }
        let mut writer = BitVectorWriter::new();
        for c in str.chars() {
            let value = symbol_value(c);
            if value >= 0 {
                writer.write_bits(value as u64, 5);
            }
        }
        debug_assert_eq!(writer.position(), symbols * 5);
        Ok(writer.into_vector())
    }
}

impl Default for TicketFormat {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn next_symbol(reader: &mut BitVectorReader<'_>) -> usize {
    // The caller sized the reader to a multiple of five bits.
    reader.read_bits(5).map_or(0, |v| v as usize)
}

const fn check_length(length: usize, max_len: usize) -> Result<(), TicketError> {
    if length > max_len {
        return Err(TicketError::TooLong);
    }
    Ok(())
}

/// Persisted shape of a [`TicketFormat`]; validation re-runs on load.
#[derive(Serialize, Deserialize)]
struct FormatState {
    upper_case: bool,
    group_length: usize,
    separator: char,
    pad_groups: bool,
}

impl TryFrom<FormatState> for TicketFormat {
    type Error = TicketError;

    fn try_from(s: FormatState) -> Result<Self, TicketError> {
        Self::new(s.upper_case, s.group_length, s.separator, s.pad_groups)
    }
}

impl From<TicketFormat> for FormatState {
    fn from(f: TicketFormat) -> Self {
        Self {
            upper_case: f.upper_case,
            group_length: f.group_length,
            separator: f.separator,
            pad_groups: f.pad_groups,
        }
    }
}
