use std::fmt;
use std::hash::{Hash, Hasher};

use scrip_bits::BitVector;
use sha3::{Digest, Keccak224};

use crate::schema::{Record, Value};

/// The identity under which one ticket machine issues tickets: a
/// specification index plus the serialized open and secret origin fields.
///
/// Equality and hashing cover exactly that triple, so two machines with
/// the same origin share a basis regardless of how the origin values were
/// supplied. The [`fmt::Display`] rendering is a stable key suitable for
/// external sequence providers.
#[derive(Clone, Debug)]
pub struct TicketBasis {
    spec_index: usize,
    open_bits: BitVector,
    secret_bits: BitVector,
    origin: Record,
    values: Vec<Value>,
    id: String,
}

impl TicketBasis {
    pub(crate) fn new(
        spec_index: usize,
        open_bits: BitVector,
        secret_bits: BitVector,
        origin: Record,
        values: Vec<Value>,
    ) -> Self {
        let id = basis_id(spec_index, &open_bits, &secret_bits);
        Self { spec_index, open_bits, secret_bits, origin, values, id }
    }

    /// Index of the specification this basis issues under.
    #[must_use]
    pub const fn spec_index(&self) -> usize {
        self.spec_index
    }

    /// The origin record shared by all tickets of this basis.
    #[must_use]
    pub const fn origin(&self) -> &Record {
        &self.origin
    }

    pub(crate) const fn open_bits(&self) -> &BitVector {
        &self.open_bits
    }

    pub(crate) fn values(&self) -> &[Value] {
        &self.values
    }
}

impl PartialEq for TicketBasis {
    fn eq(&self, other: &Self) -> bool {
        self.spec_index == other.spec_index
            && self.open_bits == other.open_bits
            && self.secret_bits == other.secret_bits
    }
}

impl Eq for TicketBasis {}

impl Hash for TicketBasis {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.spec_index.hash(state);
        self.open_bits.hash(state);
        self.secret_bits.hash(state);
    }
}

impl fmt::Display for TicketBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Without secret origin fields the key is readable: the open bits in hex
/// followed by `'0'` and the one-based spec number. With them, the key is
/// a Keccak digest so that secret values never leak through sequence
/// stores.
fn basis_id(spec_index: usize, open_bits: &BitVector, secret_bits: &BitVector) -> String {
    if secret_bits.is_empty() {
        return format!("{}0{}", open_bits.to_hex(), spec_index + 1);
    }
    let mut digest = Keccak224::new();
    digest.update(open_bits.to_bytes());
    digest.update(secret_bits.to_bytes());
    digest.update((spec_index as u32).to_be_bytes());
    let magnitude: [u8; 28] = digest.finalize().into();
    let id = hex::encode(magnitude);
    let trimmed = id.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_owned()
    } else {
        trimmed.to_owned()
    }
}
