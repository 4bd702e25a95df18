use std::fmt;
use std::hash::{Hash, Hasher};

use scrip_bits::BitVector;

use crate::schema::Record;
use crate::spec::TicketSpec;

/// A unique timestamped token, created by a ticket machine and
/// reconstructible by any compatibly configured factory from its ASCII
/// form.
///
/// Tickets are immutable. Equality compares the canonical bit image under
/// a shared specification; the string image is presentation only, so two
/// equal tickets may render differently under different formats.
#[derive(Clone, Debug)]
pub struct Ticket {
    spec: TicketSpec,
    spec_index: usize,
    bits: BitVector,
    timestamp_ms: i64,
    sequence: u64,
    origin: Record,
    data: Record,
    string: String,
}

impl Ticket {
    #[allow(clippy::too_many_arguments)]
    pub(crate) const fn new(
        spec: TicketSpec,
        spec_index: usize,
        bits: BitVector,
        timestamp_ms: i64,
        sequence: u64,
        origin: Record,
        data: Record,
        string: String,
    ) -> Self {
        Self { spec, spec_index, bits, timestamp_ms, sequence, origin, data, string }
    }

    /// The specification this ticket was constructed under.
    #[must_use]
    pub const fn spec(&self) -> &TicketSpec {
        &self.spec
    }

    /// Index of the specification within the factory's configured list.
    #[must_use]
    pub const fn spec_index(&self) -> usize {
        self.spec_index
    }

    /// Creation time in epoch milliseconds, accurate to the spec's
    /// granularity.
    #[must_use]
    pub const fn timestamp_millis(&self) -> i64 {
        self.timestamp_ms
    }

    /// Disambiguates tickets sharing an origin and timestamp.
    #[must_use]
    pub const fn sequence_number(&self) -> u64 {
        self.sequence
    }

    /// Structured information about the source of the ticket; empty for
    /// unit origin schemas.
    #[must_use]
    pub const fn origin(&self) -> &Record {
        &self.origin
    }

    /// Information carried by this specific ticket; empty for unit data
    /// schemas.
    #[must_use]
    pub const fn data(&self) -> &Record {
        &self.data
    }

    /// The canonical bit image. Stable across formats; this is what
    /// equality and hashing observe.
    #[must_use]
    pub const fn bits(&self) -> &BitVector {
        &self.bits
    }
}

impl PartialEq for Ticket {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits && self.spec == other.spec
    }
}

impl Eq for Ticket {}

impl Hash for Ticket {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // spec deliberately omitted, mirroring equality's dominant term
        self.bits.hash(state);
    }
}

/// The compact ASCII encoding, the form tickets are shared in.
impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string)
    }
}
