use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::DIGEST_SIZE_BITS;
use crate::errors::TicketError;

/// The quantization applied to ticket timestamps. Coarser granularities
/// shorten tickets; sequence numbers keep them unique regardless.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    Millisecond,
    Second,
    Minute,
    Hour,
}

impl Granularity {
    const fn scale(self) -> i64 {
        match self {
            Self::Millisecond => 1,
            Self::Second => 1000,
            Self::Minute => 1000 * 60,
            Self::Hour => 1000 * 60 * 60,
        }
    }
}

/// Specifies the structure of tickets issued by a factory: the time
/// origin and granularity of timestamps and the length of the integrity
/// tag. Factories hold an ordered list of these, issuing under the last
/// and decoding under any.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SpecState", into = "SpecState")]
pub struct TicketSpec {
    utc_offset_secs: i32,
    granularity: Granularity,
    origin_year: i32,
    hash_length: u32,
    origin_ms: i64,
}

impl TicketSpec {
    /// A builder seeded with the default specification: UTC, second
    /// granularity, origin year 2015, no hash.
    #[must_use]
    pub fn builder() -> TicketSpecBuilder {
        TicketSpecBuilder::default()
    }

    fn from_state(state: SpecState) -> Result<Self, TicketError> {
        if state.hash_length > DIGEST_SIZE_BITS as u32 {
            return Err(TicketError::invalid("hash length too large"));
        }
        let origin_ms = compute_origin_ms(state.utc_offset_secs, state.origin_year)?;
        Ok(Self {
            utc_offset_secs: state.utc_offset_secs,
            granularity: state.granularity,
            origin_year: state.origin_year,
            hash_length: state.hash_length,
            origin_ms,
        })
    }

    /// The UTC offset, in seconds, of the zone the origin is anchored in.
    #[must_use]
    pub const fn utc_offset_secs(&self) -> i32 {
        self.utc_offset_secs
    }

    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// The year before which no ticket could feasibly exist.
    #[must_use]
    pub const fn origin_year(&self) -> i32 {
        self.origin_year
    }

    /// Bits of integrity tag appended to each ticket; zero disables
    /// hashing.
    #[must_use]
    pub const fn hash_length(&self) -> u32 {
        self.hash_length
    }

    /// Epoch milliseconds of midnight, January 1st of the origin year, in
    /// the spec's zone.
    #[must_use]
    pub const fn origin_millis(&self) -> i64 {
        self.origin_ms
    }

    /// The current spec-local timestamp. Negative before the origin
    /// instant; issuing rejects that case.
    pub(crate) fn now_timestamp(&self) -> i64 {
        self.to_timestamp(Utc::now().timestamp_millis())
    }

    pub(crate) const fn to_timestamp(&self, epoch_ms: i64) -> i64 {
        (epoch_ms - self.origin_ms) / self.granularity.scale()
    }

    /// Reconstructs epoch milliseconds from a wire timestamp, rejecting
    /// values that cannot have been issued.
    pub(crate) fn timestamp_to_millis(&self, timestamp: u64) -> Result<i64, TicketError> {
        i64::try_from(timestamp)
            .ok()
            .and_then(|ts| ts.checked_mul(self.granularity.scale()))
            .and_then(|ms| ms.checked_add(self.origin_ms))
            .ok_or(TicketError::Malformed("timestamp out of range"))
    }
}

impl Default for TicketSpec {
    fn default() -> Self {
        Self {
            utc_offset_secs: 0,
            granularity: Granularity::Second,
            origin_year: 2015,
            hash_length: 0,
            // 2015-01-01T00:00:00Z; asserted against chrono in the tests
            origin_ms: 1_420_070_400_000,
        }
    }
}

fn compute_origin_ms(utc_offset_secs: i32, origin_year: i32) -> Result<i64, TicketError> {
    let offset = FixedOffset::east_opt(utc_offset_secs)
        .ok_or_else(|| TicketError::invalid("UTC offset out of range"))?;
    let midnight = NaiveDate::from_ymd_opt(origin_year, 1, 1)
        .ok_or_else(|| TicketError::invalid("origin year out of range"))?
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| TicketError::invalid("origin year out of range"))?;
    match offset.from_local_datetime(&midnight) {
        chrono::LocalResult::Single(dt) => Ok(dt.timestamp_millis()),
        _ => Err(TicketError::invalid("ambiguous origin instant")),
    }
}

/// Builds [`TicketSpec`] values; obtained from [`TicketSpec::builder`].
#[derive(Clone, Debug)]
pub struct TicketSpecBuilder {
    state: SpecState,
}

impl Default for TicketSpecBuilder {
    fn default() -> Self {
        Self {
            state: SpecState {
                utc_offset_secs: 0,
                granularity: Granularity::Second,
                origin_year: 2015,
                hash_length: 0,
            },
        }
    }
}

impl TicketSpecBuilder {
    /// Anchors ticket timestamps in the zone at this UTC offset.
    #[must_use]
    pub const fn utc_offset_secs(mut self, secs: i32) -> Self {
        self.state.utc_offset_secs = secs;
        self
    }

    #[must_use]
    pub const fn granularity(mut self, granularity: Granularity) -> Self {
        self.state.granularity = granularity;
        self
    }

    #[must_use]
    pub const fn origin_year(mut self, year: i32) -> Self {
        self.state.origin_year = year;
        self
    }

    /// Number of integrity-tag bits, at most 224.
    #[must_use]
    pub const fn hash_length(mut self, bits: u32) -> Self {
        self.state.hash_length = bits;
        self
    }

    pub fn build(self) -> Result<TicketSpec, TicketError> {
        TicketSpec::from_state(self.state)
    }
}

/// Persisted shape of a [`TicketSpec`]; the origin instant is re-derived
/// on load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct SpecState {
    utc_offset_secs: i32,
    granularity: Granularity,
    origin_year: i32,
    hash_length: u32,
}

impl TryFrom<SpecState> for TicketSpec {
    type Error = TicketError;

    fn try_from(state: SpecState) -> Result<Self, TicketError> {
        Self::from_state(state)
    }
}

impl From<TicketSpec> for SpecState {
    fn from(spec: TicketSpec) -> Self {
        Self {
            utc_offset_secs: spec.utc_offset_secs,
            granularity: spec.granularity,
            origin_year: spec.origin_year,
            hash_length: spec.hash_length,
        }
    }
}
