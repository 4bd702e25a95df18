use scrip_bits::BitsError;
use thiserror::Error;

/// The single error surface of the ticket pipeline.
///
/// Every failure, from malformed input strings to exhausted sequence
/// counters, is reported through one of these discriminants. Messages
/// never carry secret key material or decrypted payload content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TicketError {
    /// A caller-supplied argument was rejected at the API boundary.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A ticket string exceeded the configured character limit.
    #[error("ticket length exceeds configured maximum")]
    TooLong,

    /// A ticket string contained a non-printable or non-ASCII character.
    #[error("non-printable or non-ASCII ticket character")]
    InvalidChar,

    /// The encoded version is not supported by this factory.
    #[error("ticket version {found} not supported (expected {expected})")]
    WrongVersion { expected: u32, found: u32 },

    /// The encoded specification index exceeds the factory's primary.
    #[error("unsupported ticket specification {0}")]
    UnknownSpec(u32),

    /// The per-basis counter cannot produce another sequence number.
    #[error("sequence numbers exhausted")]
    SequenceExhausted,

    /// The integrity tag did not match the recomputed digest.
    #[error("ticket hash invalid")]
    BadHash,

    /// The bit stream was inconsistent with the ticket layout.
    #[error("invalid ticket bits: {0}")]
    Malformed(&'static str),
}

impl TicketError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

impl From<BitsError> for TicketError {
    fn from(e: BitsError) -> Self {
        match e {
            BitsError::Underflow => Self::Malformed("bit stream exhausted"),
            BitsError::Overlong => Self::Malformed("universal code out of range"),
            BitsError::Invalid => Self::Malformed("malformed coded value"),
        }
    }
}
