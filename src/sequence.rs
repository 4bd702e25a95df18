use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::basis::TicketBasis;
use crate::errors::TicketError;

/// Generates sequence numbers for tickets. Numbers need only be distinct
/// within a single timestamp value and should generally stay small.
///
/// Implementations must serialize their own state; both methods may be
/// called concurrently from multiple threads.
pub trait TicketSequence: Send + Sync {
    /// The next sequence number for a ticket at `timestamp`. A strictly
    /// newer timestamp restarts the numbering at zero; an older one
    /// continues the current run.
    fn next_sequence_number(&self, timestamp: i64) -> Result<u64, TicketError>;

    /// Whether `timestamp` has yet to be assigned any sequence number.
    /// Factories use this to sweep idle machines.
    fn is_unsequenced(&self, timestamp: i64) -> bool;
}

/// Provides a sequence per ticket basis.
///
/// This is the injection point for applications that persist sequence
/// state: a durable provider keyed on [`TicketBasis`] string identifiers
/// lets a restarted factory continue numbering instead of reissuing
/// `(timestamp, sequence)` pairs, which the encrypted block relies on
/// never repeating.
pub trait TicketSequences: Send + Sync {
    fn sequence_for(&self, basis: &TicketBasis) -> Arc<dyn TicketSequence>;
}

#[derive(Debug)]
struct CounterState {
    // the timestamp for which the numbering is currently increasing
    timestamp: i64,
    // the next number to hand out
    number: u64,
}

/// The built-in in-memory sequence: a mutex-guarded counter that resets
/// on each strictly newer timestamp.
#[derive(Debug)]
pub struct CountingSequence {
    state: Mutex<CounterState>,
}

impl CountingSequence {
    #[must_use]
    pub fn new() -> Self {
        Self { state: Mutex::new(CounterState { timestamp: -1, number: 0 }) }
    }
}

impl Default for CountingSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketSequence for CountingSequence {
    fn next_sequence_number(&self, timestamp: i64) -> Result<u64, TicketError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if timestamp > state.timestamp {
            state.number = 0;
            state.timestamp = timestamp;
        }
        let number = state.number;
        state.number = number.checked_add(1).ok_or(TicketError::SequenceExhausted)?;
        Ok(number)
    }

    fn is_unsequenced(&self, timestamp: i64) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.number == 0 || timestamp > state.timestamp
    }
}

/// The provider installed when none is injected: every basis gets its own
/// transient [`CountingSequence`], so numbering restarts with the
/// process.
#[derive(Debug, Default)]
pub(crate) struct TransientSequences;

impl TicketSequences for TransientSequences {
    fn sequence_for(&self, _basis: &TicketBasis) -> Arc<dyn TicketSequence> {
        Arc::new(CountingSequence::new())
    }
}

/// A process-wide provider that shares one sequence per basis identifier.
/// Useful for keeping numbering continuous across factories that are
/// rebuilt at runtime; durability across processes still requires a
/// custom [`TicketSequences`].
#[derive(Debug, Default)]
pub struct SharedSequences {
    sequences: Mutex<HashMap<String, Arc<CountingSequence>>>,
}

impl SharedSequences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TicketSequences for SharedSequences {
    fn sequence_for(&self, basis: &TicketBasis) -> Arc<dyn TicketSequence> {
        let mut map = self.sequences.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = Arc::clone(map.entry(basis.to_string()).or_default());
        sequence
    }
}
