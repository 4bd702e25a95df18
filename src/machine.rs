use std::sync::Arc;

use scrip_bits::coding::CodedWriter;
use scrip_bits::{BitVector, BitVectorWriter, BitWrite};

use crate::basis::TicketBasis;
use crate::digest::{derive_nonce, MAX_SECRET_BITS};
use crate::errors::TicketError;
use crate::factory::{FactoryShared, VERSION};
use crate::schema::{Record, Value};
use crate::sequence::TicketSequence;
use crate::spec::TicketSpec;
use crate::ticket::Ticket;

/// Issues tickets for a single basis on behalf of a factory.
///
/// A machine carries no mutable state of its own; timestamps come from
/// the spec's clock and numbering from the injected [`TicketSequence`],
/// which serializes itself. Machines are therefore safe to share across
/// threads.
pub struct TicketMachine {
    shared: Arc<FactoryShared>,
    basis: TicketBasis,
    sequence: Arc<dyn TicketSequence>,
}

impl TicketMachine {
    pub(crate) fn new(
        shared: Arc<FactoryShared>,
        basis: TicketBasis,
        sequence: Arc<dyn TicketSequence>,
    ) -> Self {
        Self { shared, basis, sequence }
    }

    /// The basis identifying this machine within its factory.
    #[must_use]
    pub const fn basis(&self) -> &TicketBasis {
        &self.basis
    }

    /// The origin recorded in every ticket this machine issues.
    #[must_use]
    pub const fn origin(&self) -> &Record {
        self.basis.origin()
    }

    #[must_use]
    pub const fn spec_index(&self) -> usize {
        self.basis.spec_index()
    }

    /// Issues a ticket with default data values.
    pub fn issue(&self) -> Result<Ticket, TicketError> {
        let values = self.shared.data_adapter.unadapt(None)?;
        self.issue_impl(values)
    }

    /// Issues a ticket carrying the supplied data values; omitted trailing
    /// fields assume their defaults.
    pub fn issue_values(&self, data_values: &[Value]) -> Result<Ticket, TicketError> {
        let values = self.shared.data_adapter.unadapt(Some(data_values))?;
        self.issue_impl(values)
    }

    /// Whether this machine can be dropped without losing numbering
    /// state: nothing has been sequenced, or time has moved past the last
    /// sequenced timestamp.
    #[must_use]
    pub fn is_disposable(&self) -> bool {
        self.sequence.is_unsequenced(self.spec().now_timestamp())
    }

    fn spec(&self) -> &TicketSpec {
        &self.shared.specs[self.basis.spec_index()]
    }

    fn issue_impl(&self, data_values: Vec<Value>) -> Result<Ticket, TicketError> {
        let spec_index = self.basis.spec_index();
        let spec = self.spec();
        let timestamp = spec.now_timestamp();
        if timestamp < 0 {
            return Err(TicketError::invalid("current time precedes the spec origin"));
        }
        let sequence = self.sequence.next_sequence_number(timestamp)?;
        let timestamp = u64::try_from(timestamp)
            .map_err(|_| TicketError::invalid("current time precedes the spec origin"))?;

        let mut w = CodedWriter::new(BitVectorWriter::new());
        w.write_positive_int(VERSION);
        w.write_positive_int(spec_index as u32);
        w.write_positive_long(timestamp);
        w.write_positive_long(sequence);
        w.writer_mut().write_vector(self.basis.open_bits());
        self.shared.data_adapter.write(&mut w, false, &data_values);

        if self.shared.has_secret {
            self.write_secret_block(&mut w, &data_values)?;
        } else {
            w.write_positive_int(0);
        }

        let spec_hash_length = spec.hash_length();
        if spec_hash_length > 0 {
            let tag = self.shared.digests.hash_tag(
                spec_index,
                spec_hash_length,
                &w.writer().bits().to_bytes(),
            );
            w.writer_mut().write_vector(&tag);
        }

        let length = w.writer().position();
        let padding = 4 - (length + 4) % 5;
        for _ in 0..padding {
            w.write_boolean(false);
        }

        let bits = w.into_inner().into_vector();
        let format = self.shared.format();
        let string = format.encode(&bits, self.shared.char_limit)?;
        let timestamp_ms = spec.timestamp_to_millis(timestamp)?;
        Ok(Ticket::new(
            spec.clone(),
            spec_index,
            bits,
            timestamp_ms,
            sequence,
            self.basis.origin().clone(),
            self.shared.data_adapter.adapt(data_values),
            string,
        ))
    }

    /// Serializes the secret origin and data fields plus the
    /// length-hiding nonce, then XORs the block with a keyed digest of
    /// everything already written. The digest covers only that open
    /// prefix, so the pad never depends on the payload it conceals.
    fn write_secret_block(
        &self,
        w: &mut CodedWriter<BitVectorWriter>,
        data_values: &[Value],
    ) -> Result<(), TicketError> {
        let spec_index = self.basis.spec_index();
        let digest = self.shared.digests.digest(spec_index, &w.writer().bits().to_bytes());
        let nonce = derive_nonce(&digest);

        let mut sw = CodedWriter::new(BitVectorWriter::new());
        self.shared.origin_adapter.write(&mut sw, true, self.basis.values());
        self.shared.data_adapter.write(&mut sw, true, data_values);
        sw.write_positive_long(nonce);
        let mut secret_bits = sw.into_inner().into_vector();

        let length = secret_bits.len();
        if length > MAX_SECRET_BITS {
            return Err(TicketError::invalid("secret data too large"));
        }
        w.write_positive_int(length as u32);
        secret_bits.xor_with(&BitVector::from_bytes(&digest, length));
        w.writer_mut().write_vector(&secret_bits);
        Ok(())
    }
}
