use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use scrip_bits::coding::{CodedReader, CodedWriter};
use scrip_bits::{BitRead, BitVector, BitVectorReader, BitVectorWriter};
use subtle::ConstantTimeEq;

use crate::adapter::FieldAdapter;
use crate::basis::TicketBasis;
use crate::digest::{DigestSet, MAX_SECRET_BITS};
use crate::errors::TicketError;
use crate::format::TicketFormat;
use crate::machine::TicketMachine;
use crate::schema::Value;
use crate::sequence::{TicketSequences, TransientSequences};
use crate::spec::TicketSpec;
use crate::ticket::Ticket;
use crate::TicketConfig;

/// Version of the ticket wire layout. Any observable change to the
/// layout requires bumping this and keeping the old branch in the
/// decoder.
pub(crate) const VERSION: u32 = 0;

/// State shared between a factory and the machines it hands out.
pub(crate) struct FactoryShared {
    pub(crate) config: TicketConfig,
    pub(crate) origin_adapter: FieldAdapter,
    pub(crate) data_adapter: FieldAdapter,
    pub(crate) specs: Vec<TicketSpec>,
    pub(crate) digests: DigestSet,
    pub(crate) has_secret: bool,
    pub(crate) char_limit: usize,
    format: RwLock<TicketFormat>,
}

impl FactoryShared {
    pub(crate) fn format(&self) -> TicketFormat {
        *self.format.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Produces [`TicketMachine`] instances and decodes the tickets they
/// issue. Assuming monotonic timing and reliable sequence numbers, every
/// ticket created through one factory is unique.
///
/// A factory is the functional entry point of the crate: applications
/// assemble a [`TicketConfig`], call [`TicketConfig::new_factory`], and
/// use the resulting factory for the life of the process. Factories are
/// safe for concurrent use; the live format may be swapped at any time
/// and machines are cached per basis behind an internal mutex.
pub struct TicketFactory {
    shared: Arc<FactoryShared>,
    sequences: Arc<dyn TicketSequences>,
    primary: usize,
    machines: Mutex<HashMap<TicketBasis, Arc<TicketMachine>>>,
}

impl TicketFactory {
    pub(crate) fn new(
        config: &TicketConfig,
        sequences: Option<Arc<dyn TicketSequences>>,
        secrets: &[&[u8]],
    ) -> Result<Self, TicketError> {
        if config.char_limit() == 0 {
            return Err(TicketError::invalid("character limit must be positive"));
        }
        let specs = config.specs().to_vec();
        let digests = DigestSet::new(specs.len(), secrets)?;
        let origin_adapter = FieldAdapter::new(Arc::new(config.origin_schema().clone()));
        let data_adapter = FieldAdapter::new(Arc::new(config.data_schema().clone()));
        let has_secret = origin_adapter.is_secretive() || data_adapter.is_secretive();
        let primary = specs.len() - 1;
        let shared = Arc::new(FactoryShared {
            config: config.clone(),
            origin_adapter,
            data_adapter,
            specs,
            digests,
            has_secret,
            char_limit: config.char_limit(),
            format: RwLock::new(TicketFormat::DEFAULT),
        });
        Ok(Self {
            shared,
            sequences: sequences.unwrap_or_else(|| Arc::new(TransientSequences)),
            primary,
            machines: Mutex::new(HashMap::new()),
        })
    }

    /// The configuration this factory was created with.
    #[must_use]
    pub fn config(&self) -> &TicketConfig {
        &self.shared.config
    }

    /// The format currently applied when rendering tickets.
    #[must_use]
    pub fn format(&self) -> TicketFormat {
        self.shared.format()
    }

    /// Replaces the live format. Applies to all tickets issued afterwards
    /// by this factory's machines; previously issued strings stay
    /// decodable.
    pub fn set_format(&self, format: TicketFormat) {
        *self.shared.format.write().unwrap_or_else(PoisonError::into_inner) = format;
    }

    /// The machine for the default origin. For unit origin schemas this
    /// is the only machine.
    pub fn machine(&self) -> Result<Arc<TicketMachine>, TicketError> {
        let values = self.shared.origin_adapter.unadapt(None)?;
        self.machine_impl(values)
    }

    /// The machine for the origin described by `origin_values`, assigned
    /// to declared field indices in order; omitted trailing fields assume
    /// their defaults.
    pub fn machine_for_values(
        &self,
        origin_values: &[Value],
    ) -> Result<Arc<TicketMachine>, TicketError> {
        let values = self.shared.origin_adapter.unadapt(Some(origin_values))?;
        self.machine_impl(values)
    }

    fn machine_impl(&self, values: Vec<Value>) -> Result<Arc<TicketMachine>, TicketError> {
        let basis = self.new_basis(values);
        let mut machines = self.machines.lock().unwrap_or_else(PoisonError::into_inner);
        let hit = machines.get(&basis).map(Arc::clone);
        // Sweep idle machines so the cache stays bounded by live origins.
        machines.retain(|_, machine| {
            hit.as_ref().is_some_and(|h| Arc::ptr_eq(h, machine)) || !machine.is_disposable()
        });
        if let Some(machine) = hit {
            return Ok(machine);
        }
        let sequence = self.sequences.sequence_for(&basis);
        let machine =
            Arc::new(TicketMachine::new(Arc::clone(&self.shared), basis.clone(), sequence));
        machines.insert(basis, Arc::clone(&machine));
        Ok(machine)
    }

    fn new_basis(&self, values: Vec<Value>) -> TicketBasis {
        let open_bits = self.origin_bits(false, &values);
        let secret_bits = self.origin_bits(true, &values);
        let origin = self.shared.origin_adapter.adapt(values.clone());
        TicketBasis::new(self.primary, open_bits, secret_bits, origin, values)
    }

    fn origin_bits(&self, secret: bool, values: &[Value]) -> BitVector {
        // A secretless partition still costs its zero count prefix in the
        // open form; for the basis key only actual secret fields matter.
        if secret && !self.shared.origin_adapter.is_secretive() {
            return BitVector::new();
        }
        let mut w = CodedWriter::new(BitVectorWriter::new());
        self.shared.origin_adapter.write(&mut w, secret, values);
        w.into_inner().into_vector()
    }

    /// Decodes a ticket previously rendered through [`Ticket`]'s
    /// `Display`. The ticket must have been created by a compatibly
    /// configured factory holding the same secrets.
    pub fn decode(&self, str: &str) -> Result<Ticket, TicketError> {
        if str.is_empty() {
            return Err(TicketError::invalid("empty ticket string"));
        }
        let bits = self.shared.format().decode(str, self.shared.char_limit)?;
        let size = bits.len();
        let mut r = CodedReader::new(BitVectorReader::new(&bits));

        let version = r.read_positive_int()?;
        if version != VERSION {
            return Err(TicketError::WrongVersion { expected: VERSION, found: version });
        }
        let spec_index = r.read_positive_int()?;
        if spec_index as usize > self.primary {
            return Err(TicketError::UnknownSpec(spec_index));
        }
        let spec_index = spec_index as usize;
        let spec = &self.shared.specs[spec_index];

        let timestamp = r.read_positive_long()?;
        let sequence = r.read_positive_long()?;

        let origin_adapter = &self.shared.origin_adapter;
        let data_adapter = &self.shared.data_adapter;
        let mut origin_values = origin_adapter.defaults();
        let mut data_values = data_adapter.defaults();
        origin_adapter.read(&mut r, false, &mut origin_values)?;
        data_adapter.read(&mut r, false, &mut data_values)?;

        let prefix_end = r.position();
        let secret_length = r.read_positive_int()? as usize;
        if secret_length > 0 {
            if secret_length > MAX_SECRET_BITS {
                return Err(TicketError::Malformed("secret data too large"));
            }
            let mut secret_bits = r.reader_mut().read_vector(secret_length)?;
            let digest =
                self.shared.digests.digest(spec_index, &bits.range(0, prefix_end).to_bytes());
            secret_bits.xor_with(&BitVector::from_bytes(&digest, secret_length));
            let mut sr = CodedReader::new(BitVectorReader::new(&secret_bits));
            origin_adapter.read(&mut sr, true, &mut origin_values)?;
            data_adapter.read(&mut sr, true, &mut data_values)?;
            sr.read_positive_long()?; // nonce, length-hiding only
            if sr.remaining() != 0 {
                return Err(TicketError::Malformed("extra secret bits"));
            }
        }
        let origin = origin_adapter.adapt(origin_values);
        let data = data_adapter.adapt(data_values);

        let hash_length = spec.hash_length();
        if hash_length > 0 {
            let expected = self.shared.digests.hash_tag(
                spec_index,
                hash_length,
                &bits.range(0, r.position()).to_bytes(),
            );
            let actual = r.reader_mut().read_vector(hash_length as usize)?;
            let matches: bool = expected.to_bytes().ct_eq(&actual.to_bytes()).into();
            if !matches {
                return Err(TicketError::BadHash);
            }
        }

        if size - r.position() > 4 {
            return Err(TicketError::Malformed("superfluous trailing bits"));
        }
        while r.remaining() > 0 {
            if r.reader_mut().read_bit()? {
                return Err(TicketError::Malformed("non-zero padding bit"));
            }
        }

        let timestamp_ms = spec.timestamp_to_millis(timestamp)?;
        Ok(Ticket::new(
            spec.clone(),
            spec_index,
            bits,
            timestamp_ms,
            sequence,
            origin,
            data,
            str.to_owned(),
        ))
    }
}
