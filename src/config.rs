use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::TicketError;
use crate::factory::TicketFactory;
use crate::schema::FieldSchema;
use crate::sequence::TicketSequences;
use crate::spec::TicketSpec;

/// Configures a [`TicketFactory`]. Factories built from equal
/// configurations (holding the same secrets) produce interchangeable
/// tickets, so a configuration may be persisted and shared between
/// processes to keep a system's tickets compatible.
///
/// Secrets are deliberately not part of the configuration: they are
/// supplied at factory construction and never serialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketConfig {
    origin_schema: FieldSchema,
    data_schema: FieldSchema,
    specs: Vec<TicketSpec>,
    char_limit: usize,
}

impl Default for TicketConfig {
    /// Unit origin and data schemas, the default specification, and a
    /// 256-character limit.
    fn default() -> Self {
        Self {
            origin_schema: FieldSchema::unit(),
            data_schema: FieldSchema::unit(),
            specs: vec![TicketSpec::default()],
            char_limit: 256,
        }
    }
}

impl TicketConfig {
    /// The schema of origin information recorded in tickets.
    #[must_use]
    pub const fn origin_schema(&self) -> &FieldSchema {
        &self.origin_schema
    }

    /// The schema of per-ticket data recorded in tickets.
    #[must_use]
    pub const fn data_schema(&self) -> &FieldSchema {
        &self.data_schema
    }

    /// The ordered specification list; the last entry is the primary used
    /// to issue new tickets, earlier entries decode historical ones.
    #[must_use]
    pub fn specs(&self) -> &[TicketSpec] {
        &self.specs
    }

    /// Tickets longer than this fail to encode and to decode.
    #[must_use]
    pub const fn char_limit(&self) -> usize {
        self.char_limit
    }

    /// This configuration with a different origin schema.
    #[must_use]
    pub fn with_origin_schema(mut self, schema: FieldSchema) -> Self {
        self.origin_schema = schema;
        self
    }

    /// This configuration with a different data schema.
    #[must_use]
    pub fn with_data_schema(mut self, schema: FieldSchema) -> Self {
        self.data_schema = schema;
        self
    }

    /// This configuration with the given specification history. Supply
    /// every specification ever issued under, oldest first and the
    /// current one last; an empty list selects the default specification.
    #[must_use]
    pub fn with_specs(mut self, specs: Vec<TicketSpec>) -> Self {
        self.specs = if specs.is_empty() { vec![TicketSpec::default()] } else { specs };
        self
    }

    /// This configuration with a different ticket character limit.
    pub fn with_char_limit(mut self, char_limit: usize) -> Result<Self, TicketError> {
        if char_limit == 0 {
            return Err(TicketError::invalid("character limit must be positive"));
        }
        self.char_limit = char_limit;
        Ok(self)
    }

    /// Creates a factory with transient in-memory sequences.
    ///
    /// Secrets are optional and only effective combined with hashing
    /// specs: the secret at index `n` keys the `n`th specification, the
    /// last supplied secret carries over to any later specifications, and
    /// an empty secret means unkeyed. At most one secret per spec.
    pub fn new_factory(&self, secrets: &[&[u8]]) -> Result<TicketFactory, TicketError> {
        TicketFactory::new(self, None, secrets)
    }

    /// Creates a factory whose sequences come from the supplied provider,
    /// the hook for applications that persist numbering state.
    pub fn new_factory_with_sequences(
        &self,
        sequences: Arc<dyn TicketSequences>,
        secrets: &[&[u8]],
    ) -> Result<TicketFactory, TicketError> {
        TicketFactory::new(self, Some(sequences), secrets)
    }
}
