#![forbid(unsafe_code)]
#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::result_large_err
)]

//! Compact, tamper-evident ASCII tickets.
//!
//! A ticket is a short human-transcribable token carrying a timestamp, a
//! sequence number, an origin descriptor, application data and,
//! optionally, a keyed Keccak-224 integrity tag. Fields marked secret
//! travel inside a block XOR-encrypted with a digest of the ticket's own
//! open prefix, with a pseudo-random nonce hiding the payload length.
//!
//! The pipeline, leaves first:
//!
//! - bit-serial layout over an extended Elias-omega coding
//!   ([`scrip_bits`])
//! - base-32 ASCII surface with grouping and padding ([`TicketFormat`])
//! - caller-declared field schemas mapping records to wire tuples
//!   ([`FieldSchema`], [`Value`], [`Record`])
//! - per-spec prekeyed digests for hashing and encryption
//!   ([`TicketSpec`])
//! - per-origin issuing machines and a decoding factory
//!   ([`TicketMachine`], [`TicketFactory`])
//!
//! ```
//! use scrip::TicketConfig;
//!
//! let factory = TicketConfig::default().new_factory(&[]).unwrap();
//! let ticket = factory.machine().unwrap().issue().unwrap();
//! let decoded = factory.decode(&ticket.to_string()).unwrap();
//! assert_eq!(decoded, ticket);
//! ```

mod adapter;
mod digest;

pub mod basis;
pub mod config;
pub mod errors;
pub mod factory;
pub mod format;
pub mod machine;
pub mod schema;
pub mod sequence;
pub mod spec;
pub mod ticket;

pub use scrip_bits::BitVector;

pub use basis::TicketBasis;
pub use config::TicketConfig;
pub use errors::TicketError;
pub use factory::TicketFactory;
pub use format::TicketFormat;
pub use machine::TicketMachine;
pub use schema::{ArrayValue, ElemKind, FieldDef, FieldKind, FieldSchema, Record, Value};
pub use sequence::{CountingSequence, SharedSequences, TicketSequence, TicketSequences};
pub use spec::{Granularity, TicketSpec, TicketSpecBuilder};
pub use ticket::Ticket;
