use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::TicketError;

/// Element kind of a primitive array field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElemKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    /// UTF-16 code unit, the char-equivalent kind.
    Char,
    F32,
    F64,
    /// Symbol domain; array elements carry ordinals into it.
    Enum(Vec<String>),
}

/// Kind of a single ticket field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    /// UTF-16 code unit, the char-equivalent kind.
    Char,
    F32,
    F64,
    Str,
    /// Symbol domain; values carry ordinals into it.
    Enum(Vec<String>),
    Array(ElemKind),
}

/// One declared field: a position in the wire layout, a kind, and whether
/// the value belongs to the encrypted block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub index: usize,
    pub kind: FieldKind,
    pub secret: bool,
}

impl FieldDef {
    /// An openly-serialized field at `index`.
    #[must_use]
    pub const fn open(index: usize, kind: FieldKind) -> Self {
        Self { index, kind, secret: false }
    }

    /// A field at `index` whose value is emitted inside the encrypted block.
    #[must_use]
    pub const fn secret(index: usize, kind: FieldKind) -> Self {
        Self { index, kind, secret: true }
    }
}

/// An ordered, validated list of ticket fields.
///
/// Indices are dense and start at zero. Construction is the only place
/// schema errors can arise; serialization and adaptation rely on the
/// invariants established here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldDef>", into = "Vec<FieldDef>")]
pub struct FieldSchema {
    fields: Vec<FieldDef>,
    open: Vec<usize>,
    secret: Vec<usize>,
}

impl FieldSchema {
    /// Validates and orders the supplied field definitions.
    pub fn new(mut defs: Vec<FieldDef>) -> Result<Self, TicketError> {
        defs.sort_by_key(|d| d.index);
        for (i, def) in defs.iter().enumerate() {
            if def.index > i {
                return Err(TicketError::invalid(format!("missing field index {i}")));
            }
            if def.index < i {
                return Err(TicketError::invalid(format!("duplicate field index {i}")));
            }
            check_kind(&def.kind)?;
        }
        let open = defs.iter().filter(|d| !d.secret).map(|d| d.index).collect();
        let secret = defs.iter().filter(|d| d.secret).map(|d| d.index).collect();
        Ok(Self { fields: defs, open, secret })
    }

    /// The empty schema, used where no origin or data is recorded.
    #[must_use]
    pub const fn unit() -> Self {
        Self { fields: Vec::new(), open: Vec::new(), secret: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Declared indices of the open or secret partition, in order.
    #[must_use]
    pub(crate) fn partition(&self, secret: bool) -> &[usize] {
        if secret {
            &self.secret
        } else {
            &self.open
        }
    }

    /// True when any field belongs to the encrypted block.
    #[must_use]
    pub fn is_secretive(&self) -> bool {
        !self.secret.is_empty()
    }
}

fn check_kind(kind: &FieldKind) -> Result<(), TicketError> {
    match kind {
        FieldKind::Enum(symbols) if symbols.is_empty() => {
            Err(TicketError::invalid("enum field without symbols"))
        }
        FieldKind::Array(ElemKind::Enum(symbols)) if symbols.is_empty() => {
            Err(TicketError::invalid("enum array field without symbols"))
        }
        _ => Ok(()),
    }
}

impl TryFrom<Vec<FieldDef>> for FieldSchema {
    type Error = TicketError;

    fn try_from(defs: Vec<FieldDef>) -> Result<Self, TicketError> {
        Self::new(defs)
    }
}

impl From<FieldSchema> for Vec<FieldDef> {
    fn from(schema: FieldSchema) -> Self {
        schema.fields
    }
}

/// A concrete array value; the variant must match the declared [`ElemKind`].
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayValue {
    Bool(Vec<bool>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    Char(Vec<u16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Enum(Vec<usize>),
}

impl ArrayValue {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::I8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::Char(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::Enum(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A concrete field value; the variant must match the declared [`FieldKind`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Char(u16),
    F32(f32),
    F64(f64),
    Str(String),
    /// Ordinal into the field's symbol domain.
    Enum(usize),
    Array(ArrayValue),
}

impl Value {
    /// The kind-specific zero value: numeric zero, empty string or array,
    /// the first enum symbol, `false`.
    #[must_use]
    pub fn default_for(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Bool => Self::Bool(false),
            FieldKind::I8 => Self::I8(0),
            FieldKind::I16 => Self::I16(0),
            FieldKind::I32 => Self::I32(0),
            FieldKind::I64 => Self::I64(0),
            FieldKind::Char => Self::Char(0),
            FieldKind::F32 => Self::F32(0.0),
            FieldKind::F64 => Self::F64(0.0),
            FieldKind::Str => Self::Str(String::new()),
            FieldKind::Enum(_) => Self::Enum(0),
            FieldKind::Array(elem) => Self::Array(match elem {
                ElemKind::Bool => ArrayValue::Bool(Vec::new()),
                ElemKind::I8 => ArrayValue::I8(Vec::new()),
                ElemKind::I16 => ArrayValue::I16(Vec::new()),
                ElemKind::I32 => ArrayValue::I32(Vec::new()),
                ElemKind::I64 => ArrayValue::I64(Vec::new()),
                ElemKind::Char => ArrayValue::Char(Vec::new()),
                ElemKind::F32 => ArrayValue::F32(Vec::new()),
                ElemKind::F64 => ArrayValue::F64(Vec::new()),
                ElemKind::Enum(_) => ArrayValue::Enum(Vec::new()),
            }),
        }
    }

    /// Whether this value is well-typed for `kind`, including enum ordinal
    /// range checks.
    #[must_use]
    pub fn matches(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (Self::Bool(_), FieldKind::Bool)
            | (Self::I8(_), FieldKind::I8)
            | (Self::I16(_), FieldKind::I16)
            | (Self::I32(_), FieldKind::I32)
            | (Self::I64(_), FieldKind::I64)
            | (Self::Char(_), FieldKind::Char)
            | (Self::F32(_), FieldKind::F32)
            | (Self::F64(_), FieldKind::F64)
            | (Self::Str(_), FieldKind::Str) => true,
            (Self::Enum(ordinal), FieldKind::Enum(symbols)) => *ordinal < symbols.len(),
            (Self::Array(array), FieldKind::Array(elem)) => match (array, elem) {
                (ArrayValue::Bool(_), ElemKind::Bool)
                | (ArrayValue::I8(_), ElemKind::I8)
                | (ArrayValue::I16(_), ElemKind::I16)
                | (ArrayValue::I32(_), ElemKind::I32)
                | (ArrayValue::I64(_), ElemKind::I64)
                | (ArrayValue::Char(_), ElemKind::Char)
                | (ArrayValue::F32(_), ElemKind::F32)
                | (ArrayValue::F64(_), ElemKind::F64) => true,
                (ArrayValue::Enum(ordinals), ElemKind::Enum(symbols)) => {
                    ordinals.iter().all(|&o| o < symbols.len())
                }
                _ => false,
            },
            _ => false,
        }
    }
}

/// The adapter's projection of one decoded (or issued) value tuple.
///
/// A record is a dense vector of well-typed values sharing the schema it
/// was adapted under. Equality compares values positionally.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    schema: Arc<FieldSchema>,
    values: Vec<Value>,
}

impl Record {
    pub(crate) const fn new(schema: Arc<FieldSchema>, values: Vec<Value>) -> Self {
        Self { schema, values }
    }

    #[must_use]
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The value at a declared field index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The symbol named by an enum field's ordinal, when both exist.
    #[must_use]
    pub fn symbol(&self, index: usize) -> Option<&str> {
        let ordinal = match self.values.get(index)? {
            Value::Enum(ordinal) => *ordinal,
            _ => return None,
        };
        match &self.schema.fields.get(index)?.kind {
            FieldKind::Enum(symbols) => symbols.get(ordinal).map(String::as_str),
            _ => None,
        }
    }
}
