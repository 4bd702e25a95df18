use std::sync::Arc;

use scrip_bits::coding::{CodedReader, CodedWriter};
use scrip_bits::{BitRead, BitWrite};

use crate::errors::TicketError;
use crate::schema::{ArrayValue, ElemKind, FieldKind, FieldSchema, Record, Value};

/// Serializes and deserializes value tuples against one [`FieldSchema`].
///
/// Each call operates on a single partition (open or secret): it emits a
/// `positive_int` field count followed by the partition's values in
/// declared order, and reads tolerate shorter counts by leaving later
/// fields at their defaults.
#[derive(Clone, Debug)]
pub(crate) struct FieldAdapter {
    schema: Arc<FieldSchema>,
}

impl FieldAdapter {
    pub(crate) const fn new(schema: Arc<FieldSchema>) -> Self {
        Self { schema }
    }

    pub(crate) fn is_secretive(&self) -> bool {
        self.schema.is_secretive()
    }

    /// One default value per declared field.
    pub(crate) fn defaults(&self) -> Vec<Value> {
        self.schema.fields().iter().map(|f| Value::default_for(&f.kind)).collect()
    }

    /// Completes a caller-supplied value list into a dense, well-typed
    /// tuple. `None` (and any omitted trailing position) yields defaults.
    pub(crate) fn unadapt(&self, supplied: Option<&[Value]>) -> Result<Vec<Value>, TicketError> {
        let mut values = self.defaults();
        let Some(supplied) = supplied else {
            return Ok(values);
        };
        if supplied.len() > values.len() {
            return Err(TicketError::invalid("too many values"));
        }
        for (i, value) in supplied.iter().enumerate() {
            let kind = &self.schema.fields()[i].kind;
            if !value.matches(kind) {
                return Err(TicketError::invalid(format!("invalid value for field {i}")));
            }
            values[i] = value.clone();
        }
        Ok(values)
    }

    /// Projects a dense value tuple into the caller-visible record.
    pub(crate) fn adapt(&self, values: Vec<Value>) -> Record {
        Record::new(Arc::clone(&self.schema), values)
    }

    /// Emits the count and values of one partition; returns bits written.
    pub(crate) fn write<W: BitWrite>(
        &self,
        w: &mut CodedWriter<W>,
        secret: bool,
        values: &[Value],
    ) -> usize {
        let indices = self.schema.partition(secret);
        let mut written = w.write_positive_int(indices.len() as u32);
        for &index in indices {
            written += write_value(w, &values[index]);
        }
        written
    }

    /// Reads one partition into `values`, leaving fields beyond the
    /// encoded count at their prior (default) values.
    pub(crate) fn read<R: BitRead>(
        &self,
        r: &mut CodedReader<R>,
        secret: bool,
        values: &mut [Value],
    ) -> Result<(), TicketError> {
        let indices = self.schema.partition(secret);
        let count = r.read_positive_int()? as usize;
        if count == 0 {
            return Ok(());
        }
        if count > indices.len() {
            return Err(TicketError::Malformed("too many data fields"));
        }
        for &index in &indices[..count] {
            let kind = &self.schema.fields()[index].kind;
            values[index] = read_value(r, kind)?;
        }
        Ok(())
    }
}

fn write_value<W: BitWrite>(w: &mut CodedWriter<W>, value: &Value) -> usize {
    match value {
        Value::Bool(v) => w.write_boolean(*v),
        Value::I8(v) => w.write_int(i32::from(*v)),
        Value::I16(v) => w.write_int(i32::from(*v)),
        Value::I32(v) => w.write_int(*v),
        Value::I64(v) => w.write_long(*v),
        Value::Char(v) => w.write_positive_int(u32::from(*v)),
        Value::F32(v) => w.write_float(*v),
        Value::F64(v) => w.write_double(*v),
        Value::Str(v) => w.write_string(v),
        Value::Enum(ordinal) => w.write_positive_int(*ordinal as u32),
        Value::Array(array) => write_array(w, array),
    }
}

fn write_array<W: BitWrite>(w: &mut CodedWriter<W>, array: &ArrayValue) -> usize {
    let mut written = w.write_positive_int(array.len() as u32);
    match array {
        ArrayValue::Bool(v) => {
            for &e in v {
                written += w.write_boolean(e);
            }
        }
        ArrayValue::I8(v) => {
            for &e in v {
                written += w.write_int(i32::from(e));
            }
        }
        ArrayValue::I16(v) => {
            for &e in v {
                written += w.write_int(i32::from(e));
            }
        }
        ArrayValue::I32(v) => {
            for &e in v {
                written += w.write_int(e);
            }
        }
        ArrayValue::I64(v) => {
            for &e in v {
                written += w.write_long(e);
            }
        }
        ArrayValue::Char(v) => {
            for &e in v {
                written += w.write_positive_int(u32::from(e));
            }
        }
        ArrayValue::F32(v) => {
            for &e in v {
                written += w.write_float(e);
            }
        }
        ArrayValue::F64(v) => {
            for &e in v {
                written += w.write_double(e);
            }
        }
        ArrayValue::Enum(v) => {
            for &e in v {
                written += w.write_positive_int(e as u32);
            }
        }
    }
    written
}

fn read_value<R: BitRead>(r: &mut CodedReader<R>, kind: &FieldKind) -> Result<Value, TicketError> {
    Ok(match kind {
        FieldKind::Bool => Value::Bool(r.read_boolean()?),
        FieldKind::I8 => Value::I8(
            i8::try_from(r.read_int()?).map_err(|_| TicketError::Malformed("i8 out of range"))?,
        ),
        FieldKind::I16 => Value::I16(
            i16::try_from(r.read_int()?).map_err(|_| TicketError::Malformed("i16 out of range"))?,
        ),
        FieldKind::I32 => Value::I32(r.read_int()?),
        FieldKind::I64 => Value::I64(r.read_long()?),
        FieldKind::Char => Value::Char(
            u16::try_from(r.read_positive_int()?)
                .map_err(|_| TicketError::Malformed("char out of range"))?,
        ),
        FieldKind::F32 => Value::F32(r.read_float()?),
        FieldKind::F64 => Value::F64(r.read_double()?),
        FieldKind::Str => Value::Str(r.read_string()?),
        FieldKind::Enum(symbols) => Value::Enum(read_ordinal(r, symbols.len())?),
        FieldKind::Array(elem) => Value::Array(read_array(r, elem)?),
    })
}

fn read_array<R: BitRead>(r: &mut CodedReader<R>, elem: &ElemKind) -> Result<ArrayValue, TicketError> {
    let len = r.read_positive_int()? as usize;
    // Every element costs at least one bit, so a length prefix beyond the
    // remaining stream can be rejected before allocating.
    if len > r.remaining() {
        return Err(TicketError::Malformed("array length exceeds stream"));
    }
    Ok(match elem {
        ElemKind::Bool => {
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(r.read_boolean()?);
            }
            ArrayValue::Bool(v)
        }
        ElemKind::I8 => {
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(
                    i8::try_from(r.read_int()?)
                        .map_err(|_| TicketError::Malformed("i8 out of range"))?,
                );
            }
            ArrayValue::I8(v)
        }
        ElemKind::I16 => {
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(
                    i16::try_from(r.read_int()?)
                        .map_err(|_| TicketError::Malformed("i16 out of range"))?,
                );
            }
            ArrayValue::I16(v)
        }
        ElemKind::I32 => {
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(r.read_int()?);
            }
            ArrayValue::I32(v)
        }
        ElemKind::I64 => {
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(r.read_long()?);
            }
            ArrayValue::I64(v)
        }
        ElemKind::Char => {
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(
                    u16::try_from(r.read_positive_int()?)
                        .map_err(|_| TicketError::Malformed("char out of range"))?,
                );
            }
            ArrayValue::Char(v)
        }
        ElemKind::F32 => {
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(r.read_float()?);
            }
            ArrayValue::F32(v)
        }
        ElemKind::F64 => {
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(r.read_double()?);
            }
            ArrayValue::F64(v)
        }
        ElemKind::Enum(symbols) => {
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(read_ordinal(r, symbols.len())?);
            }
            ArrayValue::Enum(v)
        }
    })
}

fn read_ordinal<R: BitRead>(r: &mut CodedReader<R>, domain: usize) -> Result<usize, TicketError> {
    let ordinal = r.read_positive_int()? as usize;
    if ordinal >= domain {
        return Err(TicketError::Malformed("enum ordinal out of domain"));
    }
    Ok(ordinal)
}
