//! Untyped and type-directed decoding of MessagePack bytes.

use std::{error, fmt};

use crate::bytes::{self, Cursor};
use crate::encode::MAX_DEPTH;
use crate::marker::{self, Marker};
use crate::record::{Record, RecordType};
use crate::schema::{self, SchemaKind, SchemaNode, TypeExpr};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Truncated,
    InvalidPrefix(u8),
    Utf8,
    /// A token that does not satisfy the schema node in effect.
    Mismatch {
        location: String,
        expected: &'static str,
        got: &'static str,
    },
    TupleLength {
        location: String,
        expected: usize,
        got: usize,
    },
    MissingField {
        record: String,
        field: String,
    },
    InvalidEnumName {
        enum_name: String,
        name: String,
    },
    InvalidEnumValue {
        enum_name: String,
        value: String,
    },
    DepthLimit,
    /// Lazy schema construction failed while decoding.
    Schema(schema::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => f.write_str("input data was truncated"),
            Self::InvalidPrefix(op) => write!(f, "invalid prefix byte `0x{op:02x}`"),
            Self::Utf8 => f.write_str("invalid utf-8 in string payload"),
            Self::Mismatch {
                location,
                expected,
                got,
            } => write!(f, "Error decoding {location}: expected `{expected}`, got `{got}`"),
            Self::TupleLength {
                location,
                expected,
                got,
            } => write!(
                f,
                "Error decoding {location}: expected tuple of length {expected}, got {got}"
            ),
            Self::MissingField { record, field } => {
                write!(f, "Error decoding `{record}`: missing required field `{field}`")
            }
            Self::InvalidEnumName { enum_name, name } => {
                write!(f, "Error decoding enum `{enum_name}`: invalid name `{name}`")
            }
            Self::InvalidEnumValue { enum_name, value } => {
                write!(f, "Error decoding enum `{enum_name}`: invalid value `{value}`")
            }
            Self::DepthLimit => f.write_str("maximum recursion depth exceeded while decoding"),
            Self::Schema(err) => err.fmt(f),
        }
    }
}

impl error::Error for Error {}

impl From<bytes::Error> for Error {
    fn from(_: bytes::Error) -> Self {
        // The read path only fails on exhausted input.
        Error::Truncated
    }
}

impl From<schema::Error> for Error {
    fn from(err: schema::Error) -> Self {
        Error::Schema(err)
    }
}

/// The schema context a validation failure is reported against: either the
/// node the decoder was invoked with, or a field of the record currently
/// being decoded.
#[derive(Clone, Copy)]
enum Ctx<'a> {
    Schema(&'a SchemaNode),
    Field { record: &'a RecordType, index: usize },
}

impl Ctx<'_> {
    fn render(&self) -> String {
        match self {
            Ctx::Schema(node) => format!("`{node}`"),
            Ctx::Field { record, index } => {
                let field = record.field_name(*index);
                match record.built_field_schema(*index) {
                    Some(ty) => {
                        format!("`{}` field `{field}` (`{ty}`)", record.name())
                    }
                    None => format!("`{}` field `{field}`", record.name()),
                }
            }
        }
    }
}

fn mismatch(op: u8, expected: &'static str, ctx: Ctx<'_>) -> Error {
    Error::Mismatch {
        location: ctx.render(),
        expected,
        got: marker::kind_name(op),
    }
}

/// A MessagePack decoder holding a schema built once at construction.
#[derive(Debug)]
pub struct Decoder {
    schema: SchemaNode,
}

impl Decoder {
    /// A decoder validating against the given type declaration.
    pub fn new(ty: &TypeExpr) -> Result<Self, schema::Error> {
        Ok(Self {
            schema: SchemaNode::convert(ty)?,
        })
    }

    /// An untyped decoder: every token becomes its natural value.
    #[must_use]
    pub fn untyped() -> Self {
        Self {
            schema: SchemaNode {
                kind: SchemaKind::Any,
                optional: true,
            },
        }
    }

    /// Deserialize a value from bytes.
    pub fn decode(&self, buf: &[u8]) -> Result<Value, Error> {
        let mut cur = Cursor::new(buf);
        decode_node(&mut cur, &self.schema, Ctx::Schema(&self.schema), 0)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::untyped()
    }
}

impl fmt::Display for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decoder({})", self.schema)
    }
}

/// Deserialize a value without a schema.
pub fn decode(buf: &[u8]) -> Result<Value, Error> {
    let mut cur = Cursor::new(buf);
    decode_any(&mut cur, 0)
}

/// Deserialize a value, validating against a type declaration.
pub fn decode_as(buf: &[u8], ty: &TypeExpr) -> Result<Value, Error> {
    Decoder::new(ty)?.decode(buf)
}

fn decode_size(cur: &mut Cursor<'_>, marker: Marker) -> Result<usize, Error> {
    Ok(match marker {
        Marker::Str8 | Marker::Bin8 => cur.read_u8()? as usize,
        Marker::Str16 | Marker::Bin16 | Marker::Array16 | Marker::Map16 => {
            cur.read_u16()? as usize
        }
        _ => cur.read_u32()? as usize,
    })
}

fn utf8(bytes: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(bytes).map_err(|_| Error::Utf8)
}

/// Untyped decode: produce the natural value for every token.
fn decode_any(cur: &mut Cursor<'_>, depth: usize) -> Result<Value, Error> {
    let op = cur.read_u8()?;
    if marker::is_fixint(op) {
        return Ok(Value::Int(marker::fixint_value(op)));
    }
    if marker::is_fixstr(op) {
        let bytes = cur.read_bytes((op & 0x1f) as usize)?;
        return Ok(Value::Str(utf8(bytes)?.to_owned()));
    }
    if marker::is_fixarray(op) {
        return decode_any_array(cur, (op & 0x0f) as usize, depth);
    }
    if marker::is_fixmap(op) {
        return decode_any_map(cur, (op & 0x0f) as usize, depth);
    }
    let marker = Marker::try_from(op).map_err(|_| Error::InvalidPrefix(op))?;
    match marker {
        Marker::Nil => Ok(Value::Null),
        Marker::False => Ok(Value::Bool(false)),
        Marker::True => Ok(Value::Bool(true)),
        Marker::Uint8 => Ok(Value::Int(i64::from(cur.read_u8()?))),
        Marker::Uint16 => Ok(Value::Int(i64::from(cur.read_u16()?))),
        Marker::Uint32 => Ok(Value::Int(i64::from(cur.read_u32()?))),
        Marker::Uint64 => Ok(Value::from_u64(cur.read_u64()?)),
        Marker::Int8 => Ok(Value::Int(i64::from(cur.read_u8()? as i8))),
        Marker::Int16 => Ok(Value::Int(i64::from(cur.read_u16()? as i16))),
        Marker::Int32 => Ok(Value::Int(i64::from(cur.read_u32()? as i32))),
        Marker::Int64 => Ok(Value::Int(cur.read_u64()? as i64)),
        Marker::Float32 => Ok(Value::Float(f64::from(f32::from_bits(cur.read_u32()?)))),
        Marker::Float64 => Ok(Value::Float(f64::from_bits(cur.read_u64()?))),
        Marker::Str8 | Marker::Str16 | Marker::Str32 => {
            let size = decode_size(cur, marker)?;
            let bytes = cur.read_bytes(size)?;
            Ok(Value::Str(utf8(bytes)?.to_owned()))
        }
        Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => {
            let size = decode_size(cur, marker)?;
            Ok(Value::Bytes(cur.read_bytes(size)?.to_vec()))
        }
        Marker::Array16 | Marker::Array32 => {
            let size = decode_size(cur, marker)?;
            decode_any_array(cur, size, depth)
        }
        Marker::Map16 | Marker::Map32 => {
            let size = decode_size(cur, marker)?;
            decode_any_map(cur, size, depth)
        }
    }
}

fn decode_any_array(cur: &mut Cursor<'_>, size: usize, depth: usize) -> Result<Value, Error> {
    if size > 0 && depth >= MAX_DEPTH {
        return Err(Error::DepthLimit);
    }
    let mut items = Vec::with_capacity(size.min(cur.remaining()));
    for _ in 0..size {
        items.push(decode_any(cur, depth + 1)?);
    }
    Ok(Value::List(items))
}

fn decode_any_map(cur: &mut Cursor<'_>, size: usize, depth: usize) -> Result<Value, Error> {
    if size > 0 && depth >= MAX_DEPTH {
        return Err(Error::DepthLimit);
    }
    let mut pairs: Vec<(Value, Value)> = Vec::with_capacity(size.min(cur.remaining()));
    for _ in 0..size {
        let key = decode_any(cur, depth + 1)?;
        let val = decode_any(cur, depth + 1)?;
        map_insert(&mut pairs, key, val);
    }
    Ok(Value::Map(pairs))
}

/// Insert with mapping semantics: a repeated key replaces the bound value.
fn map_insert(pairs: &mut Vec<(Value, Value)>, key: Value, val: Value) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = val,
        None => pairs.push((key, val)),
    }
}

/// Advance over one value without materializing it.
fn skip(cur: &mut Cursor<'_>, depth: usize) -> Result<(), Error> {
    let op = cur.read_u8()?;
    if marker::is_fixint(op) {
        return Ok(());
    }
    if marker::is_fixstr(op) {
        cur.read_bytes((op & 0x1f) as usize)?;
        return Ok(());
    }
    if marker::is_fixarray(op) {
        return skip_many(cur, (op & 0x0f) as usize, depth);
    }
    if marker::is_fixmap(op) {
        return skip_many(cur, (op & 0x0f) as usize * 2, depth);
    }
    let marker = Marker::try_from(op).map_err(|_| Error::InvalidPrefix(op))?;
    match marker {
        Marker::Nil | Marker::False | Marker::True => Ok(()),
        Marker::Uint8 | Marker::Int8 => cur.read_bytes(1).map(drop).map_err(Into::into),
        Marker::Uint16 | Marker::Int16 => cur.read_bytes(2).map(drop).map_err(Into::into),
        Marker::Uint32 | Marker::Int32 | Marker::Float32 => {
            cur.read_bytes(4).map(drop).map_err(Into::into)
        }
        Marker::Uint64 | Marker::Int64 | Marker::Float64 => {
            cur.read_bytes(8).map(drop).map_err(Into::into)
        }
        Marker::Str8 | Marker::Str16 | Marker::Str32 | Marker::Bin8 | Marker::Bin16
        | Marker::Bin32 => {
            let size = decode_size(cur, marker)?;
            cur.read_bytes(size)?;
            Ok(())
        }
        Marker::Array16 | Marker::Array32 => {
            let size = decode_size(cur, marker)?;
            skip_many(cur, size, depth)
        }
        Marker::Map16 | Marker::Map32 => {
            let size = decode_size(cur, marker)?;
            skip_many(cur, size.saturating_mul(2), depth)
        }
    }
}

fn skip_many(cur: &mut Cursor<'_>, count: usize, depth: usize) -> Result<(), Error> {
    if count > 0 && depth >= MAX_DEPTH {
        return Err(Error::DepthLimit);
    }
    for _ in 0..count {
        skip(cur, depth + 1)?;
    }
    Ok(())
}

/// Decode one value against a schema node.
fn decode_node(
    cur: &mut Cursor<'_>,
    node: &SchemaNode,
    ctx: Ctx<'_>,
    depth: usize,
) -> Result<Value, Error> {
    if matches!(node.kind, SchemaKind::Any) {
        return decode_any(cur, depth);
    }

    let op = cur.read_u8()?;

    if op == Marker::Nil as u8 && node.optional {
        return Ok(Value::Null);
    }

    match &node.kind {
        SchemaKind::Any => unreachable!("handled above"),
        SchemaKind::Null => Err(mismatch(op, "None", ctx)),
        SchemaKind::Bool => match Marker::try_from(op) {
            Ok(Marker::True) => Ok(Value::Bool(true)),
            Ok(Marker::False) => Ok(Value::Bool(false)),
            _ => Err(mismatch(op, "bool", ctx)),
        },
        SchemaKind::Int => decode_int(cur, op, ctx),
        SchemaKind::Float => decode_float(cur, op, ctx),
        SchemaKind::Str => {
            let size = str_size(cur, op, "str", ctx)?;
            Ok(Value::Str(utf8(cur.read_bytes(size)?)?.to_owned()))
        }
        SchemaKind::Bytes => Ok(Value::Bytes(bin_payload(cur, op, "bytes", ctx)?.to_vec())),
        SchemaKind::ByteArray => Ok(Value::ByteArray(
            bin_payload(cur, op, "bytearray", ctx)?.to_vec(),
        )),
        SchemaKind::Enum(et) => {
            let size = str_size(cur, op, "str", ctx)?;
            let name = utf8(cur.read_bytes(size)?)?;
            et.member(name).map(Value::Enum).ok_or_else(|| {
                Error::InvalidEnumName {
                    enum_name: et.name().to_owned(),
                    name: name.to_owned(),
                }
            })
        }
        SchemaKind::IntEnum(et) => {
            let code = decode_int(cur, op, ctx)?;
            let member = code.as_i64().and_then(|v| et.member_by_value(v));
            member.map(Value::Enum).ok_or_else(|| {
                let value = match code {
                    Value::Int(v) => v.to_string(),
                    Value::Uint(v) => v.to_string(),
                    _ => String::new(),
                };
                Error::InvalidEnumValue {
                    enum_name: et.name().to_owned(),
                    value,
                }
            })
        }
        SchemaKind::Record(rt) => decode_record(cur, op, rt, ctx, depth),
        SchemaKind::List(el) => {
            let size = array_size(cur, op, "list", ctx)?;
            let items = decode_elements(cur, el, size, ctx, depth)?;
            Ok(Value::List(items))
        }
        SchemaKind::Set(el) => {
            let size = array_size(cur, op, "set", ctx)?;
            if size > 0 && depth >= MAX_DEPTH {
                return Err(Error::DepthLimit);
            }
            let mut items: Vec<Value> = Vec::with_capacity(size.min(cur.remaining()));
            for _ in 0..size {
                let item = decode_node(cur, el, ctx, depth + 1)?;
                if !items.contains(&item) {
                    items.push(item);
                }
            }
            Ok(Value::Set(items))
        }
        SchemaKind::VarTuple(el) => {
            let size = array_size(cur, op, "tuple", ctx)?;
            let items = decode_elements(cur, el, size, ctx, depth)?;
            Ok(Value::Tuple(items))
        }
        SchemaKind::FixTuple(els) => {
            let size = array_size(cur, op, "tuple", ctx)?;
            if size != els.len() {
                return Err(Error::TupleLength {
                    location: ctx.render(),
                    expected: els.len(),
                    got: size,
                });
            }
            if size > 0 && depth >= MAX_DEPTH {
                return Err(Error::DepthLimit);
            }
            let mut items = Vec::with_capacity(size);
            for el in els {
                items.push(decode_node(cur, el, ctx, depth + 1)?);
            }
            Ok(Value::Tuple(items))
        }
        SchemaKind::Dict(key_ty, val_ty) => {
            let size = map_size(cur, op, "dict", ctx)?;
            if size > 0 && depth >= MAX_DEPTH {
                return Err(Error::DepthLimit);
            }
            let mut pairs: Vec<(Value, Value)> = Vec::with_capacity(size.min(cur.remaining()));
            for _ in 0..size {
                let key = decode_node(cur, key_ty, ctx, depth + 1)?;
                let val = decode_node(cur, val_ty, ctx, depth + 1)?;
                map_insert(&mut pairs, key, val);
            }
            Ok(Value::Map(pairs))
        }
    }
}

/// Any integer-bearing token, widened.
fn decode_int(cur: &mut Cursor<'_>, op: u8, ctx: Ctx<'_>) -> Result<Value, Error> {
    if marker::is_fixint(op) {
        return Ok(Value::Int(marker::fixint_value(op)));
    }
    match Marker::try_from(op) {
        Ok(Marker::Uint8) => Ok(Value::Int(i64::from(cur.read_u8()?))),
        Ok(Marker::Uint16) => Ok(Value::Int(i64::from(cur.read_u16()?))),
        Ok(Marker::Uint32) => Ok(Value::Int(i64::from(cur.read_u32()?))),
        Ok(Marker::Uint64) => Ok(Value::from_u64(cur.read_u64()?)),
        Ok(Marker::Int8) => Ok(Value::Int(i64::from(cur.read_u8()? as i8))),
        Ok(Marker::Int16) => Ok(Value::Int(i64::from(cur.read_u16()? as i16))),
        Ok(Marker::Int32) => Ok(Value::Int(i64::from(cur.read_u32()? as i32))),
        Ok(Marker::Int64) => Ok(Value::Int(cur.read_u64()? as i64)),
        _ => Err(mismatch(op, "int", ctx)),
    }
}

/// Float tokens, plus any integer token widened to double.
fn decode_float(cur: &mut Cursor<'_>, op: u8, ctx: Ctx<'_>) -> Result<Value, Error> {
    if marker::is_fixint(op) {
        return Ok(Value::Float(marker::fixint_value(op) as f64));
    }
    let out = match Marker::try_from(op) {
        Ok(Marker::Float32) => f64::from(f32::from_bits(cur.read_u32()?)),
        Ok(Marker::Float64) => f64::from_bits(cur.read_u64()?),
        Ok(Marker::Uint8) => f64::from(cur.read_u8()?),
        Ok(Marker::Uint16) => f64::from(cur.read_u16()?),
        Ok(Marker::Uint32) => f64::from(cur.read_u32()?),
        Ok(Marker::Uint64) => cur.read_u64()? as f64,
        Ok(Marker::Int8) => f64::from(cur.read_u8()? as i8),
        Ok(Marker::Int16) => f64::from(cur.read_u16()? as i16),
        Ok(Marker::Int32) => f64::from(cur.read_u32()? as i32),
        Ok(Marker::Int64) => cur.read_u64()? as i64 as f64,
        _ => return Err(mismatch(op, "float", ctx)),
    };
    Ok(Value::Float(out))
}

fn str_size(
    cur: &mut Cursor<'_>,
    op: u8,
    expected: &'static str,
    ctx: Ctx<'_>,
) -> Result<usize, Error> {
    if marker::is_fixstr(op) {
        return Ok((op & 0x1f) as usize);
    }
    match Marker::try_from(op) {
        Ok(m @ (Marker::Str8 | Marker::Str16 | Marker::Str32)) => decode_size(cur, m),
        _ => Err(mismatch(op, expected, ctx)),
    }
}

fn bin_payload<'input>(
    cur: &mut Cursor<'input>,
    op: u8,
    expected: &'static str,
    ctx: Ctx<'_>,
) -> Result<&'input [u8], Error> {
    let size = match Marker::try_from(op) {
        Ok(m @ (Marker::Bin8 | Marker::Bin16 | Marker::Bin32)) => decode_size(cur, m)?,
        _ => return Err(mismatch(op, expected, ctx)),
    };
    Ok(cur.read_bytes(size)?)
}

fn array_size(
    cur: &mut Cursor<'_>,
    op: u8,
    expected: &'static str,
    ctx: Ctx<'_>,
) -> Result<usize, Error> {
    if marker::is_fixarray(op) {
        return Ok((op & 0x0f) as usize);
    }
    match Marker::try_from(op) {
        Ok(m @ (Marker::Array16 | Marker::Array32)) => decode_size(cur, m),
        _ => Err(mismatch(op, expected, ctx)),
    }
}

fn map_size(
    cur: &mut Cursor<'_>,
    op: u8,
    expected: &'static str,
    ctx: Ctx<'_>,
) -> Result<usize, Error> {
    if marker::is_fixmap(op) {
        return Ok((op & 0x0f) as usize);
    }
    match Marker::try_from(op) {
        Ok(m @ (Marker::Map16 | Marker::Map32)) => decode_size(cur, m),
        _ => Err(mismatch(op, expected, ctx)),
    }
}

fn decode_elements(
    cur: &mut Cursor<'_>,
    el: &SchemaNode,
    size: usize,
    ctx: Ctx<'_>,
    depth: usize,
) -> Result<Vec<Value>, Error> {
    if size > 0 && depth >= MAX_DEPTH {
        return Err(Error::DepthLimit);
    }
    let mut items = Vec::with_capacity(size.min(cur.remaining()));
    for _ in 0..size {
        items.push(decode_node(cur, el, ctx, depth + 1)?);
    }
    Ok(items)
}

/// Decode a map into a record instance: resolve each key with the rotating
/// cursor, skip unknown fields, then fill defaults and report any required
/// field still unset.
fn decode_record(
    cur: &mut Cursor<'_>,
    op: u8,
    rt: &RecordType,
    ctx: Ctx<'_>,
    depth: usize,
) -> Result<Value, Error> {
    let types = rt.field_schemas()?;
    let size = map_size(cur, op, "record", ctx)?;
    if size > 0 && depth >= MAX_DEPTH {
        return Err(Error::DepthLimit);
    }

    let nfields = rt.num_fields();
    let npos = rt.num_required();
    let mut slots: Vec<Option<Value>> = (0..nfields).map(|_| None).collect();
    let mut pos = 0usize;

    for _ in 0..size {
        let key_op = cur.read_u8()?;
        let key_size = str_size(cur, key_op, "str", ctx)?;
        let key = utf8(cur.read_bytes(key_size)?)?;
        match rt.field_index(key, &mut pos) {
            None => skip(cur, depth + 1)?,
            Some(index) => {
                let field_ctx = Ctx::Field { record: rt, index };
                slots[index] = Some(decode_node(cur, &types[index], field_ctx, depth + 1)?);
            }
        }
    }

    let slots = slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| match slot {
            Some(value) => Ok(value),
            None if i < npos => Err(Error::MissingField {
                record: rt.name().to_owned(),
                field: rt.field_name(i).to_owned(),
            }),
            None => Ok(rt.default(i - npos).clone()),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Value::Record(Record::from_slots(
        rt.clone(),
        slots.into_boxed_slice(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;

    #[test]
    fn test_untyped_scalars() {
        assert_eq!(Value::Null, decode(&[0xc0]).unwrap());
        assert_eq!(Value::Bool(true), decode(&[0xc3]).unwrap());
        assert_eq!(Value::Int(127), decode(&[0x7f]).unwrap());
        assert_eq!(Value::Int(-32), decode(&[0xe0]).unwrap());
        assert_eq!(Value::Str("hi".into()), decode(&[0xa2, 0x68, 0x69]).unwrap());
    }

    #[test]
    fn test_untyped_rejects_extension_tokens() {
        assert_eq!(Err(Error::InvalidPrefix(0xc1)), decode(&[0xc1]));
        assert_eq!(Err(Error::InvalidPrefix(0xc7)), decode(&[0xc7, 0x00]));
        assert_eq!(Err(Error::InvalidPrefix(0xd4)), decode(&[0xd4, 0x00, 0x00]));
    }

    #[test]
    fn test_truncated() {
        assert_eq!(Err(Error::Truncated), decode(&[]));
        assert_eq!(Err(Error::Truncated), decode(&[0xcc]));
        assert_eq!(Err(Error::Truncated), decode(&[0x92, 0x01]));
        assert_eq!(Err(Error::Truncated), decode(&[0xa3, 0x68]));
    }

    #[test]
    fn test_map_duplicate_keys_overwrite() {
        // {"a": 1, "a": 2} decodes to {"a": 2}
        let buf = [0x82, 0xa1, b'a', 0x01, 0xa1, b'a', 0x02];
        assert_eq!(
            Value::Map(vec![(Value::from("a"), Value::Int(2))]),
            decode(&buf).unwrap()
        );
    }

    #[test]
    fn test_optional_accepts_nil() {
        let ty = TypeExpr::optional(TypeExpr::Int);
        assert_eq!(Value::Null, decode_as(&[0xc0], &ty).unwrap());
        assert_eq!(Value::Int(3), decode_as(&[0x03], &ty).unwrap());
    }

    #[test]
    fn test_mismatch_message() {
        let err = decode_as(&[0xa1, b'x'], &TypeExpr::list(TypeExpr::Int)).unwrap_err();
        assert_eq!(
            "Error decoding `List[int]`: expected `list`, got `str`",
            err.to_string()
        );

        let err = decode_as(&[0x91, 0xc0], &TypeExpr::list(TypeExpr::Int)).unwrap_err();
        assert_eq!(
            "Error decoding `List[int]`: expected `int`, got `None`",
            err.to_string()
        );
    }

    #[test]
    fn test_int_widening_into_float() {
        let one = encode(&Value::Int(1)).unwrap();
        assert_eq!(Value::Float(1.0), decode_as(&one, &TypeExpr::Float).unwrap());
        let half = encode(&Value::Float(1.5)).unwrap();
        assert_eq!(Value::Float(1.5), decode_as(&half, &TypeExpr::Float).unwrap());
    }

    #[test]
    fn test_skip_depth_guard() {
        // deeply nested arrays inside an unknown record field
        let ty = crate::record::RecordType::new("R", vec![("a".into(), Some(Value::Null))], || {
            vec![TypeExpr::optional(TypeExpr::Int)]
        })
        .unwrap();
        let mut buf = vec![0x81, 0xa1, b'z'];
        buf.extend(std::iter::repeat_n(0x91, MAX_DEPTH + 1));
        buf.push(0xc0);
        let err = decode_as(&buf, &TypeExpr::Record(ty)).unwrap_err();
        assert_eq!(Error::DepthLimit, err);
    }

    #[test]
    fn test_decoder_display() {
        let dec = Decoder::new(&TypeExpr::optional(TypeExpr::list(TypeExpr::Str))).unwrap();
        assert_eq!("Decoder(Optional[List[str]])", dec.to_string());
        assert_eq!("Decoder(Any)", Decoder::untyped().to_string());
    }
}
