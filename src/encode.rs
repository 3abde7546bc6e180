//! Encoding of values into the MessagePack wire format.

use std::{error, fmt};

use crate::bytes::{self, Buffer};
use crate::marker::{FIXARRAY, FIXMAP, FIXSTR, Marker};
use crate::record::Record;
use crate::value::Value;

/// Container nesting bound, shared with the decoder.
pub(crate) const MAX_DEPTH: usize = 1024;

const DEFAULT_WRITE_BUFFER_SIZE: usize = 4096;
const MIN_WRITE_BUFFER_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A string, binary, array, or map payload with 2^32 or more elements.
    TooLong(&'static str),
    DepthLimit,
    BufferOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong(kind) => write!(f, "can't encode {kind} longer than 2**32 - 1"),
            Self::DepthLimit => f.write_str("maximum recursion depth exceeded while encoding"),
            Self::BufferOverflow => f.write_str("output buffer size overflow"),
        }
    }
}

impl error::Error for Error {}

impl From<bytes::Error> for Error {
    fn from(_: bytes::Error) -> Self {
        // The write path only fails on size arithmetic overflow.
        Error::BufferOverflow
    }
}

/// A MessagePack encoder with a reusable write buffer.
///
/// The buffer starts at the configured size and is reused across calls; a
/// call that outgrows it hands the grown buffer off as its result and a
/// fresh steady-state buffer is allocated on the next call.
#[derive(Debug)]
pub struct Encoder {
    write_buffer_size: usize,
    buf: Option<Buffer>,
}

impl Encoder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_WRITE_BUFFER_SIZE)
    }

    #[must_use]
    pub fn with_buffer_size(write_buffer_size: usize) -> Self {
        let write_buffer_size = write_buffer_size.max(MIN_WRITE_BUFFER_SIZE);
        Self {
            write_buffer_size,
            buf: Some(Buffer::with_capacity(write_buffer_size)),
        }
    }

    /// Serialize a value to bytes.
    pub fn encode(&mut self, value: &Value) -> Result<Vec<u8>, Error> {
        let mut buf = self
            .buf
            .take()
            .unwrap_or_else(|| Buffer::with_capacity(self.write_buffer_size));
        buf.clear();
        match encode_value(&mut buf, value, 0) {
            Ok(()) => {
                if buf.capacity() > self.write_buffer_size {
                    // Buffer was resized; trim it to length and give it away.
                    Ok(buf.into_trimmed_vec())
                } else {
                    // Steady-state buffer: copy the used prefix out, keep it.
                    let out = buf.as_slice().to_vec();
                    self.buf = Some(buf);
                    Ok(out)
                }
            }
            Err(err) => {
                if buf.capacity() <= self.write_buffer_size {
                    self.buf = Some(buf);
                }
                Err(err)
            }
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot encode with a small scratch buffer.
pub fn encode(value: &Value) -> Result<Vec<u8>, Error> {
    let mut buf = Buffer::with_capacity(64);
    encode_value(&mut buf, value, 0)?;
    Ok(buf.into_trimmed_vec())
}

fn encode_value(buf: &mut Buffer, value: &Value, depth: usize) -> Result<(), Error> {
    match value {
        Value::Null => Ok(buf.write(&[Marker::Nil as u8])?),
        Value::Bool(false) => Ok(buf.write(&[Marker::False as u8])?),
        Value::Bool(true) => Ok(buf.write(&[Marker::True as u8])?),
        Value::Int(x) => encode_i64(buf, *x),
        Value::Uint(x) => encode_u64(buf, *x),
        Value::Float(x) => {
            let mut out = [0u8; 9];
            out[0] = Marker::Float64 as u8;
            out[1..].copy_from_slice(&x.to_bits().to_be_bytes());
            Ok(buf.write(&out)?)
        }
        Value::Str(s) => encode_str(buf, s),
        Value::Bytes(b) | Value::ByteArray(b) => encode_bin(buf, b),
        Value::List(items) => encode_array(buf, items, "lists", depth),
        Value::Set(items) => encode_array(buf, items, "sets", depth),
        Value::Tuple(items) => encode_array(buf, items, "tuples", depth),
        Value::Map(pairs) => {
            encode_map_header(buf, pairs.len(), "dicts")?;
            if pairs.is_empty() {
                return Ok(());
            }
            if depth >= MAX_DEPTH {
                return Err(Error::DepthLimit);
            }
            for (key, val) in pairs {
                encode_value(buf, key, depth + 1)?;
                encode_value(buf, val, depth + 1)?;
            }
            Ok(())
        }
        Value::Record(record) => encode_record(buf, record, depth),
        Value::Enum(member) => {
            if member.enum_type().is_int_based() {
                encode_i64(buf, member.value())
            } else {
                encode_str(buf, member.name())
            }
        }
    }
}

/// Emit the shortest integer token whose range contains `x`.
fn encode_i64(buf: &mut Buffer, x: i64) -> Result<(), Error> {
    if x < -(1 << 5) {
        if x < -(1 << 15) {
            if x < -(1i64 << 31) {
                let mut out = [0u8; 9];
                out[0] = Marker::Int64 as u8;
                out[1..].copy_from_slice(&x.to_be_bytes());
                buf.write(&out)?;
            } else {
                let mut out = [0u8; 5];
                out[0] = Marker::Int32 as u8;
                out[1..].copy_from_slice(&(x as i32).to_be_bytes());
                buf.write(&out)?;
            }
        } else if x < -(1 << 7) {
            let mut out = [0u8; 3];
            out[0] = Marker::Int16 as u8;
            out[1..].copy_from_slice(&(x as i16).to_be_bytes());
            buf.write(&out)?;
        } else {
            buf.write(&[Marker::Int8 as u8, x as u8])?;
        }
    } else if x < (1 << 7) {
        buf.write(&[x as u8])?;
    } else if x < (1 << 16) {
        if x < (1 << 8) {
            buf.write(&[Marker::Uint8 as u8, x as u8])?;
        } else {
            let mut out = [0u8; 3];
            out[0] = Marker::Uint16 as u8;
            out[1..].copy_from_slice(&(x as u16).to_be_bytes());
            buf.write(&out)?;
        }
    } else if x < (1i64 << 32) {
        let mut out = [0u8; 5];
        out[0] = Marker::Uint32 as u8;
        out[1..].copy_from_slice(&(x as u32).to_be_bytes());
        buf.write(&out)?;
    } else {
        let mut out = [0u8; 9];
        out[0] = Marker::Uint64 as u8;
        out[1..].copy_from_slice(&x.to_be_bytes());
        buf.write(&out)?;
    }
    Ok(())
}

fn encode_u64(buf: &mut Buffer, x: u64) -> Result<(), Error> {
    match i64::try_from(x) {
        Ok(v) => encode_i64(buf, v),
        Err(_) => {
            let mut out = [0u8; 9];
            out[0] = Marker::Uint64 as u8;
            out[1..].copy_from_slice(&x.to_be_bytes());
            Ok(buf.write(&out)?)
        }
    }
}

fn encode_str(buf: &mut Buffer, s: &str) -> Result<(), Error> {
    let len = s.len();
    if len < 32 {
        buf.write(&[FIXSTR | len as u8])?;
    } else if len < (1 << 8) {
        buf.write(&[Marker::Str8 as u8, len as u8])?;
    } else if len < (1 << 16) {
        let mut out = [0u8; 3];
        out[0] = Marker::Str16 as u8;
        out[1..].copy_from_slice(&(len as u16).to_be_bytes());
        buf.write(&out)?;
    } else if let Ok(len32) = u32::try_from(len) {
        let mut out = [0u8; 5];
        out[0] = Marker::Str32 as u8;
        out[1..].copy_from_slice(&len32.to_be_bytes());
        buf.write(&out)?;
    } else {
        return Err(Error::TooLong("strings"));
    }
    Ok(buf.write(s.as_bytes())?)
}

fn encode_bin(buf: &mut Buffer, b: &[u8]) -> Result<(), Error> {
    let len = b.len();
    if len < (1 << 8) {
        buf.write(&[Marker::Bin8 as u8, len as u8])?;
    } else if len < (1 << 16) {
        let mut out = [0u8; 3];
        out[0] = Marker::Bin16 as u8;
        out[1..].copy_from_slice(&(len as u16).to_be_bytes());
        buf.write(&out)?;
    } else if let Ok(len32) = u32::try_from(len) {
        let mut out = [0u8; 5];
        out[0] = Marker::Bin32 as u8;
        out[1..].copy_from_slice(&len32.to_be_bytes());
        buf.write(&out)?;
    } else {
        return Err(Error::TooLong("bytes"));
    }
    Ok(buf.write(b)?)
}

fn encode_array_header(buf: &mut Buffer, len: usize, kind: &'static str) -> Result<(), Error> {
    if len < 16 {
        buf.write(&[FIXARRAY | len as u8])?;
    } else if len < (1 << 16) {
        let mut out = [0u8; 3];
        out[0] = Marker::Array16 as u8;
        out[1..].copy_from_slice(&(len as u16).to_be_bytes());
        buf.write(&out)?;
    } else if let Ok(len32) = u32::try_from(len) {
        let mut out = [0u8; 5];
        out[0] = Marker::Array32 as u8;
        out[1..].copy_from_slice(&len32.to_be_bytes());
        buf.write(&out)?;
    } else {
        return Err(Error::TooLong(kind));
    }
    Ok(())
}

fn encode_map_header(buf: &mut Buffer, len: usize, kind: &'static str) -> Result<(), Error> {
    if len < 16 {
        buf.write(&[FIXMAP | len as u8])?;
    } else if len < (1 << 16) {
        let mut out = [0u8; 3];
        out[0] = Marker::Map16 as u8;
        out[1..].copy_from_slice(&(len as u16).to_be_bytes());
        buf.write(&out)?;
    } else if let Ok(len32) = u32::try_from(len) {
        let mut out = [0u8; 5];
        out[0] = Marker::Map32 as u8;
        out[1..].copy_from_slice(&len32.to_be_bytes());
        buf.write(&out)?;
    } else {
        return Err(Error::TooLong(kind));
    }
    Ok(())
}

fn encode_array(
    buf: &mut Buffer,
    items: &[Value],
    kind: &'static str,
    depth: usize,
) -> Result<(), Error> {
    encode_array_header(buf, items.len(), kind)?;
    if items.is_empty() {
        return Ok(());
    }
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimit);
    }
    for item in items {
        encode_value(buf, item, depth + 1)?;
    }
    Ok(())
}

/// A record encodes as a map of its field names to field values, in
/// declaration order.
fn encode_record(buf: &mut Buffer, record: &Record, depth: usize) -> Result<(), Error> {
    let ty = record.record_type();
    encode_map_header(buf, ty.num_fields(), "records")?;
    if ty.num_fields() == 0 {
        return Ok(());
    }
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimit);
    }
    for (field, value) in record.fields() {
        encode_str(buf, field)?;
        encode_value(buf, value, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(vec![0xc0], encode(&Value::Null).unwrap());
        assert_eq!(vec![0xc2], encode(&Value::Bool(false)).unwrap());
        assert_eq!(vec![0xc3], encode(&Value::Bool(true)).unwrap());
        assert_eq!(vec![0x7f], encode(&Value::Int(127)).unwrap());
        assert_eq!(vec![0xcc, 0x80], encode(&Value::Int(128)).unwrap());
        assert_eq!(vec![0xe0], encode(&Value::Int(-32)).unwrap());
        assert_eq!(vec![0xd0, 0xdf], encode(&Value::Int(-33)).unwrap());
    }

    #[test]
    fn test_float_is_always_f64() {
        assert_eq!(
            vec![0xcb, 0x3f, 0xf8, 0, 0, 0, 0, 0, 0],
            encode(&Value::Float(1.5)).unwrap()
        );
    }

    #[test]
    fn test_short_containers() {
        assert_eq!(
            vec![0x93, 0x01, 0x02, 0x03],
            encode(&Value::List(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3)
            ]))
            .unwrap()
        );
        assert_eq!(
            vec![0xa2, 0x68, 0x69],
            encode(&Value::Str("hi".into())).unwrap()
        );
        assert_eq!(
            vec![0x81, 0xa1, 0x61, 0x01],
            encode(&Value::Map(vec![(Value::from("a"), Value::Int(1))])).unwrap()
        );
        assert_eq!(
            vec![0xc4, 0x02, 0xab, 0xcd],
            encode(&Value::Bytes(vec![0xab, 0xcd])).unwrap()
        );
    }

    #[test]
    fn test_depth_limit() {
        let mut v = Value::List(vec![]);
        for _ in 0..=MAX_DEPTH {
            v = Value::List(vec![v]);
        }
        assert_eq!(Err(Error::DepthLimit), encode(&v));
    }

    #[test]
    fn test_encoder_buffer_reuse() {
        let mut enc = Encoder::with_buffer_size(32);
        let small = enc.encode(&Value::Int(1)).unwrap();
        assert_eq!(vec![0x01], small);
        // outgrow the steady-state buffer
        let big = enc.encode(&Value::Str("x".repeat(100))).unwrap();
        assert_eq!(102, big.len());
        assert_eq!(0xd9, big[0]);
        // next call allocates a fresh steady-state buffer and still works
        assert_eq!(vec![0x2a], enc.encode(&Value::Int(42)).unwrap());
    }
}
