use std::{error, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Truncated,
    Overflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Truncated => "input data was truncated",
            Self::Overflow => "output buffer size overflow",
        })
    }
}

impl error::Error for Error {}

/// Read-only cursor over an input span. All multi-byte reads are big-endian,
/// per the wire format.
#[derive(Debug, Clone)]
pub struct Cursor<'input> {
    buffer: &'input [u8],
    offset: usize,
}

impl<'input> Cursor<'input> {
    #[must_use]
    pub fn new(buffer: &'input [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.offset
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let byte = *self.buffer.get(self.offset).ok_or(Error::Truncated)?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'input [u8], Error> {
        let end = self.offset.checked_add(n).ok_or(Error::Truncated)?;
        let bytes = self.buffer.get(self.offset..end).ok_or(Error::Truncated)?;
        self.offset = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let (chunk, _) = self.buffer[self.offset..]
            .split_first_chunk::<N>()
            .ok_or(Error::Truncated)?;
        self.offset += N;
        Ok(*chunk)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(u16::from_be_bytes(self.read_array::<2>()?))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(u32::from_be_bytes(self.read_array::<4>()?))
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(u64::from_be_bytes(self.read_array::<8>()?))
    }
}

/// Growable output buffer.
///
/// Capacity starts at a configured size and grows geometrically: when a write
/// does not fit, the logical capacity becomes `(used + need) * 3 / 2`.
/// Overflow of that computation is reported as [`Error::Overflow`].
#[derive(Debug)]
pub struct Buffer {
    bytes: Vec<u8>,
    cap: usize,
}

impl Buffer {
    #[must_use]
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(cap),
            cap,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Logical capacity; tracks the growth policy rather than the allocator.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn write(&mut self, s: &[u8]) -> Result<(), Error> {
        let required = self.bytes.len().checked_add(s.len()).ok_or(Error::Overflow)?;
        if required > self.cap {
            self.cap = required.checked_mul(3).ok_or(Error::Overflow)? / 2;
            self.bytes.reserve_exact(self.cap - self.bytes.len());
        }
        self.bytes.extend_from_slice(s);
        Ok(())
    }

    /// Consume the buffer, returning the written prefix trimmed to length.
    #[must_use]
    pub fn into_trimmed_vec(self) -> Vec<u8> {
        let mut bytes = self.bytes;
        bytes.shrink_to_fit();
        bytes
    }
}

#[test]
fn test_cursor_reads() {
    let mut c = Cursor::new(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
    assert_eq!(0x01, c.read_u8().unwrap());
    assert_eq!(0x0203, c.read_u16().unwrap());
    assert_eq!(0x0405_0607, c.read_u32().unwrap());
    assert_eq!(2, c.remaining());
    assert!(c.read_u32().is_err());
    assert_eq!(&[0x08, 0x09], c.read_bytes(2).unwrap());
    assert!(c.read_u8().is_err());
    assert_eq!(Err(Error::Truncated), c.read_bytes(1));

    let mut c = Cursor::new(&[0, 0, 0, 0, 0, 0, 0, 0x2a]);
    assert_eq!(42, c.read_u64().unwrap());
    assert_eq!(8, c.position());
}

#[test]
fn test_buffer_growth() {
    let mut b = Buffer::with_capacity(4);
    b.write(&[1, 2, 3]).unwrap();
    assert_eq!(4, b.capacity());
    b.write(&[4, 5]).unwrap();
    // grew to (3 + 2) * 3 / 2
    assert_eq!(7, b.capacity());
    assert_eq!(&[1, 2, 3, 4, 5], b.as_slice());
    b.clear();
    assert_eq!(0, b.len());
    assert_eq!(7, b.capacity());
}
