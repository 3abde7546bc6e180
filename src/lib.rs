//! Schema-driven MessagePack encoder and decoder

use std::{error, fmt};

mod bytes;
/// MessagePack decoding, untyped and type-directed
pub mod decode;
/// MessagePack encoding
pub mod encode;
/// Enumeration descriptors
pub mod enums;
/// Wire format prefix codes
pub mod marker;
/// Record type descriptors and instances
pub mod record;
/// Schema model: type declarations and schema nodes
pub mod schema;
/// Dynamic value representation
pub mod value;

/// Numeric scalar conversion routines
pub mod num {
    /// Decimal text to IEEE-754 double
    pub mod atof;
    mod consts;
    /// Unsigned integer to decimal text
    pub mod itoa;
}

pub use self::decode::{Decoder, decode, decode_as};
pub use self::encode::{Encoder, encode};
pub use self::enums::{EnumMember, EnumType};
pub use self::record::{Record, RecordType};
pub use self::schema::{SchemaNode, TypeExpr};
pub use self::value::Value;

/// Either side of the codec failing.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Encode(encode::Error),
    Decode(decode::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(err) => err.fmt(f),
            Self::Decode(err) => err.fmt(f),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Decode(err) => Some(err),
        }
    }
}

impl From<encode::Error> for Error {
    fn from(err: encode::Error) -> Self {
        Self::Encode(err)
    }
}

impl From<decode::Error> for Error {
    fn from(err: decode::Error) -> Self {
        Self::Decode(err)
    }
}
