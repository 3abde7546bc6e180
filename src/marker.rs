use num_enum::TryFromPrimitive;

/// Fixed prefix codes of the MessagePack wire grammar.
///
/// The short-form tokens (positive/negative fixint, fixstr, fixarray, fixmap)
/// occupy byte ranges rather than single values and are classified by the
/// helpers below. Extension codes (`0xc7..=0xc9`, `0xd4..=0xd8`) and the
/// reserved byte `0xc1` are not part of this codec and fail conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Marker {
    Nil = 0xc0,
    False = 0xc2,
    True = 0xc3,
    Bin8 = 0xc4,
    Bin16 = 0xc5,
    Bin32 = 0xc6,
    Float32 = 0xca,
    Float64 = 0xcb,
    Uint8 = 0xcc,
    Uint16 = 0xcd,
    Uint32 = 0xce,
    Uint64 = 0xcf,
    Int8 = 0xd0,
    Int16 = 0xd1,
    Int32 = 0xd2,
    Int64 = 0xd3,
    Str8 = 0xd9,
    Str16 = 0xda,
    Str32 = 0xdb,
    Array16 = 0xdc,
    Array32 = 0xdd,
    Map16 = 0xde,
    Map32 = 0xdf,
}

pub const FIXMAP: u8 = 0x80;
pub const FIXARRAY: u8 = 0x90;
pub const FIXSTR: u8 = 0xa0;

/// Positive fixint `0x00..=0x7f` or negative fixint `0xe0..=0xff`.
#[must_use]
#[inline]
pub fn is_fixint(op: u8) -> bool {
    op < 0x80 || op >= 0xe0
}

/// Value of a fixint prefix; negative fixints are the int8 value of the byte.
#[must_use]
#[inline]
pub fn fixint_value(op: u8) -> i64 {
    i64::from(op as i8)
}

#[must_use]
#[inline]
pub fn is_fixstr(op: u8) -> bool {
    (FIXSTR..0xc0).contains(&op)
}

#[must_use]
#[inline]
pub fn is_fixarray(op: u8) -> bool {
    (FIXARRAY..FIXSTR).contains(&op)
}

#[must_use]
#[inline]
pub fn is_fixmap(op: u8) -> bool {
    (FIXMAP..FIXARRAY).contains(&op)
}

/// The human word for whatever a prefix byte carries, used in decoding
/// error messages.
#[must_use]
pub fn kind_name(op: u8) -> &'static str {
    if is_fixint(op) {
        return "int";
    }
    if is_fixstr(op) {
        return "str";
    }
    if is_fixarray(op) {
        return "list";
    }
    if is_fixmap(op) {
        return "dict";
    }
    match Marker::try_from(op) {
        Ok(Marker::Nil) => "None",
        Ok(Marker::False | Marker::True) => "bool",
        Ok(
            Marker::Uint8
            | Marker::Uint16
            | Marker::Uint32
            | Marker::Uint64
            | Marker::Int8
            | Marker::Int16
            | Marker::Int32
            | Marker::Int64,
        ) => "int",
        Ok(Marker::Float32 | Marker::Float64) => "float",
        Ok(Marker::Str8 | Marker::Str16 | Marker::Str32) => "str",
        Ok(Marker::Bin8 | Marker::Bin16 | Marker::Bin32) => "bytes",
        Ok(Marker::Array16 | Marker::Array32) => "list",
        Ok(Marker::Map16 | Marker::Map32) => "dict",
        Err(_) => "unknown",
    }
}

#[test]
fn test_fix_ranges() {
    assert!(is_fixint(0x00));
    assert!(is_fixint(0x7f));
    assert!(is_fixint(0xe0));
    assert!(is_fixint(0xff));
    assert!(!is_fixint(0x80));
    assert!(!is_fixint(0xdf));
    assert_eq!(127, fixint_value(0x7f));
    assert_eq!(-32, fixint_value(0xe0));
    assert_eq!(-1, fixint_value(0xff));
    assert!(is_fixmap(0x80) && is_fixmap(0x8f) && !is_fixmap(0x90));
    assert!(is_fixarray(0x90) && is_fixarray(0x9f) && !is_fixarray(0xa0));
    assert!(is_fixstr(0xa0) && is_fixstr(0xbf) && !is_fixstr(0xc0));
}

#[test]
fn test_marker_conversion() {
    assert_eq!(Ok(Marker::Nil), Marker::try_from(0xc0));
    assert_eq!(Ok(Marker::Map32), Marker::try_from(0xdf));
    assert!(Marker::try_from(0xc1).is_err());
    assert!(Marker::try_from(0xc7).is_err());
    assert!(Marker::try_from(0xd4).is_err());
}

#[test]
fn test_kind_names() {
    assert_eq!("int", kind_name(0x00));
    assert_eq!("int", kind_name(0xff));
    assert_eq!("str", kind_name(0xa5));
    assert_eq!("None", kind_name(0xc0));
    assert_eq!("bool", kind_name(0xc2));
    assert_eq!("float", kind_name(0xcb));
    assert_eq!("bytes", kind_name(0xc4));
    assert_eq!("list", kind_name(0xdc));
    assert_eq!("dict", kind_name(0x8f));
    assert_eq!("unknown", kind_name(0xc1));
}
