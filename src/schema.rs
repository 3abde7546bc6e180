//! Schema model: declared types and the node tree the decoder walks.

use std::{error, fmt};

use crate::enums::EnumType;
use crate::record::RecordType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The declared type has no schema representation.
    Unsupported(String),
    /// A record declared a different number of field types than fields.
    FieldCount {
        record: String,
        fields: usize,
        types: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(ty) => write!(f, "Type `{ty}` is not supported"),
            Self::FieldCount {
                record,
                fields,
                types,
            } => write!(
                f,
                "record `{record}` declares {fields} fields but {types} field types"
            ),
        }
    }
}

impl error::Error for Error {}

/// A user type declaration, the input to schema construction.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Any,
    /// The null type: only the nil token decodes into it.
    Null,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    ByteArray,
    List(Box<TypeExpr>),
    Set(Box<TypeExpr>),
    /// `Tuple[T, ...]`: any arity, one element type.
    VarTuple(Box<TypeExpr>),
    /// `Tuple[T1, ..., Tn]`: fixed arity.
    Tuple(Vec<TypeExpr>),
    Dict(Box<TypeExpr>, Box<TypeExpr>),
    Optional(Box<TypeExpr>),
    /// Only the two-armed form with a [`TypeExpr::Null`] arm is supported;
    /// it collapses into the other arm marked optional.
    Union(Vec<TypeExpr>),
    Record(RecordType),
    Enum(EnumType),
}

impl TypeExpr {
    #[must_use]
    pub fn list(element: TypeExpr) -> Self {
        TypeExpr::List(Box::new(element))
    }

    #[must_use]
    pub fn set(element: TypeExpr) -> Self {
        TypeExpr::Set(Box::new(element))
    }

    #[must_use]
    pub fn var_tuple(element: TypeExpr) -> Self {
        TypeExpr::VarTuple(Box::new(element))
    }

    #[must_use]
    pub fn dict(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Dict(Box::new(key), Box::new(value))
    }

    #[must_use]
    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Optional(Box::new(inner))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Any => f.write_str("Any"),
            TypeExpr::Null => f.write_str("None"),
            TypeExpr::Bool => f.write_str("bool"),
            TypeExpr::Int => f.write_str("int"),
            TypeExpr::Float => f.write_str("float"),
            TypeExpr::Str => f.write_str("str"),
            TypeExpr::Bytes => f.write_str("bytes"),
            TypeExpr::ByteArray => f.write_str("bytearray"),
            TypeExpr::List(el) => write!(f, "List[{el}]"),
            TypeExpr::Set(el) => write!(f, "Set[{el}]"),
            TypeExpr::VarTuple(el) => write!(f, "Tuple[{el}, ...]"),
            TypeExpr::Tuple(els) => {
                f.write_str("Tuple[")?;
                for (i, el) in els.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{el}")?;
                }
                f.write_str("]")
            }
            TypeExpr::Dict(k, v) => write!(f, "Dict[{k}, {v}]"),
            TypeExpr::Optional(t) => write!(f, "Optional[{t}]"),
            TypeExpr::Union(arms) => {
                f.write_str("Union[")?;
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arm}")?;
                }
                f.write_str("]")
            }
            TypeExpr::Record(rt) => f.write_str(rt.name()),
            TypeExpr::Enum(et) => f.write_str(et.name()),
        }
    }
}

/// One node of a built schema: a kind plus whether the nil token is also
/// accepted.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub(crate) kind: SchemaKind,
    pub(crate) optional: bool,
}

#[derive(Debug, Clone)]
pub enum SchemaKind {
    Any,
    Null,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    ByteArray,
    Enum(EnumType),
    IntEnum(EnumType),
    Record(RecordType),
    List(Box<SchemaNode>),
    Set(Box<SchemaNode>),
    VarTuple(Box<SchemaNode>),
    FixTuple(Box<[SchemaNode]>),
    Dict(Box<SchemaNode>, Box<SchemaNode>),
}

impl SchemaNode {
    /// Build a schema from a type declaration.
    pub fn convert(ty: &TypeExpr) -> Result<SchemaNode, Error> {
        Self::to_node(ty, false)
    }

    fn to_node(ty: &TypeExpr, optional: bool) -> Result<SchemaNode, Error> {
        let kind = match ty {
            // `Any` and the null type always admit nil.
            TypeExpr::Any => {
                return Ok(SchemaNode {
                    kind: SchemaKind::Any,
                    optional: true,
                });
            }
            TypeExpr::Null => {
                return Ok(SchemaNode {
                    kind: SchemaKind::Null,
                    optional: true,
                });
            }
            TypeExpr::Bool => SchemaKind::Bool,
            TypeExpr::Int => SchemaKind::Int,
            TypeExpr::Float => SchemaKind::Float,
            TypeExpr::Str => SchemaKind::Str,
            TypeExpr::Bytes => SchemaKind::Bytes,
            TypeExpr::ByteArray => SchemaKind::ByteArray,
            TypeExpr::List(el) => SchemaKind::List(Box::new(Self::to_node(el, false)?)),
            TypeExpr::Set(el) => SchemaKind::Set(Box::new(Self::to_node(el, false)?)),
            TypeExpr::VarTuple(el) => SchemaKind::VarTuple(Box::new(Self::to_node(el, false)?)),
            TypeExpr::Tuple(els) => SchemaKind::FixTuple(
                els.iter()
                    .map(|el| Self::to_node(el, false))
                    .collect::<Result<_, _>>()?,
            ),
            TypeExpr::Dict(k, v) => SchemaKind::Dict(
                Box::new(Self::to_node(k, false)?),
                Box::new(Self::to_node(v, false)?),
            ),
            TypeExpr::Optional(inner) => return Self::to_node(inner, true),
            TypeExpr::Union(arms) => {
                return match arms.as_slice() {
                    [TypeExpr::Null, other] | [other, TypeExpr::Null] => Self::to_node(other, true),
                    _ => Err(Error::Unsupported(ty.to_string())),
                };
            }
            TypeExpr::Record(rt) => SchemaKind::Record(rt.clone()),
            TypeExpr::Enum(et) => {
                if et.is_int_based() {
                    SchemaKind::IntEnum(et.clone())
                } else {
                    SchemaKind::Enum(et.clone())
                }
            }
        };
        Ok(SchemaNode { kind, optional })
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl fmt::Display for SchemaNode {
    /// Renders the declared type, for error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wrap = self.optional && !matches!(self.kind, SchemaKind::Any | SchemaKind::Null);
        if wrap {
            f.write_str("Optional[")?;
        }
        match &self.kind {
            SchemaKind::Any => f.write_str("Any")?,
            SchemaKind::Null => f.write_str("None")?,
            SchemaKind::Bool => f.write_str("bool")?,
            SchemaKind::Int => f.write_str("int")?,
            SchemaKind::Float => f.write_str("float")?,
            SchemaKind::Str => f.write_str("str")?,
            SchemaKind::Bytes => f.write_str("bytes")?,
            SchemaKind::ByteArray => f.write_str("bytearray")?,
            SchemaKind::Enum(et) | SchemaKind::IntEnum(et) => f.write_str(et.name())?,
            SchemaKind::Record(rt) => f.write_str(rt.name())?,
            SchemaKind::List(el) => write!(f, "List[{el}]")?,
            SchemaKind::Set(el) => write!(f, "Set[{el}]")?,
            SchemaKind::VarTuple(el) => write!(f, "Tuple[{el}, ...]")?,
            SchemaKind::FixTuple(els) => {
                f.write_str("Tuple[")?;
                for (i, el) in els.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{el}")?;
                }
                f.write_str("]")?;
            }
            SchemaKind::Dict(k, v) => write!(f, "Dict[{k}, {v}]")?,
        }
        if wrap {
            f.write_str("]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering() {
        let node = SchemaNode::convert(&TypeExpr::list(TypeExpr::Int)).unwrap();
        assert_eq!("List[int]", node.to_string());

        let node = SchemaNode::convert(&TypeExpr::optional(TypeExpr::dict(
            TypeExpr::Str,
            TypeExpr::var_tuple(TypeExpr::Float),
        )))
        .unwrap();
        assert_eq!("Optional[Dict[str, Tuple[float, ...]]]", node.to_string());

        let node =
            SchemaNode::convert(&TypeExpr::Tuple(vec![TypeExpr::Int, TypeExpr::Str])).unwrap();
        assert_eq!("Tuple[int, str]", node.to_string());

        let node = SchemaNode::convert(&TypeExpr::Any).unwrap();
        assert_eq!("Any", node.to_string());
        assert!(node.is_optional());
    }

    #[test]
    fn test_union_with_null_arm() {
        let node =
            SchemaNode::convert(&TypeExpr::Union(vec![TypeExpr::Null, TypeExpr::Int])).unwrap();
        assert!(node.is_optional());
        assert_eq!("Optional[int]", node.to_string());

        let node =
            SchemaNode::convert(&TypeExpr::Union(vec![TypeExpr::Str, TypeExpr::Null])).unwrap();
        assert_eq!("Optional[str]", node.to_string());
    }

    #[test]
    fn test_unsupported_unions() {
        let err = SchemaNode::convert(&TypeExpr::Union(vec![TypeExpr::Int, TypeExpr::Str]))
            .unwrap_err();
        assert_eq!("Type `Union[int, str]` is not supported", err.to_string());

        let err = SchemaNode::convert(&TypeExpr::Union(vec![
            TypeExpr::Null,
            TypeExpr::Int,
            TypeExpr::Str,
        ]))
        .unwrap_err();
        assert_eq!(
            "Type `Union[None, int, str]` is not supported",
            err.to_string()
        );
    }

    #[test]
    fn test_null_always_optional() {
        let node = SchemaNode::convert(&TypeExpr::Null).unwrap();
        assert!(node.is_optional());
        assert_eq!("None", node.to_string());
    }
}
