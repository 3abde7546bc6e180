use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::{error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    DuplicateMember(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateMember(name) => write!(f, "duplicate enum member `{name}`"),
        }
    }
}

impl error::Error for Error {}

struct Inner {
    name: Box<str>,
    members: Box<[(Box<str>, i64)]>,
    int_based: bool,
    /// Value-to-member index, built on first integer lookup.
    by_value: OnceLock<HashMap<i64, u32>>,
}

/// An enumeration descriptor: a named, ordered set of members.
///
/// The descriptor is a cheap handle around shared state; clones refer to the
/// same enumeration, and member identity is tied to the descriptor, not its
/// shape. A plain enumeration travels on the wire as the member *name* (a
/// string); an integer-based enumeration travels as the member *value*.
#[derive(Clone)]
pub struct EnumType {
    inner: Arc<Inner>,
}

impl EnumType {
    /// A plain enumeration; member values are their declaration ordinals.
    pub fn new<I, S>(name: &str, members: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(
            name,
            members
                .into_iter()
                .enumerate()
                .map(|(i, m)| (m.as_ref().into(), i as i64))
                .collect(),
            false,
        )
    }

    /// An integer-based enumeration; members encode as their values.
    pub fn int_based<I, S>(name: &str, members: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        Self::build(
            name,
            members
                .into_iter()
                .map(|(m, v)| (m.as_ref().into(), v))
                .collect(),
            true,
        )
    }

    fn build(name: &str, members: Vec<(Box<str>, i64)>, int_based: bool) -> Result<Self, Error> {
        for (i, (member, _)) in members.iter().enumerate() {
            if members[..i].iter().any(|(seen, _)| seen == member) {
                return Err(Error::DuplicateMember(member.to_string()));
            }
        }
        Ok(Self {
            inner: Arc::new(Inner {
                name: name.into(),
                members: members.into_boxed_slice(),
                int_based,
                by_value: OnceLock::new(),
            }),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn is_int_based(&self) -> bool {
        self.inner.int_based
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, i64)> {
        self.inner.members.iter().map(|(m, v)| (&**m, *v))
    }

    pub(crate) fn same_type(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[must_use]
    pub fn member(&self, name: &str) -> Option<EnumMember> {
        let index = self.inner.members.iter().position(|(m, _)| &**m == name)?;
        Some(EnumMember {
            ty: self.clone(),
            index: index as u32,
        })
    }

    #[must_use]
    pub fn member_by_value(&self, value: i64) -> Option<EnumMember> {
        let table = self.inner.by_value.get_or_init(|| {
            self.inner
                .members
                .iter()
                .enumerate()
                .map(|(i, (_, v))| (*v, i as u32))
                .collect()
        });
        let index = *table.get(&value)?;
        Some(EnumMember {
            ty: self.clone(),
            index,
        })
    }
}

impl fmt::Debug for EnumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumType")
            .field("name", &self.inner.name)
            .field("members", &self.inner.members)
            .field("int_based", &self.inner.int_based)
            .finish()
    }
}

/// One member of an [`EnumType`].
#[derive(Clone)]
pub struct EnumMember {
    ty: EnumType,
    index: u32,
}

impl EnumMember {
    #[must_use]
    pub fn enum_type(&self) -> &EnumType {
        &self.ty
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.ty.inner.members[self.index as usize].0
    }

    #[must_use]
    pub fn value(&self) -> i64 {
        self.ty.inner.members[self.index as usize].1
    }
}

impl PartialEq for EnumMember {
    /// Members are equal only within the exact same enumeration object.
    fn eq(&self, other: &Self) -> bool {
        self.ty.same_type(&other.ty) && self.index == other.index
    }
}

impl fmt::Debug for EnumMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.ty.name(), self.name())
    }
}

#[test]
fn test_member_lookup() {
    let fruit = EnumType::new("Fruit", ["apple", "banana"]).unwrap();
    let apple = fruit.member("apple").unwrap();
    assert_eq!("apple", apple.name());
    assert_eq!(0, apple.value());
    assert!(fruit.member("grape").is_none());
    assert_eq!(apple, fruit.member("apple").unwrap());
    assert_ne!(apple, fruit.member("banana").unwrap());
    // clones are the same enumeration
    assert_eq!(apple, fruit.clone().member("apple").unwrap());

    let other = EnumType::new("Fruit", ["apple", "banana"]).unwrap();
    // same shape, different type object
    assert_ne!(apple, other.member("apple").unwrap());
}

#[test]
fn test_int_based_lookup() {
    let level = EnumType::int_based("Level", [("LOW", 1), ("HIGH", 10)]).unwrap();
    assert!(level.is_int_based());
    let high = level.member_by_value(10).unwrap();
    assert_eq!("HIGH", high.name());
    assert_eq!(10, high.value());
    assert!(level.member_by_value(5).is_none());
}

#[test]
fn test_duplicate_member() {
    assert_eq!(
        Err(Error::DuplicateMember("a".into())),
        EnumType::new("E", ["a", "b", "a"]).map(|_| ())
    );
}
