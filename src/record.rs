//! Record type descriptors and record instances.
//!
//! A [`RecordType`] plays the role a class plays in a dynamic language: it
//! owns the ordered field list (required fields first, defaulted fields in
//! the tail), the default values, and a per-field schema array. The schema
//! array is built lazily on first use from a stored declaration closure, so
//! a field type may reference record types that are only wired up after the
//! descriptor itself exists, including the descriptor's own.

use std::sync::{Arc, OnceLock};
use std::{error, fmt};

use crate::schema::{self, SchemaNode, TypeExpr};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    ExtraPositional,
    MissingArgument(String),
    UnknownArgument(String),
    DuplicateArgument(String),
    DuplicateField(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtraPositional => f.write_str("extra positional arguments provided"),
            Self::MissingArgument(name) => write!(f, "missing required argument `{name}`"),
            Self::UnknownArgument(name) => write!(f, "unexpected keyword argument `{name}`"),
            Self::DuplicateArgument(name) => {
                write!(f, "argument `{name}` given by name and position")
            }
            Self::DuplicateField(name) => write!(f, "duplicate field `{name}`"),
        }
    }
}

impl error::Error for Error {}

/// Where a merged field's type declaration comes from.
enum Source {
    /// Index into the output of this record's own declaration closure.
    Declared(usize),
    /// Field inherited from a base descriptor, by its index there.
    Inherited { base: RecordType, index: usize },
}

type TypesFn = Box<dyn Fn() -> Vec<TypeExpr> + Send + Sync>;

struct Inner {
    name: Box<str>,
    /// Required fields first, defaulted fields in the tail.
    fields: Box<[Box<str>]>,
    /// Parallel to the defaulted tail of `fields`.
    defaults: Box<[Value]>,
    sources: Box<[Source]>,
    /// Number of fields declared directly on this record; the declaration
    /// closure must yield exactly this many type expressions.
    declared: usize,
    types_fn: TypesFn,
    types: OnceLock<Box<[SchemaNode]>>,
}

/// A record type descriptor.
///
/// The descriptor is a cheap handle around shared state; clones refer to the
/// same record type, and instance equality requires the exact same
/// descriptor, not merely an identical shape.
#[derive(Clone)]
pub struct RecordType {
    inner: Arc<Inner>,
}

impl RecordType {
    /// Declare a record type.
    ///
    /// `fields` pairs each field name with an optional default value; the
    /// final order partitions required fields before defaulted ones, keeping
    /// declaration order within each group. `types` yields one [`TypeExpr`]
    /// per declared field, in declaration order; it runs on first use rather
    /// than here, so it may capture record handles that are only filled in
    /// afterwards:
    ///
    /// ```
    /// use std::sync::{Arc, OnceLock};
    /// use msgpack_typed::{RecordType, TypeExpr, Value};
    ///
    /// let slot: Arc<OnceLock<RecordType>> = Arc::new(OnceLock::new());
    /// let captured = slot.clone();
    /// let tree = RecordType::new(
    ///     "Tree",
    ///     vec![
    ///         ("value".into(), None),
    ///         ("children".into(), Some(Value::List(vec![]))),
    ///     ],
    ///     move || {
    ///         let this = captured.get().expect("declared").clone();
    ///         vec![TypeExpr::Int, TypeExpr::list(TypeExpr::Record(this))]
    ///     },
    /// )
    /// .unwrap();
    /// slot.set(tree).ok().unwrap();
    /// ```
    pub fn new<F>(
        name: &str,
        fields: Vec<(String, Option<Value>)>,
        types: F,
    ) -> Result<Self, Error>
    where
        F: Fn() -> Vec<TypeExpr> + Send + Sync + 'static,
    {
        Self::with_bases(name, &[], fields, types)
    }

    /// Declare a record type that inherits the fields of `bases`.
    ///
    /// Bases are merged in reverse order, so an earlier base wins over a
    /// later one, and the record's own declarations win over every base. A
    /// redeclared field keeps its merged position; gaining or losing a
    /// default moves it between the required and defaulted groups.
    pub fn with_bases<F>(
        name: &str,
        bases: &[RecordType],
        fields: Vec<(String, Option<Value>)>,
        types: F,
    ) -> Result<Self, Error>
    where
        F: Fn() -> Vec<TypeExpr> + Send + Sync + 'static,
    {
        let mut required: Vec<(String, Source)> = Vec::new();
        let mut defaulted: Vec<(String, Value, Source)> = Vec::new();

        for base in bases.iter().rev() {
            let npos = base.num_required();
            for (j, field) in base.inner.fields.iter().enumerate() {
                let source = Source::Inherited {
                    base: base.clone(),
                    index: j,
                };
                if j < npos {
                    upsert_required(&mut required, field.to_string(), source);
                    defaulted.retain(|(name, _, _)| name != &**field);
                } else {
                    let default = base.inner.defaults[j - npos].clone();
                    upsert_defaulted(&mut defaulted, field.to_string(), default, source);
                    required.retain(|(name, _)| name != &**field);
                }
            }
        }

        for (i, (field, default)) in fields.iter().enumerate() {
            if fields[..i].iter().any(|(seen, _)| seen == field) {
                return Err(Error::DuplicateField(field.clone()));
            }
            let source = Source::Declared(i);
            match default {
                Some(value) => {
                    upsert_defaulted(&mut defaulted, field.clone(), value.clone(), source);
                    required.retain(|(name, _)| name != field);
                }
                None => {
                    upsert_required(&mut required, field.clone(), source);
                    defaulted.retain(|(name, _, _)| name != field);
                }
            }
        }

        let declared = fields.len();
        let mut merged_fields = Vec::with_capacity(required.len() + defaulted.len());
        let mut sources = Vec::with_capacity(required.len() + defaulted.len());
        let mut defaults = Vec::with_capacity(defaulted.len());
        for (field, source) in required {
            merged_fields.push(field.into_boxed_str());
            sources.push(source);
        }
        for (field, default, source) in defaulted {
            merged_fields.push(field.into_boxed_str());
            defaults.push(default);
            sources.push(source);
        }

        Ok(Self {
            inner: Arc::new(Inner {
                name: name.into(),
                fields: merged_fields.into_boxed_slice(),
                defaults: defaults.into_boxed_slice(),
                sources: sources.into_boxed_slice(),
                declared,
                types_fn: Box::new(types),
                types: OnceLock::new(),
            }),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn num_fields(&self) -> usize {
        self.inner.fields.len()
    }

    #[must_use]
    pub fn num_required(&self) -> usize {
        self.inner.fields.len() - self.inner.defaults.len()
    }

    #[must_use]
    pub fn field_name(&self, index: usize) -> &str {
        &self.inner.fields[index]
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.inner.fields.iter().map(|f| &**f)
    }

    pub(crate) fn same_type(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn default(&self, index: usize) -> &Value {
        &self.inner.defaults[index]
    }

    /// The per-field schema array, built on first use.
    ///
    /// Concurrent first calls may build duplicate arrays; the first writer
    /// wins and the losers drop their own work.
    pub(crate) fn field_schemas(&self) -> Result<&[SchemaNode], schema::Error> {
        if let Some(types) = self.inner.types.get() {
            return Ok(types);
        }
        let exprs = (self.inner.types_fn)();
        if exprs.len() != self.inner.declared {
            return Err(schema::Error::FieldCount {
                record: self.inner.name.to_string(),
                fields: self.inner.declared,
                types: exprs.len(),
            });
        }
        let mut nodes = Vec::with_capacity(self.inner.fields.len());
        for source in &self.inner.sources {
            nodes.push(match source {
                Source::Declared(i) => SchemaNode::convert(&exprs[*i])?,
                Source::Inherited { base, index } => base.field_schemas()?[*index].clone(),
            });
        }
        Ok(self.inner.types.get_or_init(|| nodes.into_boxed_slice()))
    }

    /// Schema of field `index`, if the lazy array has been built.
    pub(crate) fn built_field_schema(&self, index: usize) -> Option<&SchemaNode> {
        self.inner.types.get()?.get(index)
    }

    /// Resolve a field name, starting the linear search at the slot after
    /// the previous match so keys arriving in declaration order resolve in
    /// amortized constant time.
    pub(crate) fn field_index(&self, key: &str, pos: &mut usize) -> Option<usize> {
        let nfields = self.inner.fields.len();
        if nfields == 0 {
            return None;
        }
        for i in 0..nfields {
            let ind = (i + *pos) % nfields;
            if &*self.inner.fields[ind] == key {
                *pos = (ind + 1) % nfields;
                return Some(ind);
            }
        }
        None
    }

    /// Construct an instance, binding positional arguments in field order
    /// and the rest by name; unfilled defaulted fields receive a copy of
    /// their default.
    pub fn instance(
        &self,
        args: Vec<Value>,
        kwargs: Vec<(&str, Value)>,
    ) -> Result<Record, Error> {
        let nfields = self.inner.fields.len();
        let npos = nfields - self.inner.defaults.len();
        if args.len() > nfields {
            return Err(Error::ExtraPositional);
        }
        let nargs = args.len();
        let mut slots: Vec<Option<Value>> = self.inner.fields.iter().map(|_| None).collect();
        for (i, value) in args.into_iter().enumerate() {
            slots[i] = Some(value);
        }
        for (key, value) in kwargs {
            let Some(i) = self.inner.fields.iter().position(|f| &**f == key) else {
                return Err(Error::UnknownArgument(key.to_string()));
            };
            if i < nargs || slots[i].is_some() {
                return Err(Error::DuplicateArgument(key.to_string()));
            }
            slots[i] = Some(value);
        }
        let slots = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| match slot {
                Some(value) => Ok(value),
                None if i < npos => Err(Error::MissingArgument(self.inner.fields[i].to_string())),
                None => Ok(self.inner.defaults[i - npos].clone()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Record {
            ty: self.clone(),
            slots: slots.into_boxed_slice(),
        })
    }
}

fn upsert_required(entries: &mut Vec<(String, Source)>, field: String, source: Source) {
    match entries.iter_mut().find(|(name, _)| name == &field) {
        Some(entry) => entry.1 = source,
        None => entries.push((field, source)),
    }
}

fn upsert_defaulted(
    entries: &mut Vec<(String, Value, Source)>,
    field: String,
    default: Value,
    source: Source,
) {
    match entries.iter_mut().find(|(name, _, _)| name == &field) {
        Some(entry) => {
            entry.1 = default;
            entry.2 = source;
        }
        None => entries.push((field, default, source)),
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.inner.name)
            .field("fields", &self.inner.fields)
            .field("defaults", &self.inner.defaults)
            .finish()
    }
}

/// An instance of a [`RecordType`]: one value slot per field.
#[derive(Clone)]
pub struct Record {
    ty: RecordType,
    slots: Box<[Value]>,
}

impl Record {
    pub(crate) fn from_slots(ty: RecordType, slots: Box<[Value]>) -> Self {
        Self { ty, slots }
    }

    #[must_use]
    pub fn record_type(&self) -> &RecordType {
        &self.ty
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.ty.inner.fields.iter().position(|f| &**f == name)?;
        Some(&self.slots[index])
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.ty.field_names().zip(self.slots.iter())
    }
}

impl PartialEq for Record {
    /// Instances are equal only when they share the exact record type and
    /// every field value matches.
    fn eq(&self, other: &Self) -> bool {
        self.ty.same_type(&other.ty) && self.slots == other.slots
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.ty.name())?;
        for (i, (field, value)) in self.fields().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}={value:?}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dog() -> RecordType {
        RecordType::new(
            "Dog",
            vec![
                ("name".into(), None),
                ("breed".into(), None),
                ("is_good_boy".into(), Some(Value::Bool(true))),
            ],
            || vec![TypeExpr::Str, TypeExpr::Str, TypeExpr::Bool],
        )
        .unwrap()
    }

    #[test]
    fn test_field_partition() {
        let ty = RecordType::new(
            "T",
            vec![
                ("a".into(), Some(Value::Int(1))),
                ("b".into(), None),
                ("c".into(), Some(Value::Int(3))),
                ("d".into(), None),
            ],
            || vec![TypeExpr::Int; 4],
        )
        .unwrap();
        let names: Vec<_> = ty.field_names().collect();
        assert_eq!(vec!["b", "d", "a", "c"], names);
        assert_eq!(2, ty.num_required());
    }

    #[test]
    fn test_instance_binding() {
        let ty = dog();
        let a = ty
            .instance(vec![Value::from("snickers"), Value::from("corgi")], vec![])
            .unwrap();
        assert_eq!(Some(&Value::Bool(true)), a.get("is_good_boy"));

        let b = ty
            .instance(
                vec![Value::from("snickers")],
                vec![("breed", Value::from("corgi"))],
            )
            .unwrap();
        assert_eq!(a, b);

        let c = ty
            .instance(
                vec![
                    Value::from("snickers"),
                    Value::from("corgi"),
                    Value::Bool(false),
                ],
                vec![],
            )
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_instance_errors() {
        let ty = dog();
        assert_eq!(
            Err(Error::MissingArgument("breed".into())),
            ty.instance(vec![Value::from("rex")], vec![]).map(|_| ())
        );
        assert_eq!(
            Err(Error::ExtraPositional),
            ty.instance(vec![Value::Null; 4], vec![]).map(|_| ())
        );
        assert_eq!(
            Err(Error::DuplicateArgument("name".into())),
            ty.instance(
                vec![Value::from("rex"), Value::from("lab")],
                vec![("name", Value::from("rex"))]
            )
            .map(|_| ())
        );
        assert_eq!(
            Err(Error::UnknownArgument("color".into())),
            ty.instance(
                vec![Value::from("rex"), Value::from("lab")],
                vec![("color", Value::from("brown"))]
            )
            .map(|_| ())
        );
    }

    #[test]
    fn test_defaults_not_aliased() {
        let ty = RecordType::new(
            "Bag",
            vec![("items".into(), Some(Value::List(vec![])))],
            || vec![TypeExpr::list(TypeExpr::Int)],
        )
        .unwrap();
        let mut a = ty.instance(vec![], vec![]).unwrap();
        let b = ty.instance(vec![], vec![]).unwrap();
        if let Some(Value::List(items)) = a.slots.first_mut() {
            items.push(Value::Int(1));
        }
        assert_eq!(Some(&Value::List(vec![])), b.get("items"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_base_merge() {
        let base = RecordType::new(
            "Base",
            vec![("x".into(), None), ("y".into(), Some(Value::Int(0)))],
            || vec![TypeExpr::Int, TypeExpr::Int],
        )
        .unwrap();
        // override `y` to be required, add `z` with a default
        let sub = RecordType::with_bases(
            "Sub",
            std::slice::from_ref(&base),
            vec![("y".into(), None), ("z".into(), Some(Value::from("s")))],
            || vec![TypeExpr::Int, TypeExpr::Str],
        )
        .unwrap();
        let names: Vec<_> = sub.field_names().collect();
        assert_eq!(vec!["x", "y", "z"], names);
        assert_eq!(2, sub.num_required());
        let schemas = sub.field_schemas().unwrap();
        assert_eq!("int", schemas[0].to_string());
        assert_eq!("int", schemas[1].to_string());
        assert_eq!("str", schemas[2].to_string());
    }

    #[test]
    fn test_lazy_self_reference() {
        let slot: Arc<OnceLock<RecordType>> = Arc::new(OnceLock::new());
        let captured = slot.clone();
        let tree = RecordType::new(
            "Tree",
            vec![
                ("value".into(), None),
                ("children".into(), Some(Value::List(vec![]))),
            ],
            move || {
                let this = captured.get().expect("declared").clone();
                vec![TypeExpr::Int, TypeExpr::list(TypeExpr::Record(this))]
            },
        )
        .unwrap();
        slot.set(tree.clone()).ok().unwrap();

        let schemas = tree.field_schemas().unwrap();
        assert_eq!("int", schemas[0].to_string());
        assert_eq!("List[Tree]", schemas[1].to_string());
    }

    #[test]
    fn test_rotating_field_index() {
        let ty = dog();
        let mut pos = 0;
        assert_eq!(Some(0), ty.field_index("name", &mut pos));
        assert_eq!(1, pos);
        assert_eq!(Some(1), ty.field_index("breed", &mut pos));
        assert_eq!(Some(2), ty.field_index("is_good_boy", &mut pos));
        assert_eq!(0, pos);
        // out-of-order lookup still resolves
        assert_eq!(Some(1), ty.field_index("breed", &mut pos));
        assert_eq!(None, ty.field_index("missing", &mut pos));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        assert_eq!(
            Err(Error::DuplicateField("a".into())),
            RecordType::new(
                "T",
                vec![("a".into(), None), ("a".into(), None)],
                || vec![TypeExpr::Int, TypeExpr::Int],
            )
            .map(|_| ())
        );
    }
}
