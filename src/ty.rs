// Type descriptors. A closed tree; the checker and coercion dispatch on it by `match`.

use std::fmt;

use crate::record::RecordType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Boolean,
    Integer,
    /// Accepts integers too.
    Float,
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Primitive(Primitive),
    Null,                       // null / absent, the branch `Optional` adds
    Optional(Box<Ty>),          // same as Union([inner, Null])
    Union(Vec<Ty>),             // tried in declared order
    List(Box<Ty>),
    Map { key: Box<Ty>, value: Box<Ty> },
    Tuple(Vec<Ty>),             // exact arity
    Record(RecordType),         // an instance of exactly this record type
}

impl Ty {
    pub fn string() -> Self {
        Ty::Primitive(Primitive::String)
    }

    pub fn boolean() -> Self {
        Ty::Primitive(Primitive::Boolean)
    }

    pub fn integer() -> Self {
        Ty::Primitive(Primitive::Integer)
    }

    pub fn float() -> Self {
        Ty::Primitive(Primitive::Float)
    }

    pub fn any() -> Self {
        Ty::Primitive(Primitive::Any)
    }

    pub fn optional(inner: Ty) -> Self {
        Ty::Optional(Box::new(inner))
    }

    pub fn union<I: IntoIterator<Item = Ty>>(branches: I) -> Self {
        Ty::Union(branches.into_iter().collect())
    }

    pub fn list(element: Ty) -> Self {
        Ty::List(Box::new(element))
    }

    pub fn map(key: Ty, value: Ty) -> Self {
        Ty::Map { key: Box::new(key), value: Box::new(value) }
    }

    /// `Map` with string keys, the only kind JSON objects have.
    pub fn string_map(value: Ty) -> Self {
        Ty::map(Ty::string(), value)
    }

    pub fn tuple<I: IntoIterator<Item = Ty>>(elements: I) -> Self {
        Ty::Tuple(elements.into_iter().collect())
    }

    pub fn record(record_type: &RecordType) -> Self {
        Ty::Record(record_type.clone())
    }

    /// True when null/absent conforms, i.e. a field of this type is not required.
    pub fn admits_absence(&self) -> bool {
        match self {
            Ty::Primitive(Primitive::Any) | Ty::Null | Ty::Optional(_) => true,
            Ty::Union(branches) => branches.iter().any(Ty::admits_absence),
            _ => false,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Primitive::String => "string",
            Primitive::Boolean => "boolean",
            Primitive::Integer => "integer",
            Primitive::Float => "float",
            Primitive::Any => "any",
        })
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Primitive(p) => write!(f, "{p}"),
            Ty::Null => f.write_str("null"),
            Ty::Optional(inner) => write!(f, "optional[{inner}]"),
            Ty::Union(branches) => {
                f.write_str("union[")?;
                write_joined(f, branches)?;
                f.write_str("]")
            }
            Ty::List(element) => write!(f, "list[{element}]"),
            Ty::Map { key, value } => write!(f, "map[{key}, {value}]"),
            Ty::Tuple(elements) => {
                f.write_str("tuple[")?;
                write_joined(f, elements)?;
                f.write_str("]")
            }
            Ty::Record(record_type) => f.write_str(record_type.name()),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, tys: &[Ty]) -> fmt::Result {
    for (i, ty) in tys.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}
