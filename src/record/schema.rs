use indexmap::IndexMap;

use crate::ty::Ty;

/// Ordered field name → descriptor mapping. Declaration order is the order
/// fields are validated, reported and serialized in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: IndexMap<String, Ty>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field. Redeclaring a name replaces its descriptor in place.
    pub fn field(mut self, name: impl Into<String>, ty: Ty) -> Self {
        self.fields.insert(name.into(), ty);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Ty> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Ty)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields that must be present at construction.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, ty)| !ty.admits_absence()).map(|(name, _)| name)
    }
}

impl<K: Into<String>> FromIterator<(K, Ty)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, Ty)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().map(|(k, ty)| (k.into(), ty)).collect() }
    }
}
