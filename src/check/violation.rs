use std::fmt;

use super::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// The value's kind or shape does not match the descriptor.
    TypeMismatch,
    /// No branch of a union conforms. Reported once per union site.
    UnionNoMatch,
    /// A supplied key is not declared in the schema.
    UnknownField,
    /// A required field is absent from every source.
    MissingRequiredField,
    /// A record descriptor got something other than an instance of that exact type.
    NotARecordInstance,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViolationKind::TypeMismatch => "type mismatch",
            ViolationKind::UnionNoMatch => "no union branch matches",
            ViolationKind::UnknownField => "unknown field",
            ViolationKind::MissingRequiredField => "missing required field",
            ViolationKind::NotARecordInstance => "not a record instance",
        })
    }
}

/// A single nonconformity with its structural location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: Path,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(path: Path, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self { path, kind, message: message.into() }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Non-empty list of violations in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// `None` when there is nothing to report.
    pub fn from_vec(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() { None } else { Some(Self(violations)) }
    }

    pub fn one(violation: Violation) -> Self {
        Self(vec![violation])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Violation> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    pub fn kinds(&self) -> Vec<ViolationKind> {
        self.0.iter().map(|v| v.kind).collect()
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.0
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_not_a_report() {
        assert!(Violations::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn display_lists_one_violation_per_line() {
        let vs = Violations::from_vec(vec![
            Violation::new(Path::field("a"), ViolationKind::TypeMismatch, "expected string, found integer 1"),
            Violation::new(Path::field("b"), ViolationKind::MissingRequiredField, "required field \"b\" is missing"),
        ])
        .unwrap();
        assert_eq!(
            vs.to_string(),
            "  field \"a\": expected string, found integer 1\n  field \"b\": required field \"b\" is missing"
        );
        assert_eq!(vs.kinds(), [ViolationKind::TypeMismatch, ViolationKind::MissingRequiredField]);
    }
}
