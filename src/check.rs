//! Structural conformance checker.
//!
//! Walks a [`Value`] against a [`Ty`] depth-first, in field/element
//! declaration order. Two modes share the same walk:
//! - fail-fast: stop at the first nonconformity;
//! - exhaustive: finish the walk and keep every nonconformity with its path.
//!
//! Unions are the only backtracking point: each branch is tried with a
//! throwaway fail-fast walk, and if none conforms a single `UnionNoMatch`
//! is reported at the union site.
//!
//! Record fields are checked with [`check_field`], which also explains a raw
//! map left under a record descriptor: coercion could not build it, so the
//! nested construction violations are reported beneath the field instead of
//! a bare `NotARecordInstance`.
pub mod path;
pub mod violation;

use crate::record::{Record, RecordType};
use crate::ty::{Primitive, Ty};
use crate::value::{Fields, NULL, Value};

pub use path::{Path, PathSegment};
pub use violation::{Violation, ViolationKind, Violations};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    FailFast,
    Exhaustive,
}

// ------------------------------- Front API -------------------------------- //

/// Fail-fast check: the first violation found, if any.
pub fn check(value: &Value, ty: &Ty) -> Result<(), Violation> {
    match check_at(value, ty, Path::root(), Mode::FailFast) {
        Ok(()) => Ok(()),
        Err(found) => match found.into_iter().next() {
            Some(first) => Err(first),
            None => Ok(()),
        },
    }
}

/// Exhaustive check: every violation, in discovery order.
pub fn check_all(value: &Value, ty: &Ty) -> Result<(), Violations> {
    check_at(value, ty, Path::root(), Mode::Exhaustive)
}

pub fn conforms(value: &Value, ty: &Ty) -> bool {
    let mut checker = Checker::new(Mode::FailFast, Path::root());
    checker.walk(value, ty).is_ok() && checker.found.is_empty()
}

/// Check with every reported path prefixed by `at`.
fn check_at(value: &Value, ty: &Ty, at: Path, mode: Mode) -> Result<(), Violations> {
    let mut checker = Checker::new(mode, at);
    // A halt only means fail-fast already has its violation.
    let _ = checker.walk(value, ty);
    checker.finish()
}

/// Check a record field value after coercion, explaining raw maps that
/// failed to become nested records.
pub(crate) fn check_field(value: &Value, ty: &Ty, at: Path, mode: Mode) -> Result<(), Violations> {
    let mut checker = Checker::new(mode, at);
    checker.explain_raw = true;
    let _ = checker.walk(value, ty);
    checker.finish()
}

/// Check every declared field of an existing record.
pub(crate) fn check_record(record: &Record, mode: Mode) -> Result<(), Violations> {
    let mut checker = Checker::new(mode, Path::root());
    let _ = checker.fields(record, record.record_type());
    checker.finish()
}

// ------------------------------- Walker ----------------------------------- //

/// Fail-fast stop signal; the violation itself is already recorded.
struct Halt;

type Step = Result<(), Halt>;

struct Checker {
    mode: Mode,
    path: Path,
    found: Vec<Violation>,
    explain_raw: bool,
}

impl Checker {
    fn new(mode: Mode, path: Path) -> Self {
        Self { mode, path, found: Vec::new(), explain_raw: false }
    }

    fn finish(self) -> Result<(), Violations> {
        match Violations::from_vec(self.found) {
            None => Ok(()),
            Some(found) => Err(found),
        }
    }

    fn report(&mut self, kind: ViolationKind, message: String) -> Step {
        self.found.push(Violation::new(self.path.clone(), kind, message));
        self.proceed()
    }

    fn proceed(&self) -> Step {
        match self.mode {
            Mode::FailFast => Err(Halt),
            Mode::Exhaustive => Ok(()),
        }
    }

    fn mismatch(&mut self, ty: &Ty, value: &Value) -> Step {
        self.report(
            ViolationKind::TypeMismatch,
            format!("expected {ty}, found {}", value.describe()),
        )
    }

    fn nested(&mut self, segment: PathSegment, value: &Value, ty: &Ty) -> Step {
        self.path.push(segment);
        let step = self.walk(value, ty);
        self.path.pop();
        step
    }

    fn walk(&mut self, value: &Value, ty: &Ty) -> Step {
        match ty {
            Ty::Primitive(p) => {
                if primitive_conforms(value, *p) { Ok(()) } else { self.mismatch(ty, value) }
            }
            Ty::Null => {
                if value.is_null() { Ok(()) } else { self.mismatch(ty, value) }
            }
            Ty::Optional(inner) => {
                if value.is_null() { Ok(()) } else { self.walk(value, inner) }
            }
            Ty::Union(branches) => {
                // Branch diagnostics are dropped; one report per union site.
                if branches.iter().any(|branch| conforms(value, branch)) {
                    return Ok(());
                }
                self.report(
                    ViolationKind::UnionNoMatch,
                    format!("{} matches no branch of {ty}", value.describe()),
                )
            }
            Ty::List(element) => {
                let Value::List(items) = value else {
                    return self.mismatch(ty, value);
                };
                for (index, item) in items.iter().enumerate() {
                    self.nested(PathSegment::Index(index), item, element)?;
                }
                Ok(())
            }
            Ty::Map { key, value: value_ty } => {
                let Value::Map(entries) = value else {
                    return self.mismatch(ty, value);
                };
                for (k, v) in entries {
                    self.nested(PathSegment::MapKey(k.clone()), &Value::String(k.clone()), key)?;
                    self.nested(PathSegment::Key(k.clone()), v, value_ty)?;
                }
                Ok(())
            }
            Ty::Tuple(elements) => {
                let Value::List(items) = value else {
                    return self.mismatch(ty, value);
                };
                if items.len() != elements.len() {
                    self.report(
                        ViolationKind::TypeMismatch,
                        format!(
                            "expected {ty} with {} element(s), found {}",
                            elements.len(),
                            items.len()
                        ),
                    )?;
                }
                for (pos, (item, element)) in items.iter().zip(elements).enumerate() {
                    self.nested(PathSegment::Position(pos), item, element)?;
                }
                Ok(())
            }
            Ty::Record(record_type) => match value {
                Value::Record(record) if record.is_instance_of(record_type) => {
                    self.fields(record, record_type)
                }
                Value::Map(raw) if self.explain_raw => self.explain(raw, record_type, value),
                _ => self.not_an_instance(record_type, value),
            },
        }
    }

    fn not_an_instance(&mut self, record_type: &RecordType, value: &Value) -> Step {
        self.report(
            ViolationKind::NotARecordInstance,
            format!("expected record {}, found {}", record_type.name(), value.describe()),
        )
    }

    /// Rebuild `raw` in this walk's mode and report why it is not a record.
    fn explain(&mut self, raw: &Fields, record_type: &RecordType, value: &Value) -> Step {
        match record_type.build(raw.clone(), self.mode) {
            Ok(_) => self.not_an_instance(record_type, value),
            Err(nested) => {
                for violation in nested {
                    let path = self.path.join(&violation.path);
                    self.found.push(Violation::new(path, violation.kind, violation.message));
                }
                self.proceed()
            }
        }
    }

    fn fields(&mut self, record: &Record, record_type: &RecordType) -> Step {
        for (name, field_ty) in record_type.schema().iter() {
            // Absent optionals read as null.
            let field_value = record.stored(name).unwrap_or(&NULL);
            self.nested(PathSegment::Field(name.to_owned()), field_value, field_ty)?;
        }
        Ok(())
    }
}

fn primitive_conforms(value: &Value, p: Primitive) -> bool {
    match p {
        Primitive::Any => true,
        Primitive::String => matches!(value, Value::String(_)),
        Primitive::Boolean => matches!(value, Value::Bool(_)),
        // Booleans are their own variant, never numbers.
        Primitive::Integer => matches!(value, Value::Number(n) if n.is_i64() || n.is_u64()),
        // Integral JSON literals satisfy float fields.
        Primitive::Float => matches!(value, Value::Number(_)),
    }
}

// ------------------------------- Tests ------------------------------------ //
