//! Record engine.
//!
//! A [`RecordType`] is a named, immutable [`Schema`] behind a shared handle.
//! A [`Record`] is an owned field map that always conforms to its type:
//! - construction merges sources left-to-right, then overrides, rejects
//!   undeclared keys, coerces and checks every declared field, and either
//!   yields a whole record or nothing;
//! - `set` coerces and checks only the assigned field.
//!
//! Absent optional fields are not stored, so `get` can tell "declared but
//! absent" (`Ok(None)`) from a stored null.
pub mod coerce;
pub mod schema;

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::check::{self, Mode, Path, Violation, ViolationKind, Violations};
use crate::value::{Fields, Value, fields_from_plain};

pub use schema::Schema;

use coerce::coerce;

// ------------------------------- Errors ----------------------------------- //

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// `get`/`set` named a field the schema does not declare.
    #[error("{record} has no field {field:?}")]
    UnknownField { record: String, field: String },

    /// Construction or assignment produced a nonconforming record.
    #[error("invalid {record}:\n{violations}")]
    Invalid { record: String, violations: Violations },
}

impl RecordError {
    pub fn violations(&self) -> &[Violation] {
        match self {
            RecordError::UnknownField { .. } => &[],
            RecordError::Invalid { violations, .. } => violations.as_slice(),
        }
    }

    pub fn kinds(&self) -> Vec<ViolationKind> {
        match self {
            RecordError::UnknownField { .. } => vec![ViolationKind::UnknownField],
            RecordError::Invalid { violations, .. } => violations.kinds(),
        }
    }
}

// ------------------------------- Record type ------------------------------ //

/// Shared handle to a record definition. Clones are the same type; two
/// definitions are different types even when their schemas are equal.
#[derive(Clone)]
pub struct RecordType(Arc<Definition>);

struct Definition {
    name: String,
    schema: Schema,
    mode: Mode,
}

impl RecordType {
    /// Define a record type that reports the first violation on construction.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self::with_mode(name, schema, Mode::FailFast)
    }

    /// Define a record type with an explicit construction reporting mode.
    pub fn with_mode(name: impl Into<String>, schema: Schema, mode: Mode) -> Self {
        Self(Arc::new(Definition { name: name.into(), schema, mode }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn schema(&self) -> &Schema {
        &self.0.schema
    }

    pub fn mode(&self) -> Mode {
        self.0.mode
    }

    pub fn same_type(&self, other: &RecordType) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Merge `sources` left-to-right, apply `overrides` on top, and build.
    pub fn construct<I>(&self, sources: I, overrides: Fields) -> Result<Record, RecordError>
    where
        I: IntoIterator<Item = Fields>,
    {
        let mut merged = Fields::new();
        for source in sources.into_iter().chain(std::iter::once(overrides)) {
            merged.extend(source);
        }
        self.construct_merged(merged, self.mode())
    }

    pub fn from_fields(&self, fields: Fields) -> Result<Record, RecordError> {
        self.construct_merged(fields, self.mode())
    }

    /// Build from plain JSON, which must be an object.
    pub fn from_plain(&self, plain: &serde_json::Value) -> Result<Record, RecordError> {
        self.from_plain_with(plain, self.mode())
    }

    /// Like [`RecordType::from_plain`] with an explicit reporting mode.
    pub fn from_plain_with(&self, plain: &serde_json::Value, mode: Mode) -> Result<Record, RecordError> {
        self.build_plain(plain, mode).map_err(|violations| self.rejected(violations))
    }

    /// Every violation in a raw document, regardless of the configured mode.
    pub fn validate_plain(&self, plain: &serde_json::Value) -> Result<(), Violations> {
        self.build_plain(plain, Mode::Exhaustive).map(|_| ())
    }

    fn build_plain(&self, plain: &serde_json::Value, mode: Mode) -> Result<Record, Violations> {
        match fields_from_plain(plain) {
            Some(fields) => self.build(fields, mode),
            None => Err(Violations::one(Violation::new(
                Path::root(),
                ViolationKind::TypeMismatch,
                format!("expected {} object, found {}", self.name(), Value::from(plain).describe()),
            ))),
        }
    }

    fn construct_merged(&self, merged: Fields, mode: Mode) -> Result<Record, RecordError> {
        self.build(merged, mode).map_err(|violations| self.rejected(violations))
    }

    fn rejected(&self, violations: Violations) -> RecordError {
        debug!(record = self.name(), violations = violations.len(), "construction rejected");
        self.invalid(violations)
    }

    fn invalid(&self, violations: Violations) -> RecordError {
        RecordError::Invalid { record: self.name().to_owned(), violations }
    }

    /// The whole-schema pass shared by construction and coercion.
    pub(crate) fn build(&self, mut merged: Fields, mode: Mode) -> Result<Record, Violations> {
        let schema = self.schema();
        let mut found = Vec::new();

        for key in merged.keys() {
            if !schema.contains(key) {
                let violation = Violation::new(
                    Path::field(key),
                    ViolationKind::UnknownField,
                    format!("{} has no field {key:?}", self.name()),
                );
                if mode == Mode::FailFast {
                    return Err(Violations::one(violation));
                }
                found.push(violation);
            }
        }

        let mut stored = Fields::with_capacity(schema.len());
        for (name, ty) in schema.iter() {
            let Some(raw) = merged.swap_remove(name) else {
                if !ty.admits_absence() {
                    found.push(Violation::new(
                        Path::field(name),
                        ViolationKind::MissingRequiredField,
                        format!("required field {name:?} is missing"),
                    ));
                    if mode == Mode::FailFast {
                        break;
                    }
                }
                continue;
            };
            let value = coerce(raw, ty);
            match check::check_field(&value, ty, Path::field(name), mode) {
                Ok(()) => {
                    stored.insert(name.to_owned(), value);
                }
                Err(violations) => {
                    found.extend(violations);
                    if mode == Mode::FailFast {
                        break;
                    }
                }
            }
        }

        match Violations::from_vec(found) {
            None => Ok(Record { record_type: self.clone(), fields: stored }),
            Some(violations) => Err(violations),
        }
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.same_type(other)
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.0.name)
            .field("schema", &self.0.schema)
            .field("mode", &self.0.mode)
            .finish()
    }
}

// ------------------------------- Record ----------------------------------- //

#[derive(Clone)]
pub struct Record {
    record_type: RecordType,
    fields: Fields,
}

impl Record {
    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    pub fn is_instance_of(&self, record_type: &RecordType) -> bool {
        self.record_type.same_type(record_type)
    }

    /// `Ok(None)` for a declared field that is absent.
    pub fn get(&self, field: &str) -> Result<Option<&Value>, RecordError> {
        if !self.record_type.schema().contains(field) {
            return Err(self.unknown(field));
        }
        Ok(self.fields.get(field))
    }

    pub(crate) fn stored(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Coerce and check `value` against this one field, then store it.
    /// Other fields are not revisited.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), RecordError> {
        let Some(ty) = self.record_type.schema().get(field) else {
            return Err(self.unknown(field));
        };
        let value = coerce(value.into(), ty);
        if let Err(violations) = check::check_field(&value, ty, Path::field(field), Mode::FailFast) {
            debug!(record = self.record_type.name(), field, "assignment rejected");
            return Err(RecordError::Invalid {
                record: self.record_type.name().to_owned(),
                violations,
            });
        }
        self.fields.insert(field.to_owned(), value);
        Ok(())
    }

    /// Stored fields in schema declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.record_type
            .schema()
            .names()
            .filter_map(|name| self.fields.get(name).map(|value| (name, value)))
    }

    /// Re-check the whole record, reporting every violation.
    pub fn validate(&self) -> Result<(), Violations> {
        check::check_record(self, Mode::Exhaustive)
    }

    pub fn to_plain(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields().map(|(name, value)| (name.to_owned(), value.to_plain())).collect(),
        )
    }

    fn unknown(&self, field: &str) -> RecordError {
        RecordError::UnknownField {
            record: self.record_type.name().to_owned(),
            field: field.to_owned(),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.record_type.same_type(&other.record_type) && self.fields == other.fields
    }
}

impl fmt::Debug for Record {
    /// `Name({"field": value, ...})`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.record_type.name())?;
        f.debug_map().entries(self.fields()).finish()?;
        f.write_str(")")
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Ty;
    use serde_json::json;

    fn fields(plain: serde_json::Value) -> Fields {
        fields_from_plain(&plain).unwrap()
    }

    fn people() -> RecordType {
        RecordType::new(
            "Person",
            Schema::new()
                .field("name", Ty::string())
                .field("age", Ty::optional(Ty::integer()))
                .field("tags", Ty::list(Ty::string())),
        )
    }

    #[test]
    fn later_sources_win_and_overrides_win_last() {
        let rt = people();
        let r = rt
            .construct(
                [fields(json!({"name": "a", "tags": []})), fields(json!({"name": "b"}))],
                fields(json!({"age": 3})),
            )
            .unwrap();
        assert_eq!(r.get("name").unwrap(), Some(&Value::from("b")));
        assert_eq!(r.get("age").unwrap(), Some(&Value::from(3)));
    }

    #[test]
    fn absent_optional_is_not_stored() {
        let r = people().from_plain(&json!({"name": "a", "tags": ["x"]})).unwrap();
        assert_eq!(r.get("age").unwrap(), None);
        assert!(!r.contains("age"));
        assert_eq!(r.to_plain(), json!({"name": "a", "tags": ["x"]}));
    }

    #[test]
    fn explicit_null_for_optional_is_stored() {
        let r = people().from_plain(&json!({"name": "a", "age": null, "tags": []})).unwrap();
        assert_eq!(r.get("age").unwrap(), Some(&Value::Null));
    }

    #[test]
    fn unknown_key_fails_before_field_checks() {
        let err = people().from_plain(&json!({"name": 1, "nope": true})).unwrap_err();
        assert_eq!(err.kinds(), [ViolationKind::UnknownField]);
        assert_eq!(err.violations()[0].path, Path::field("nope"));
    }

    #[test]
    fn exhaustive_type_collects_everything() {
        let rt = RecordType::with_mode("Person", people().schema().clone(), Mode::Exhaustive);
        let err = rt.from_plain(&json!({"age": "x", "tags": [1, "ok", 2], "extra": 0})).unwrap_err();
        assert_eq!(
            err.kinds(),
            [
                ViolationKind::UnknownField,
                ViolationKind::MissingRequiredField,
                ViolationKind::TypeMismatch,
                ViolationKind::TypeMismatch,
                ViolationKind::TypeMismatch,
            ]
        );
        let paths: Vec<_> = err.violations().iter().map(|v| v.path.to_string()).collect();
        assert_eq!(
            paths,
            [r#"field "extra""#, r#"field "name""#, r#"field "age""#, r#"field "tags"[0]"#, r#"field "tags"[2]"#]
        );
    }

    #[test]
    fn set_checks_only_the_assigned_field() {
        let rt = people();
        let mut r = rt.from_plain(&json!({"name": "a", "tags": []})).unwrap();
        r.set("age", 40).unwrap();
        assert_eq!(r.get("age").unwrap(), Some(&Value::from(40)));

        let err = r.set("age", true).unwrap_err();
        assert_eq!(err.kinds(), [ViolationKind::TypeMismatch]);
        // The failed assignment left the old value.
        assert_eq!(r.get("age").unwrap(), Some(&Value::from(40)));

        assert_eq!(
            r.set("nope", 1).unwrap_err(),
            RecordError::UnknownField { record: "Person".into(), field: "nope".into() }
        );
        assert!(r.get("nope").is_err());
    }

    #[test]
    fn set_coerces_nested_maps() {
        let inner = RecordType::new("Inner", Schema::new().field("foo", Ty::string()));
        let outer = RecordType::new("Outer", Schema::new().field("inner", Ty::optional(Ty::record(&inner))));
        let mut r = outer.from_fields(Fields::new()).unwrap();
        r.set("inner", Value::from(json!({"foo": "bar"}))).unwrap();
        let nested = r.get("inner").unwrap().and_then(Value::as_record).unwrap();
        assert!(nested.is_instance_of(&inner));
        assert!(r.set("inner", Value::from(json!({"foo": 1}))).is_err());
    }

    #[test]
    fn debug_looks_like_a_constructor_call() {
        let r = people().from_plain(&json!({"name": "a", "tags": []})).unwrap();
        assert_eq!(format!("{r:?}"), r#"Person({"name": String("a"), "tags": List([])})"#);
    }

    #[test]
    fn non_object_input_is_a_root_mismatch() {
        let err = people().from_plain(&json!([1])).unwrap_err();
        let v = &err.violations()[0];
        assert!(v.path.is_root());
        assert_eq!(v.kind, ViolationKind::TypeMismatch);
    }

    #[test]
    fn records_from_distinct_types_are_never_equal() {
        let a = people();
        let b = RecordType::new("Person", a.schema().clone());
        let plain = json!({"name": "a", "tags": []});
        assert_eq!(a.from_plain(&plain).unwrap(), a.from_plain(&plain).unwrap());
        assert_ne!(a.from_plain(&plain).unwrap(), b.from_plain(&plain).unwrap());
    }

    #[test]
    fn nested_raw_records_report_their_own_fields() {
        let inner = RecordType::new(
            "Inner",
            Schema::new().field("foo", Ty::string()).field("bar", Ty::integer()),
        );
        let outer = RecordType::new("Outer", Schema::new().field("inner", Ty::record(&inner)));

        let violations = outer.validate_plain(&json!({"inner": {"foo": 1, "bar": "x"}})).unwrap_err();
        let paths: Vec<_> = violations.iter().map(|v| v.path.to_string()).collect();
        assert_eq!(paths, [r#"field "inner".foo"#, r#"field "inner".bar"#]);
        assert_eq!(violations.kinds(), [ViolationKind::TypeMismatch, ViolationKind::TypeMismatch]);

        let missing = outer.validate_plain(&json!({"inner": {"foo": "x", "baz": 1}})).unwrap_err();
        assert_eq!(missing.kinds(), [ViolationKind::UnknownField, ViolationKind::MissingRequiredField]);
        assert_eq!(missing.first().unwrap().path.to_string(), r#"field "inner".baz"#);

        // Fail-fast construction reports the first nested violation only.
        let err = outer.from_plain(&json!({"inner": {"foo": 1, "bar": "x"}})).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].path.to_string(), r#"field "inner".foo"#);
    }

    #[test]
    fn validate_plain_rejects_non_objects_at_the_root() {
        let violations = people().validate_plain(&json!("nope")).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert!(violations.first().unwrap().path.is_root());
        assert_eq!(violations.first().unwrap().message, "expected Person object, found string \"nope\"");
    }
}
