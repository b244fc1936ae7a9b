//! Runtime validation and coercion of JSON-shaped records.
//!
//! Declare a [`Schema`] (field name → [`Ty`]), turn it into a [`RecordType`],
//! and construct [`Record`]s from raw field maps or plain JSON. Every stored
//! value conforms to its field's descriptor; nested raw maps are coerced into
//! nested records on the way in.
//!
//! ```
//! use json_record::{RecordType, Schema, Ty};
//! use serde_json::json;
//!
//! let inner = RecordType::new("Inner", Schema::new().field("foo", Ty::string()));
//! let outer = RecordType::new(
//!     "Outer",
//!     Schema::new()
//!         .field("inner", Ty::record(&inner))
//!         .field("nick", Ty::optional(Ty::string())),
//! );
//!
//! let record = outer.from_plain(&json!({"inner": {"foo": "bar"}})).unwrap();
//! assert!(record.get("inner").unwrap().unwrap().as_record().is_some());
//! assert_eq!(record.get("nick").unwrap(), None);
//! assert!(outer.from_plain(&json!({"inner": 5})).is_err());
//! ```

pub mod check;
pub mod path_de;
pub mod record;
pub mod schema_file;
pub mod ty;
pub mod value;

pub use check::{Mode, Path, PathSegment, Violation, ViolationKind, Violations, check, check_all, conforms};
pub use record::{Record, RecordError, RecordType, Schema};
pub use schema_file::{SchemaFileError, SchemaSet};
pub use ty::{Primitive, Ty};
pub use value::{Fields, Kind, Value, fields_from_plain};
