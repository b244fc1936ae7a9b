//! Schema-definition surface: named record types declared in a JSON file.
//!
//! ```json
//! {
//!   "records": {
//!     "Inner": { "foo": "string" },
//!     "Outer": {
//!       "inner": { "record": "Inner" },
//!       "nick":  { "optional": "string" },
//!       "pair":  { "tuple": ["string", "integer"] },
//!       "d":     { "map": "integer" }
//!     }
//!   },
//!   "root": "Outer"
//! }
//! ```
//!
//! Records may only refer to records declared before them, so every
//! definition resolves in one pass and the resulting types are plain values.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::check::Mode;
use crate::path_de::{self, PathError};
use crate::record::{RecordType, Schema};
use crate::ty::Ty;

#[derive(Error, Debug)]
pub enum SchemaFileError {
    #[error("failed to read schema file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed schema: {0}")]
    Parse(#[from] PathError),

    #[error("record {within} refers to {name:?}, which is not declared before it")]
    UnknownRecord { within: String, name: String },

    #[error("root record {0:?} is not declared")]
    UnknownRoot(String),

    #[error("schema declares no records")]
    Empty,
}

// ------------------------------- File format ------------------------------ //

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDoc {
    records: IndexMap<String, IndexMap<String, TyDef>>,
    #[serde(default)]
    root: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TyDef {
    Named(Named),
    Composite(Composite),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Named {
    String,
    Boolean,
    Integer,
    Float,
    Any,
    Null,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Composite {
    Optional(Box<TyDef>),
    Union(Vec<TyDef>),
    List(Box<TyDef>),
    Map(MapDef),
    Tuple(Vec<TyDef>),
    Record(String),
}

/// `{"map": V}` has string keys; `{"map": [K, V]}` spells the key type out.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MapDef {
    Value(Box<TyDef>),
    KeyValue(Box<TyDef>, Box<TyDef>),
}

// ------------------------------- Loaded set ------------------------------- //

/// Record types loaded from one schema file, in declaration order.
#[derive(Debug, Clone)]
pub struct SchemaSet {
    types: IndexMap<String, RecordType>,
    root: RecordType,
}

impl SchemaSet {
    pub fn from_json_str(src: &str) -> Result<Self, SchemaFileError> {
        Self::resolve(path_de::from_str_with_path(src)?, Mode::FailFast)
    }

    /// Load with every record type constructing in `mode`.
    pub fn from_json_str_with(src: &str, mode: Mode) -> Result<Self, SchemaFileError> {
        Self::resolve(path_de::from_str_with_path(src)?, mode)
    }

    pub fn from_path(path: &Path, mode: Mode) -> Result<Self, SchemaFileError> {
        let bytes = std::fs::read(path).map_err(|source| SchemaFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::resolve(path_de::from_slice_with_path(&bytes)?, mode)
    }

    pub fn get(&self, name: &str) -> Option<&RecordType> {
        self.types.get(name)
    }

    pub fn root(&self) -> &RecordType {
        &self.root
    }

    pub fn root_name(&self) -> &str {
        self.root.name()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordType)> {
        self.types.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn resolve(doc: SchemaDoc, mode: Mode) -> Result<Self, SchemaFileError> {
        let mut types: IndexMap<String, RecordType> = IndexMap::with_capacity(doc.records.len());
        for (name, fields) in doc.records {
            let mut schema = Schema::new();
            for (field, def) in &fields {
                schema = schema.field(field.clone(), resolve_ty(def, &types, &name)?);
            }
            debug!(record = %name, fields = schema.len(), "record type defined");
            let record_type = RecordType::with_mode(name.clone(), schema, mode);
            types.insert(name, record_type);
        }
        let root = match doc.root {
            Some(name) => match types.get(&name) {
                Some(root) => root.clone(),
                None => return Err(SchemaFileError::UnknownRoot(name)),
            },
            None => match types.values().last() {
                Some(last) => last.clone(),
                None => return Err(SchemaFileError::Empty),
            },
        };
        Ok(Self { types, root })
    }
}

fn resolve_ty(
    def: &TyDef,
    known: &IndexMap<String, RecordType>,
    within: &str,
) -> Result<Ty, SchemaFileError> {
    let resolve_all = |defs: &[TyDef]| -> Result<Vec<Ty>, SchemaFileError> {
        defs.iter().map(|d| resolve_ty(d, known, within)).collect()
    };
    Ok(match def {
        TyDef::Named(named) => match named {
            Named::String => Ty::string(),
            Named::Boolean => Ty::boolean(),
            Named::Integer => Ty::integer(),
            Named::Float => Ty::float(),
            Named::Any => Ty::any(),
            Named::Null => Ty::Null,
        },
        TyDef::Composite(composite) => match composite {
            Composite::Optional(inner) => Ty::optional(resolve_ty(inner, known, within)?),
            Composite::Union(branches) => Ty::Union(resolve_all(branches)?),
            Composite::List(element) => Ty::list(resolve_ty(element, known, within)?),
            Composite::Map(MapDef::Value(value)) => Ty::string_map(resolve_ty(value, known, within)?),
            Composite::Map(MapDef::KeyValue(key, value)) => Ty::map(
                resolve_ty(key, known, within)?,
                resolve_ty(value, known, within)?,
            ),
            Composite::Tuple(elements) => Ty::Tuple(resolve_all(elements)?),
            Composite::Record(name) => match known.get(name) {
                Some(record_type) => Ty::record(record_type),
                None => {
                    return Err(SchemaFileError::UnknownRecord {
                        within: within.to_owned(),
                        name: name.clone(),
                    });
                }
            },
        },
    })
}
