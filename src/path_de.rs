use serde::de::DeserializeOwned;
use thiserror::Error;

/// Deserialization failure with the JSON path of the offending node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("at JSON path {path} → {message}")]
pub struct PathError {
    pub path: String,
    pub message: String,
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let mut de = serde_json::Deserializer::from_str(src);
    let value = with_path(&mut de)?;
    de.end().map_err(|err| PathError { path: ".".into(), message: err.to_string() })?;
    Ok(value)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PathError> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = with_path(&mut de)?;
    de.end().map_err(|err| PathError { path: ".".into(), message: err.to_string() })?;
    Ok(value)
}

fn with_path<'de, T, D>(de: D) -> Result<T, PathError>
where
    T: DeserializeOwned,
    D: serde::Deserializer<'de>,
{
    serde_path_to_error::deserialize(de).map_err(|err| PathError {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}
