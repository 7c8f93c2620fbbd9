//! Shared metadata helpers.
//!
//! Enumerations are written twice (name and integer). Readers trust the
//! integer and fall back to the name when the integer is unknown.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::FormatError;
use crate::compression::CompressionMode;

/// Enumerations stored as a `(name, enum_val)` pair in metadata.
pub(crate) trait MetadataEnum: Sized + Copy + PartialEq + std::fmt::Debug {
    const KIND: &'static str;

    fn from_name(name: &str) -> Option<Self>;
    fn from_value(value: u32) -> Option<Self>;
}

impl MetadataEnum for CompressionMode {
    const KIND: &'static str = "compression mode";

    fn from_name(name: &str) -> Option<Self> {
        CompressionMode::from_name(name)
    }

    fn from_value(value: u32) -> Option<Self> {
        CompressionMode::from_value(value)
    }
}

/// Decode a redundantly stored enumerant.
pub(crate) fn resolve_enum<T: MetadataEnum>(name: &str, value: u32) -> Result<T, FormatError> {
    match (T::from_value(value), T::from_name(name)) {
        (Some(by_value), Some(by_name)) => {
            if by_value != by_name {
                tracing::warn!(
                    "{} name {:?} disagrees with value {}; using {:?}",
                    T::KIND,
                    name,
                    value,
                    by_value
                );
            }
            Ok(by_value)
        }
        (Some(by_value), None) => Ok(by_value),
        (None, Some(by_name)) => {
            tracing::warn!(
                "unknown {} value {}, falling back to name {:?}",
                T::KIND,
                value,
                name
            );
            Ok(by_name)
        }
        (None, None) => Err(FormatError::UnknownEnum {
            kind: T::KIND,
            name: name.to_string(),
            value,
        }),
    }
}

pub(crate) fn to_metadata<T: Serialize>(metadata: &T) -> Result<Vec<u8>, FormatError> {
    Ok(serde_json::to_vec(metadata)?)
}

pub(crate) fn from_metadata<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, FormatError> {
    Ok(serde_json::from_slice(bytes)?)
}
