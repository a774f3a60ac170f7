//! JSON payloads.

use bytes::Bytes;

use crate::{Error, Result};

/// Media type of every body the engine writes and of the responses it asks for.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Encode a value as compact JSON.
///
/// Object keys keep their insertion order, so a body built from declared
/// parameters lists them in declaration order.
///
/// # Errors
///
/// Returns [`Error::JsonSerialization`] if the value cannot be represented
/// as JSON (for instance a map with non-string keys).
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

/// Decode JSON, naming the failing location on error.
///
/// ```
/// use fastclient_core::{Error, from_json};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Post { title: String }
///
/// let err = from_json::<Post>(br#"{"title":7}"#).unwrap_err();
/// assert!(matches!(err, Error::JsonDeserialization { ref path, .. } if path == "title"));
/// ```
///
/// # Errors
///
/// Returns [`Error::JsonDeserialization`] with the dotted path of the value
/// that did not match (`.` for the document root).
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(deserializer)
        .map_err(|err| Error::json_deserialization(err.path().to_string(), err.into_inner().to_string()))
}
