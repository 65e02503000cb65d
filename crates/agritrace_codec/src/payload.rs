//! JSON request payloads and responses.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decode a caller-supplied JSON payload into `T`.
///
/// # Errors
///
/// Returns [`CodecError::InvalidPayload`] if the payload is not valid JSON
/// for `T`.
pub fn from_payload<T: DeserializeOwned>(payload: &str) -> CodecResult<T> {
    serde_json::from_str(payload).map_err(|e| CodecError::invalid_payload(e.to_string()))
}

/// Serialize a response value to JSON.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] if serialization fails.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> CodecResult<String> {
    serde_json::to_string(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}
