//! Tagged CBOR envelope.

use crate::error::{CodecError, CodecResult};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record type that can be stored in the ledger.
///
/// `KIND` is written into every envelope and checked on decode. It is part
/// of the persisted format and must never change for an existing type.
pub trait Record: Serialize + DeserializeOwned {
    /// Stable discriminator for this record type.
    const KIND: &'static str;
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    kind: &'a str,
    body: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    kind: String,
    body: T,
}

#[derive(Deserialize)]
struct Header {
    kind: String,
}

/// Encode a record into its tagged envelope.
///
/// # Errors
///
/// Returns an error only if the record's `Serialize` impl fails, which does
/// not happen for plain derived records.
pub fn encode_record<T: Record>(record: &T) -> CodecResult<Bytes> {
    let envelope = EnvelopeRef {
        kind: T::KIND,
        body: record,
    };
    let mut buffer = Vec::new();
    ciborium::into_writer(&envelope, &mut buffer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(Bytes::from(buffer))
}

/// Read the kind discriminator without decoding the body.
///
/// # Errors
///
/// Returns an error if the bytes are not an envelope.
pub fn peek_kind(bytes: &[u8]) -> CodecResult<String> {
    let header: Header =
        ciborium::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))?;
    Ok(header.kind)
}

/// Decode a record of type `T` from its envelope.
///
/// # Errors
///
/// Returns [`CodecError::KindMismatch`] if the envelope holds another kind,
/// or [`CodecError::DecodingFailed`] if the bytes or body are malformed.
pub fn decode_record<T: Record>(bytes: &[u8]) -> CodecResult<T> {
    let kind = peek_kind(bytes)?;
    if kind != T::KIND {
        return Err(CodecError::KindMismatch {
            expected: T::KIND,
            found: kind,
        });
    }
    let envelope: Envelope<T> =
        ciborium::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))?;
    debug_assert_eq!(envelope.kind, T::KIND);
    Ok(envelope.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Crop {
        id: String,
        farmer_id: String,
        area: f64,
    }

    impl Record for Crop {
        const KIND: &'static str = "crop";
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Grower {
        id: String,
        farmer_id: String,
        area: f64,
    }

    impl Record for Grower {
        const KIND: &'static str = "grower";
    }

    fn crop() -> Crop {
        Crop {
            id: "C1".into(),
            farmer_id: "F1".into(),
            area: 2.5,
        }
    }

    #[test]
    fn decode_returns_body() {
        let bytes = encode_record(&crop()).unwrap();
        assert_eq!(decode_record::<Crop>(&bytes).unwrap(), crop());
    }

    #[test]
    fn identical_shape_different_kind_is_rejected() {
        let bytes = encode_record(&crop()).unwrap();
        let err = decode_record::<Grower>(&bytes).unwrap_err();
        assert_eq!(
            err,
            CodecError::KindMismatch {
                expected: "grower",
                found: "crop".into(),
            }
        );
    }

    #[test]
    fn peek_kind_reads_discriminator() {
        let bytes = encode_record(&crop()).unwrap();
        assert_eq!(peek_kind(&bytes).unwrap(), "crop");
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(
            decode_record::<Crop>(b"\xff\x00not cbor"),
            Err(CodecError::DecodingFailed { .. })
        ));
    }

    #[test]
    fn untagged_map_is_not_an_envelope() {
        let mut buffer = Vec::new();
        ciborium::into_writer(&crop(), &mut buffer).unwrap();
        assert!(peek_kind(&buffer).is_err());
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = encode_record(&crop()).unwrap();
        let b = encode_record(&crop()).unwrap();
        assert_eq!(a, b);
    }
}
