//! # AgriTrace Codec
//!
//! Record encoding for AgriTrace.
//!
//! Every value stored in the ledger is a **tagged envelope**: a CBOR map
//! holding a `kind` discriminator next to the record `body`. Because all
//! record kinds share one flat keyspace, the discriminator makes decoding
//! deterministic - a scan that asks for products never mistakes a consumer
//! for one just because the fields happen to line up.
//!
//! Request payloads and query responses use JSON.
//!
//! ## Usage
//!
//! ```
//! use agritrace_codec::{decode_record, encode_record, peek_kind, Record};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Farm {
//!     id: String,
//! }
//!
//! impl Record for Farm {
//!     const KIND: &'static str = "farm";
//! }
//!
//! let bytes = encode_record(&Farm { id: "F1".into() }).unwrap();
//! assert_eq!(peek_kind(&bytes).unwrap(), "farm");
//! let farm: Farm = decode_record(&bytes).unwrap();
//! assert_eq!(farm.id, "F1");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod envelope;
mod error;
mod payload;

pub use envelope::{decode_record, encode_record, peek_kind, Record};
pub use error::{CodecError, CodecResult};
pub use payload::{from_payload, to_json};
