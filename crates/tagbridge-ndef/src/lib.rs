//! NDEF (NFC Data Exchange Format) message decoding.
//!
//! This crate turns the raw NDEF message stored on a tag into an ordered
//! sequence of [`NdefRecord`] values, following the NFC Forum binary
//! encoding, and interprets the two record kinds the tag bridge cares about:
//!
//! - **URI records** (`TNF=1`, type `"U"`): the first payload byte selects
//!   one of 36 abbreviated prefixes, see [`decode_uri_payload`].
//! - **Android Application Records** (`TNF=4`, type `"android.com:pkg"`):
//!   the payload is the package name of the app that wrote the tag.
//!
//! # Examples
//!
//! ```
//! use tagbridge_ndef::decode_records;
//!
//! // MB|ME|SR, TNF=1, type "U", payload 0x04 "example.com"
//! let mut data = vec![0xD1, 0x01, 0x0C, b'U', 0x04];
//! data.extend_from_slice(b"example.com");
//!
//! let records = decode_records(&data);
//! assert_eq!(records.len(), 1);
//! assert!(records[0].is_uri_record());
//! assert_eq!(records[0].decoded_uri().as_deref(), Some("https://example.com"));
//! ```
//!
//! # Malformed Input
//!
//! Decoding is tolerant: a record that would read past the end of the buffer
//! ends the message, and every record decoded before it is returned. Text
//! conversions are lossy UTF-8 and never fail. Use [`decode_record`] when the
//! exact reason a record could not be decoded matters.

pub mod decoder;
pub mod error;
pub mod header;
pub mod message;
pub mod record;
pub mod tnf;
pub mod uri;

pub use decoder::{Records, decode_message, decode_record, decode_records};
pub use error::{DecodeError, RecordField, Result};
pub use header::RecordHeader;
pub use message::NdefMessage;
pub use record::NdefRecord;
pub use tnf::{Tnf, tnf_name};
pub use uri::{URI_PREFIXES, decode_uri_payload, uri_prefix};
