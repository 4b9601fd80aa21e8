//! Error types for NDEF record decoding.
//!
//! [`decode_records`](crate::decode_records) never surfaces these errors: it
//! stops at the first record that fails and returns the records decoded so
//! far. They are reported by [`decode_record`](crate::decode_record) for
//! callers that want to know where and why a buffer ended early.

use std::fmt;

/// Result type alias for NDEF decoding.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Field of an NDEF record, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Header,
    TypeLength,
    PayloadLength,
    IdLength,
    Type,
    Id,
    Payload,
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Header => "header",
            Self::TypeLength => "type length",
            Self::PayloadLength => "payload length",
            Self::IdLength => "id length",
            Self::Type => "type",
            Self::Id => "id",
            Self::Payload => "payload",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while decoding a single NDEF record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Decoding was asked to start at or past the end of the buffer.
    #[error("Offset {offset} is past the end of a {len}-byte buffer")]
    OffsetOutOfBounds { offset: usize, len: usize },

    /// A record field would read past the end of the buffer.
    #[error("Record {field} at offset {offset} needs {needed} bytes, {available} available")]
    Truncated {
        field: RecordField,
        offset: usize,
        needed: usize,
        available: usize,
    },
}

impl DecodeError {
    /// Create a new truncation error.
    pub fn truncated(field: RecordField, offset: usize, needed: usize, available: usize) -> Self {
        Self::Truncated {
            field,
            offset,
            needed,
            available,
        }
    }

    /// The record field that could not be read, if any.
    pub fn field(&self) -> Option<RecordField> {
        match self {
            Self::Truncated { field, .. } => Some(*field),
            Self::OffsetOutOfBounds { .. } => None,
        }
    }
}
