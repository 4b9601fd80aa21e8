//! Error types for tag reader operations.
//!
//! Two families of errors live here:
//!
//! - [`HardwareError`] covers transport failures: reader missing or
//!   disconnected, no card in the field, malformed responses.
//! - [`ExtractError`] covers the Type 2 NDEF extraction protocol. Each variant
//!   carries the page or raw status needed to log the failure precisely.

use crate::types::StatusWord;

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while talking to a reader or a card.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Reader is not connected or has been disconnected.
    #[error("Reader disconnected: {device}")]
    Disconnected { device: String },

    /// No reader matched the requested name.
    #[error("No reader found matching '{filter}'")]
    ReaderNotFound { filter: String },

    /// No card is present in the reader field.
    #[error("No card present")]
    NoCard,

    /// Reader communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Card answered with a non-success status word.
    #[error("Card returned status {status}")]
    Status { status: StatusWord },

    /// Invalid data received from the reader or supplied for a tag image.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new reader not found error.
    pub fn reader_not_found(filter: impl Into<String>) -> Self {
        Self::ReaderNotFound {
            filter: filter.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Whether the error means the card left the field.
    pub fn is_card_gone(&self) -> bool {
        matches!(self, Self::NoCard | Self::Status { .. })
    }
}

/// Errors produced by Type 2 tag NDEF extraction.
///
/// All variants are fatal to the current extraction attempt. Retrying is up
/// to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// The capability container page could not be read.
    #[error("CC read error{}", status_suffix(.status))]
    CcRead { status: Option<StatusWord> },

    /// The capability container does not start with the NDEF magic byte.
    #[error("Invalid capability container: magic {magic:02X}")]
    InvalidCc { magic: u8 },

    /// The page holding the NDEF TLV could not be read.
    #[error("NDEF TLV read error{}", status_suffix(.status))]
    TlvRead { status: Option<StatusWord> },

    /// The first TLV is not an NDEF Message TLV.
    #[error("Invalid NDEF tag: {tag:02X}")]
    InvalidNdefTag { tag: u8 },

    /// A data page could not be read.
    #[error("Page {page} read error{}", status_suffix(.status))]
    PageRead {
        page: u16,
        status: Option<StatusWord>,
    },
}

impl ExtractError {
    /// Raw status word reported by the transport, if any.
    pub fn status(&self) -> Option<StatusWord> {
        match self {
            Self::CcRead { status } | Self::TlvRead { status } | Self::PageRead { status, .. } => {
                *status
            }
            Self::InvalidCc { .. } | Self::InvalidNdefTag { .. } => None,
        }
    }
}

fn status_suffix(status: &Option<StatusWord>) -> String {
    status.map(|sw| format!(": {sw}")).unwrap_or_default()
}
