//! NDEF record header byte.

use tagbridge_core::constants::{
    FLAG_CHUNKED, FLAG_HAS_ID, FLAG_MESSAGE_BEGIN, FLAG_MESSAGE_END, FLAG_SHORT_RECORD, TNF_MASK,
};

/// First byte of an NDEF record: five flags and the 3-bit TNF.
///
/// Every flag is taken verbatim from the byte; no combination is rejected.
///
/// # Examples
///
/// ```
/// use tagbridge_ndef::RecordHeader;
///
/// let header = RecordHeader::from_byte(0xD1);
/// assert!(header.message_begin());
/// assert!(header.message_end());
/// assert!(header.short_record());
/// assert!(!header.has_id());
/// assert_eq!(header.tnf(), 0x01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHeader(u8);

impl RecordHeader {
    /// Wrap a raw header byte.
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// The raw header byte.
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// MB: first record of the message.
    pub const fn message_begin(self) -> bool {
        self.0 & FLAG_MESSAGE_BEGIN != 0
    }

    /// ME: last record of the message.
    pub const fn message_end(self) -> bool {
        self.0 & FLAG_MESSAGE_END != 0
    }

    /// CF: record is a chunk of a larger payload.
    pub const fn chunked(self) -> bool {
        self.0 & FLAG_CHUNKED != 0
    }

    /// SR: payload length is encoded in one byte.
    pub const fn short_record(self) -> bool {
        self.0 & FLAG_SHORT_RECORD != 0
    }

    /// IL: an ID length byte and ID field are present.
    pub const fn has_id(self) -> bool {
        self.0 & FLAG_HAS_ID != 0
    }

    /// Type Name Format code (0-7).
    pub const fn tnf(self) -> u8 {
        self.0 & TNF_MASK
    }
}

impl From<u8> for RecordHeader {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}
