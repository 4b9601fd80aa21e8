//! Type Name Format classification.

use std::borrow::Cow;
use std::fmt;

/// Human-readable TNF names, indexed by TNF code.
static TNF_NAMES: [&str; 8] = [
    "Empty",
    "NFC Forum well-known type",
    "Media type (RFC 2046)",
    "Absolute URI (RFC 3986)",
    "NFC Forum external type",
    "Unknown",
    "Unchanged",
    "Reserved",
];

/// Type Name Format: how the record type field should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tnf {
    /// No type, no payload.
    Empty = 0x00,

    /// NFC Forum well-known type (`U`, `T`, `Sp`, ...).
    WellKnown = 0x01,

    /// MIME media type (RFC 2046).
    Media = 0x02,

    /// Absolute URI (RFC 3986).
    AbsoluteUri = 0x03,

    /// NFC Forum external type (`android.com:pkg`, ...).
    External = 0x04,

    /// Unknown payload type.
    Unknown = 0x05,

    /// Middle or terminating chunk of a chunked payload.
    Unchanged = 0x06,

    /// Reserved by the NFC Forum.
    Reserved = 0x07,
}

impl Tnf {
    /// Classify a TNF code. Returns `None` for codes above 7.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Empty),
            0x01 => Some(Self::WellKnown),
            0x02 => Some(Self::Media),
            0x03 => Some(Self::AbsoluteUri),
            0x04 => Some(Self::External),
            0x05 => Some(Self::Unknown),
            0x06 => Some(Self::Unchanged),
            0x07 => Some(Self::Reserved),
            _ => None,
        }
    }

    /// The TNF code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        TNF_NAMES[self as usize]
    }
}

impl fmt::Display for Tnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Human-readable name for any TNF code.
///
/// Codes outside the 8-entry table render as `"Unknown (n)"`.
///
/// # Examples
///
/// ```
/// use tagbridge_ndef::tnf_name;
///
/// assert_eq!(tnf_name(1), "NFC Forum well-known type");
/// assert_eq!(tnf_name(9), "Unknown (9)");
/// ```
pub fn tnf_name(code: u8) -> Cow<'static, str> {
    match Tnf::from_code(code) {
        Some(tnf) => Cow::Borrowed(tnf.name()),
        None => Cow::Owned(format!("Unknown ({code})")),
    }
}
