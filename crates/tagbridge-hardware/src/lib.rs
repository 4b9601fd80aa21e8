//! Tag reader abstraction and Type 2 NDEF extraction.
//!
//! This crate turns a paginated "read one 4-byte page" primitive into the raw
//! NDEF message stored on an NFC Forum Type 2 tag, and provides the readers
//! that supply those pages: a mock tag for development and testing, and PC/SC
//! readers behind the `hardware-pcsc` feature.
//!
//! # Page Readers
//!
//! Anything implementing [`PageReader`] can be fed to [`extract_ndef`],
//! including plain closures:
//!
//! ```
//! use tagbridge_hardware::extract_ndef;
//!
//! let pages = [
//!     [0x04, 0x12, 0x34, 0x56],
//!     [0x78, 0x9A, 0xBC, 0xDE],
//!     [0x00, 0x00, 0x00, 0x00],
//!     [0xE1, 0x10, 0x12, 0x00],
//!     [0x03, 0x05, 0xD1, 0x01],
//!     [0x01, 0x55, 0x41, 0xFE],
//! ];
//! let mut reader = |page: u16| match pages.get(usize::from(page)) {
//!     Some(data) => (*data, true),
//!     None => ([0; 4], false),
//! };
//!
//! assert_eq!(extract_ndef(&mut reader).unwrap(), [0xD1, 0x01, 0x01, 0x55, 0x41]);
//! ```
//!
//! # Sessions
//!
//! A connected card implements [`TagSession`]: pages plus ATR and UID, the
//! latter doubling as the presence check.
//!
//! ```
//! use tagbridge_hardware::mock::MockT2Tag;
//! use tagbridge_hardware::{TagSession, extract_ndef};
//!
//! let mut tag = MockT2Tag::new(&[0xD0, 0x00, 0x00]).unwrap();
//! let presence = tag.presence();
//!
//! assert_eq!(extract_ndef(&mut tag).unwrap(), [0xD0, 0x00, 0x00]);
//! assert!(tag.uid().is_ok());
//!
//! presence.remove();
//! assert!(tag.uid().is_err());
//! ```
//!
//! # Error Handling
//!
//! Extraction failures are [`ExtractError`] values carrying the page and the
//! raw status word when the transport reports one. Transport failures are
//! [`HardwareError`]. Nothing in this crate logs.

pub mod apdu;
pub mod error;
pub mod mock;
#[cfg(feature = "hardware-pcsc")]
pub mod pcsc;
pub mod t2;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{ExtractError, HardwareError, Result};
pub use t2::extract_ndef;
pub use traits::{PageReader, TagSession};
pub use types::{PageRead, ReadStatus, StatusWord};
