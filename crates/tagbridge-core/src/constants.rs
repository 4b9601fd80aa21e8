//! Core constants for NFC Forum Type 2 tags and the NDEF binary format.
//!
//! This module collects every protocol-level constant used throughout the
//! tagbridge workspace: the Type 2 tag memory map, the TLV tags found in the
//! tag data area, the bit layout of an NDEF record header, the PC/SC pseudo
//! APDUs used to talk to contactless readers and the defaults of the
//! publishing service.
//!
//! # Type 2 Tag Memory Map
//!
//! A Type 2 tag (NTAG21x, Mifare Ultralight) is addressed in 4-byte pages:
//!
//! ```text
//! page 0..=1  UID
//! page 2      UID check byte, internal, lock bytes
//! page 3      Capability Container (E1 10 <size/8> <access>)
//! page 4..    data area: TLV blocks, starting with the NDEF Message TLV
//! ```
//!
//! The NDEF Message TLV is laid out as:
//!
//! ```text
//! short form:  03 <len:u8> <message...>             (len < 0xFF)
//! long form:   03 FF <len_hi> <len_lo> <message...>
//! ```
//!
//! # NDEF Record Header
//!
//! | Bit | Mask | Flag |
//! |-----|------|------|
//! | 7 | `0x80` | MB (message begin) |
//! | 6 | `0x40` | ME (message end) |
//! | 5 | `0x20` | CF (chunk flag) |
//! | 4 | `0x10` | SR (short record) |
//! | 3 | `0x08` | IL (ID length present) |
//! | 2..0 | `0x07` | TNF (type name format) |
//!
//! # Usage
//!
//! ```
//! use tagbridge_core::constants::*;
//!
//! let header = 0xD1u8;
//! assert_ne!(header & FLAG_MESSAGE_BEGIN, 0);
//! assert_ne!(header & FLAG_SHORT_RECORD, 0);
//! assert_eq!(header & TNF_MASK, 0x01);
//! ```
//!
//! # Length Encodings
//!
//! The TLV long-form length in tag memory is a 16-bit big-endian value, while
//! the payload length of a non-short NDEF record is a 32-bit big-endian value.
//! The two live in different layers and must never be mixed up.

// ============================================================================
// Type 2 Tag Memory Map
// ============================================================================

/// Size of a Type 2 tag page in bytes.
///
/// Every read primitive returns exactly one page.
pub const PAGE_SIZE: usize = 4;

/// Page holding the Capability Container.
pub const CC_PAGE: u16 = 3;

/// First page of the data area, where the NDEF Message TLV starts.
pub const NDEF_TLV_PAGE: u16 = 4;

/// First page of NDEF message data when the TLV uses the short length form.
///
/// Two message bytes are already carried by [`NDEF_TLV_PAGE`].
pub const SHORT_FORM_DATA_PAGE: u16 = 5;

/// First page of NDEF message data when the TLV uses the long length form.
pub const LONG_FORM_DATA_PAGE: u16 = 6;

/// Capability Container magic number marking an NDEF-formatted tag.
pub const CC_MAGIC: u8 = 0xE1;

/// Capability Container mapping version 1.0.
pub const CC_VERSION_1_0: u8 = 0x10;

// ============================================================================
// TLV Blocks
// ============================================================================

/// TLV tag of the NDEF Message block.
pub const NDEF_TLV_TAG: u8 = 0x03;

/// TLV tag of the Terminator block.
pub const TERMINATOR_TLV_TAG: u8 = 0xFE;

/// Length byte announcing a 16-bit big-endian length in the next two bytes.
///
/// # Examples
///
/// ```
/// use tagbridge_core::constants::TLV_LONG_FORM_MARKER;
///
/// let tlv = [0x03, TLV_LONG_FORM_MARKER, 0x01, 0x2C];
/// let len = u16::from_be_bytes([tlv[2], tlv[3]]);
/// assert_eq!(len, 300);
/// ```
pub const TLV_LONG_FORM_MARKER: u8 = 0xFF;

// ============================================================================
// NDEF Record Header
// ============================================================================

/// Message Begin flag.
pub const FLAG_MESSAGE_BEGIN: u8 = 0x80;

/// Message End flag. Decoding stops after the record carrying it.
pub const FLAG_MESSAGE_END: u8 = 0x40;

/// Chunk flag.
pub const FLAG_CHUNKED: u8 = 0x20;

/// Short Record flag: payload length is one byte instead of four.
pub const FLAG_SHORT_RECORD: u8 = 0x10;

/// ID Length flag: an ID length byte and an ID field are present.
pub const FLAG_HAS_ID: u8 = 0x08;

/// Mask selecting the 3-bit Type Name Format.
pub const TNF_MASK: u8 = 0x07;

/// Smallest possible NDEF record: header, type length and short payload length.
pub const MIN_RECORD_SIZE: usize = 3;

// ============================================================================
// Well-known Record Types
// ============================================================================

/// Record type of the NFC Forum URI record (`"U"`).
pub const URI_RECORD_TYPE: &[u8] = b"U";

/// Record type of an Android Application Record.
pub const ANDROID_APP_RECORD_TYPE: &str = "android.com:pkg";

// ============================================================================
// PC/SC Pseudo APDUs
// ============================================================================

/// Class byte of reader-level pseudo APDUs (ACR122U and compatibles).
pub const APDU_CLA_PSEUDO: u8 = 0xFF;

/// READ BINARY instruction, reads one Type 2 page.
pub const INS_READ_BINARY: u8 = 0xB0;

/// GET DATA instruction, used with P1=0 to read the card UID.
pub const INS_GET_DATA: u8 = 0xCA;

/// Status word byte 1 on success.
pub const SW1_SUCCESS: u8 = 0x90;

/// Status word byte 2 on success.
pub const SW2_SUCCESS: u8 = 0x00;

// ============================================================================
// Tag Identification
// ============================================================================

/// Path segment introducing the tag identifier in Home Assistant tag URLs.
///
/// # Examples
///
/// ```
/// use tagbridge_core::constants::TAG_PATH_SEGMENT;
///
/// let uri = "https://www.home-assistant.io/tag/5f0ba733";
/// let id = uri.rsplit_once(TAG_PATH_SEGMENT).map(|(_, id)| id);
/// assert_eq!(id, Some("5f0ba733"));
/// ```
pub const TAG_PATH_SEGMENT: &str = "/tag/";

/// Maximum length of a tag identifier in characters.
pub const MAX_TAG_ID_LENGTH: usize = 256;

// ============================================================================
// Service Defaults
// ============================================================================

/// Default MQTT topic prefix for Home Assistant discovery.
pub const DEFAULT_TOPIC_PREFIX: &str = "homeassistant/sensor/nfc_reader";

/// Default MQTT client identifier.
pub const DEFAULT_CLIENT_ID: &str = "nfc_tag_reader";

/// Interval between card presence checks (milliseconds).
pub const DEFAULT_PRESENCE_POLL_MS: u64 = 500;

/// Delay before retrying a failed reader connection (milliseconds).
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;

/// Default MQTT broker port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// MQTT keep-alive interval (seconds).
pub const MQTT_KEEP_ALIVE_SECS: u64 = 60;
