//! NDEF extraction from NFC Forum Type 2 tags.
//!
//! # Memory Map
//!
//! ```text
//! page 3   E1 vv ss aa        capability container (magic, version, size, access)
//! page 4   03 LL d0 d1        NDEF TLV, short form: data starts at byte 2
//! page 4   03 FF Lh Ll        NDEF TLV, long form: 16-bit big-endian length
//! page 5.. data               short form continues here
//! page 6.. data               long form continues here
//! ```
//!
//! The TLV long-form length is two bytes. It is unrelated to the four-byte
//! payload length of an NDEF record header.

use crate::error::ExtractError;
use crate::traits::PageReader;
use tagbridge_core::constants::{
    CC_MAGIC, CC_PAGE, LONG_FORM_DATA_PAGE, NDEF_TLV_PAGE, NDEF_TLV_TAG, PAGE_SIZE,
    SHORT_FORM_DATA_PAGE, TLV_LONG_FORM_MARKER,
};

/// Read the NDEF message stored on a Type 2 tag.
///
/// Reads the capability container and the NDEF TLV header, then sequential
/// pages until the declared message length is collected. Returns the raw
/// message bytes, ready for the NDEF decoder.
///
/// # Errors
///
/// - [`ExtractError::CcRead`] / [`ExtractError::InvalidCc`] when page 3 is
///   unreadable or lacks the `E1` magic.
/// - [`ExtractError::TlvRead`] / [`ExtractError::InvalidNdefTag`] when page 4
///   is unreadable or does not start with the `03` NDEF TLV tag.
/// - [`ExtractError::PageRead`] when any data page fails; partial data is
///   discarded.
///
/// The first failing read aborts the extraction. Nothing is retried.
///
/// # Examples
///
/// ```
/// use tagbridge_hardware::extract_ndef;
///
/// let mut tag = |page: u16| match page {
///     3 => ([0xE1, 0x10, 0x12, 0x00], true),
///     4 => ([0x03, 0x05, 0xD1, 0x01], true),
///     5 => ([0x01, 0x55, 0x41, 0x00], true),
///     _ => ([0x00; 4], false),
/// };
///
/// let ndef = extract_ndef(&mut tag).unwrap();
/// assert_eq!(ndef, [0xD1, 0x01, 0x01, 0x55, 0x41]);
/// ```
pub fn extract_ndef<R>(reader: &mut R) -> Result<Vec<u8>, ExtractError>
where
    R: PageReader + ?Sized,
{
    let cc = reader
        .read_page(CC_PAGE)
        .into_result()
        .map_err(|status| ExtractError::CcRead { status })?;
    if cc[0] != CC_MAGIC {
        return Err(ExtractError::InvalidCc { magic: cc[0] });
    }

    let tlv = reader
        .read_page(NDEF_TLV_PAGE)
        .into_result()
        .map_err(|status| ExtractError::TlvRead { status })?;
    if tlv[0] != NDEF_TLV_TAG {
        return Err(ExtractError::InvalidNdefTag { tag: tlv[0] });
    }

    let (length, mut ndef, mut page) = if tlv[1] != TLV_LONG_FORM_MARKER {
        let length = usize::from(tlv[1]);
        let seed = &tlv[2..2 + length.min(2)];
        (length, seed.to_vec(), SHORT_FORM_DATA_PAGE)
    } else {
        let length = usize::from(u16::from_be_bytes([tlv[2], tlv[3]]));
        (length, Vec::new(), LONG_FORM_DATA_PAGE)
    };

    if length == 0 {
        return Ok(Vec::new());
    }

    ndef.reserve_exact(length - ndef.len());
    while ndef.len() < length {
        let data = reader
            .read_page(page)
            .into_result()
            .map_err(|status| ExtractError::PageRead { page, status })?;

        let needed = (length - ndef.len()).min(PAGE_SIZE);
        ndef.extend_from_slice(&data[..needed]);
        page += 1;
    }

    Ok(ndef)
}
