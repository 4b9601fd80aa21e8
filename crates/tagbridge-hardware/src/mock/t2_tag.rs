//! Mock NFC Forum Type 2 tag for testing and development.
//!
//! The tag keeps a page image laid out the way an NTAG-style tag stores an
//! NDEF message, answers PC/SC pseudo-APDUs against it and can be made to
//! fail individual pages or leave the field.

use crate::{
    HardwareError, Result,
    apdu::{self, split_response},
    traits::{PageReader, TagSession},
    types::{PageRead, StatusWord},
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tagbridge_core::constants::{
    APDU_CLA_PSEUDO, CC_MAGIC, CC_PAGE, CC_VERSION_1_0, INS_GET_DATA, INS_READ_BINARY,
    LONG_FORM_DATA_PAGE, NDEF_TLV_PAGE, NDEF_TLV_TAG, PAGE_SIZE, TERMINATOR_TLV_TAG,
    TLV_LONG_FORM_MARKER,
};

/// UID stored in pages 0 and 1.
pub const MOCK_UID: [u8; 8] = [0x04, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE];

/// Capability container: NDEF capable, mapping version 1.0, 144-byte data area.
pub const MOCK_CC: [u8; PAGE_SIZE] = [CC_MAGIC, CC_VERSION_1_0, 0x12, 0x00];

/// ATR reported for the tag (PC/SC part 3 storage card, NFC Type 2).
pub const MOCK_ATR: [u8; 20] = [
    0x3B, 0x8F, 0x80, 0x01, 0x80, 0x4F, 0x0C, 0xA0, 0x00, 0x00, 0x03, 0x06, 0x03, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x68,
];

/// Simulated Type 2 tag.
///
/// # Examples
///
/// ```
/// use tagbridge_hardware::extract_ndef;
/// use tagbridge_hardware::mock::MockT2Tag;
///
/// let ndef = [0xD1, 0x01, 0x01, 0x55, 0x41];
/// let mut tag = MockT2Tag::new(&ndef).unwrap();
///
/// assert_eq!(extract_ndef(&mut tag).unwrap(), ndef);
/// assert_eq!(tag.reads(), &[3, 4, 5]);
/// ```
#[derive(Debug, Clone)]
pub struct MockT2Tag {
    /// Page image; pages not in the map read as zeros
    pages: BTreeMap<u16, [u8; PAGE_SIZE]>,

    /// Pages whose reads fail with `63 00`
    failing: BTreeSet<u16>,

    /// Pages requested so far, in order
    reads: Vec<u16>,

    /// Shared with [`MockPresence`] handles
    present: Arc<AtomicBool>,
}

impl MockT2Tag {
    /// Create a tag holding `ndef` as its NDEF message.
    ///
    /// Messages shorter than 255 bytes use the short TLV form. Longer ones
    /// use the long form with a 16-bit length; their data starts at page 6
    /// and page 5 is left zeroed. A terminator TLV follows the message.
    /// An empty message produces a tag with only a terminator TLV at page 4.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InvalidData` if the message does not fit the
    /// 16-bit TLV length.
    pub fn new(ndef: &[u8]) -> Result<Self> {
        let mut pages = Self::header_pages();

        if ndef.is_empty() {
            pages.insert(NDEF_TLV_PAGE, [TERMINATOR_TLV_TAG, 0x00, 0x00, 0x00]);
            return Ok(Self::from_image(pages));
        }

        let (first_page, tlv) = if ndef.len() < usize::from(TLV_LONG_FORM_MARKER) {
            let mut tlv = vec![NDEF_TLV_TAG, ndef.len() as u8];
            tlv.extend_from_slice(ndef);
            (NDEF_TLV_PAGE, tlv)
        } else {
            let length = u16::try_from(ndef.len()).map_err(|_| {
                HardwareError::invalid_data(format!(
                    "NDEF message of {} bytes exceeds the 16-bit TLV length",
                    ndef.len()
                ))
            })?;
            let [hi, lo] = length.to_be_bytes();
            pages.insert(NDEF_TLV_PAGE, [NDEF_TLV_TAG, TLV_LONG_FORM_MARKER, hi, lo]);
            (LONG_FORM_DATA_PAGE, ndef.to_vec())
        };

        let mut body = tlv;
        body.push(TERMINATOR_TLV_TAG);
        for (page, chunk) in (first_page..).zip(body.chunks(PAGE_SIZE)) {
            let mut data = [0u8; PAGE_SIZE];
            data[..chunk.len()].copy_from_slice(chunk);
            pages.insert(page, data);
        }

        Ok(Self::from_image(pages))
    }

    /// Create a tag with an explicit page image.
    ///
    /// Nothing is filled in: pages not given read as zeros, including the
    /// capability container.
    pub fn from_pages(pages: impl IntoIterator<Item = (u16, [u8; PAGE_SIZE])>) -> Self {
        Self::from_image(pages.into_iter().collect())
    }

    fn from_image(pages: BTreeMap<u16, [u8; PAGE_SIZE]>) -> Self {
        Self {
            pages,
            failing: BTreeSet::new(),
            reads: Vec::new(),
            present: Arc::new(AtomicBool::new(true)),
        }
    }

    fn header_pages() -> BTreeMap<u16, [u8; PAGE_SIZE]> {
        let mut pages = BTreeMap::new();
        pages.insert(0, [MOCK_UID[0], MOCK_UID[1], MOCK_UID[2], MOCK_UID[3]]);
        pages.insert(1, [MOCK_UID[4], MOCK_UID[5], MOCK_UID[6], MOCK_UID[7]]);
        pages.insert(2, [0x00; PAGE_SIZE]);
        pages.insert(CC_PAGE, MOCK_CC);
        pages
    }

    /// Make reads of `page` fail with status `63 00`.
    pub fn with_failing_page(mut self, page: u16) -> Self {
        self.failing.insert(page);
        self
    }

    /// Page contents as stored; undefined pages are zeros.
    pub fn page(&self, page: u16) -> [u8; PAGE_SIZE] {
        self.pages.get(&page).copied().unwrap_or_default()
    }

    /// Number of pages written to the image.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pages requested through READ BINARY, in order.
    pub fn reads(&self) -> &[u16] {
        &self.reads
    }

    pub fn is_present(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    /// Handle for moving the tag in and out of the field.
    pub fn presence(&self) -> MockPresence {
        MockPresence {
            present: Arc::clone(&self.present),
        }
    }

    /// Process one APDU and return data followed by SW1 SW2.
    ///
    /// Supports READ BINARY (`FF B0`), GET UID (`FF CA`) and SELECT
    /// (`00 A4`). Anything else answers `6D 00`; APDUs shorter than four
    /// bytes answer `6F 00`.
    pub fn execute(&mut self, command: &[u8]) -> Vec<u8> {
        let [cla, ins, p1, p2, rest @ ..] = command else {
            return StatusWord::UNKNOWN_ERROR.to_bytes().to_vec();
        };

        match (*cla, *ins) {
            (APDU_CLA_PSEUDO, INS_READ_BINARY) => {
                let page = u16::from_be_bytes([*p1, *p2]);
                let length = match rest.first() {
                    Some(&le) if le > 0 => usize::from(le),
                    _ => PAGE_SIZE,
                };
                self.reads.push(page);

                if self.failing.contains(&page) {
                    return StatusWord::OPERATION_FAILED.to_bytes().to_vec();
                }

                let mut response: Vec<u8> = self
                    .page(page)
                    .into_iter()
                    .chain(std::iter::repeat(0))
                    .take(length)
                    .collect();
                response.extend_from_slice(&StatusWord::SUCCESS.to_bytes());
                response
            }
            (APDU_CLA_PSEUDO, INS_GET_DATA) => {
                let mut response = MOCK_UID.to_vec();
                response.extend_from_slice(&StatusWord::SUCCESS.to_bytes());
                response
            }
            (0x00, 0xA4) => StatusWord::SUCCESS.to_bytes().to_vec(),
            _ => StatusWord::INS_NOT_SUPPORTED.to_bytes().to_vec(),
        }
    }
}

impl Default for MockT2Tag {
    fn default() -> Self {
        Self::from_image(Self::header_pages())
    }
}

impl PageReader for MockT2Tag {
    fn read_page(&mut self, page: u16) -> PageRead {
        if !self.is_present() {
            return PageRead::failed(None);
        }
        PageRead::from_response(&self.execute(&apdu::read_binary(page)))
    }
}

impl TagSession for MockT2Tag {
    fn atr(&self) -> Result<Vec<u8>> {
        if !self.is_present() {
            return Err(HardwareError::NoCard);
        }
        Ok(MOCK_ATR.to_vec())
    }

    fn uid(&mut self) -> Result<Vec<u8>> {
        if !self.is_present() {
            return Err(HardwareError::NoCard);
        }
        let response = self.execute(&apdu::GET_UID);
        let (data, status) = split_response(&response)
            .ok_or_else(|| HardwareError::invalid_data("Empty GET UID response"))?;
        if !status.is_success() {
            return Err(HardwareError::Status { status });
        }
        Ok(data.to_vec())
    }
}

/// Handle for simulating tag arrival and removal.
///
/// Clones share state with the tag they came from, so the handle can be
/// moved to another thread while the tag is being read.
#[derive(Debug, Clone)]
pub struct MockPresence {
    present: Arc<AtomicBool>,
}

impl MockPresence {
    /// Take the tag out of the field.
    pub fn remove(&self) {
        self.present.store(false, Ordering::SeqCst);
    }

    /// Put the tag back into the field.
    pub fn present(&self) {
        self.present.store(true, Ordering::SeqCst);
    }
}
