//! Reader trait definitions.
//!
//! [`PageReader`] is the only thing the NDEF extractor needs: read one
//! 4-byte page and say whether it worked. [`TagSession`] adds what the
//! presence monitor needs from a connected card on top of that.
//!
//! Both traits are synchronous. Transports that block (PC/SC) are driven
//! from a blocking thread by the caller.

use crate::error::Result;
use crate::types::PageRead;
use tagbridge_core::constants::PAGE_SIZE;

/// Source of Type 2 tag pages.
///
/// Any closure `FnMut(u16) -> ([u8; 4], bool)` is a page reader, which keeps
/// simple transports and tests free of boilerplate:
///
/// ```
/// use tagbridge_hardware::traits::PageReader;
///
/// let mut reader = |page: u16| ([page as u8; 4], page < 8);
/// assert!(reader.read_page(3).is_ok());
/// assert!(!reader.read_page(9).is_ok());
/// ```
pub trait PageReader {
    /// Read the 4-byte page at `page`.
    fn read_page(&mut self, page: u16) -> PageRead;
}

impl<F> PageReader for F
where
    F: FnMut(u16) -> ([u8; PAGE_SIZE], bool),
{
    fn read_page(&mut self, page: u16) -> PageRead {
        PageRead::from(self(page))
    }
}

/// A card connected to a reader.
pub trait TagSession: PageReader {
    /// Answer To Reset reported by the reader for this card.
    fn atr(&self) -> Result<Vec<u8>>;

    /// Read the card UID.
    ///
    /// Fails once the card has left the field, which makes it the presence
    /// check of the monitor loop.
    fn uid(&mut self) -> Result<Vec<u8>>;
}
