//! PC/SC pseudo-APDUs used to talk to contactless cards.
//!
//! Contactless readers expose tag memory through the `FF` pseudo class:
//!
//! | Command     | Bytes                     | Response              |
//! |-------------|---------------------------|-----------------------|
//! | READ BINARY | `FF B0 <p_hi> <p_lo> 04`  | 4 data bytes + SW     |
//! | GET UID     | `FF CA 00 00 00`          | UID bytes + SW        |

use crate::types::StatusWord;
use tagbridge_core::constants::{APDU_CLA_PSEUDO, INS_GET_DATA, INS_READ_BINARY, PAGE_SIZE};

/// GET DATA for the card UID.
pub const GET_UID: [u8; 5] = [APDU_CLA_PSEUDO, INS_GET_DATA, 0x00, 0x00, 0x00];

/// READ BINARY for one Type 2 page.
///
/// # Examples
///
/// ```
/// use tagbridge_hardware::apdu::read_binary;
///
/// assert_eq!(read_binary(3), [0xFF, 0xB0, 0x00, 0x03, 0x04]);
/// assert_eq!(read_binary(0x0104), [0xFF, 0xB0, 0x01, 0x04, 0x04]);
/// ```
pub const fn read_binary(page: u16) -> [u8; 5] {
    let [hi, lo] = page.to_be_bytes();
    [APDU_CLA_PSEUDO, INS_READ_BINARY, hi, lo, PAGE_SIZE as u8]
}

/// Split a response into its data and trailing status word.
///
/// Returns `None` when the response is too short to carry a status word.
pub fn split_response(response: &[u8]) -> Option<(&[u8], StatusWord)> {
    let (data, trailer) = response.split_last_chunk::<2>()?;
    Some((data, StatusWord::new(trailer[0], trailer[1])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_uid_bytes() {
        assert_eq!(GET_UID, [0xFF, 0xCA, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_read_binary_page_addressing() {
        assert_eq!(read_binary(0), [0xFF, 0xB0, 0x00, 0x00, 0x04]);
        assert_eq!(read_binary(6), [0xFF, 0xB0, 0x00, 0x06, 0x04]);
        assert_eq!(read_binary(u16::MAX), [0xFF, 0xB0, 0xFF, 0xFF, 0x04]);
    }

    #[test]
    fn test_split_response() {
        let (data, sw) = split_response(&[0x01, 0x02, 0x90, 0x00]).unwrap();
        assert_eq!(data, &[0x01, 0x02]);
        assert!(sw.is_success());

        let (data, sw) = split_response(&[0x6A, 0x82]).unwrap();
        assert!(data.is_empty());
        assert_eq!(sw, StatusWord::NOT_FOUND);

        assert!(split_response(&[0x90]).is_none());
    }
}
