//! Common types shared across page reader implementations.

use serde::{Deserialize, Serialize};
use std::fmt;
use tagbridge_core::constants::{PAGE_SIZE, SW1_SUCCESS, SW2_SUCCESS};

/// ISO 7816 status word (SW1 SW2) trailing every APDU response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusWord {
    pub sw1: u8,
    pub sw2: u8,
}

impl StatusWord {
    /// `90 00`: command completed.
    pub const SUCCESS: StatusWord = StatusWord::new(SW1_SUCCESS, SW2_SUCCESS);

    /// `63 00`: no information given, operation failed.
    pub const OPERATION_FAILED: StatusWord = StatusWord::new(0x63, 0x00);

    /// `6A 82`: file or application not found.
    pub const NOT_FOUND: StatusWord = StatusWord::new(0x6A, 0x82);

    /// `6D 00`: instruction not supported.
    pub const INS_NOT_SUPPORTED: StatusWord = StatusWord::new(0x6D, 0x00);

    /// `6F 00`: no precise diagnosis.
    pub const UNKNOWN_ERROR: StatusWord = StatusWord::new(0x6F, 0x00);

    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    pub const fn is_success(&self) -> bool {
        self.sw1 == SW1_SUCCESS && self.sw2 == SW2_SUCCESS
    }

    pub const fn to_bytes(self) -> [u8; 2] {
        [self.sw1, self.sw2]
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}", self.sw1, self.sw2)
    }
}

/// Outcome of a single page read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// The page was read.
    Ok,

    /// The read failed, with the status word if the transport reported one.
    Failed(Option<StatusWord>),
}

/// Result of reading one 4-byte page: the data and its status.
///
/// Failed reads still carry four bytes (zeros) so every transport returns
/// the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRead {
    pub data: [u8; PAGE_SIZE],
    pub status: ReadStatus,
}

impl PageRead {
    /// A successful read.
    pub const fn ok(data: [u8; PAGE_SIZE]) -> Self {
        Self {
            data,
            status: ReadStatus::Ok,
        }
    }

    /// A failed read.
    pub const fn failed(status: Option<StatusWord>) -> Self {
        Self {
            data: [0; PAGE_SIZE],
            status: ReadStatus::Failed(status),
        }
    }

    /// Interpret a raw READ BINARY response (data followed by SW1 SW2).
    ///
    /// The read succeeds only with status `90 00` and at least four data
    /// bytes; extra data bytes are ignored. A short response fails without a
    /// status word, since the one it carried reported success.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagbridge_hardware::types::{PageRead, StatusWord};
    ///
    /// let read = PageRead::from_response(&[0xE1, 0x10, 0x12, 0x00, 0x90, 0x00]);
    /// assert_eq!(read.into_result(), Ok([0xE1, 0x10, 0x12, 0x00]));
    ///
    /// let read = PageRead::from_response(&[0x6A, 0x82]);
    /// assert_eq!(read.into_result(), Err(Some(StatusWord::NOT_FOUND)));
    /// ```
    pub fn from_response(response: &[u8]) -> Self {
        let Some((data, status)) = crate::apdu::split_response(response) else {
            return Self::failed(None);
        };
        if !status.is_success() {
            return Self::failed(Some(status));
        }
        match data.first_chunk::<PAGE_SIZE>() {
            Some(page) => Self::ok(*page),
            None => Self::failed(None),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReadStatus::Ok
    }

    /// Page data on success, the reported status word on failure.
    pub fn into_result(self) -> Result<[u8; PAGE_SIZE], Option<StatusWord>> {
        match self.status {
            ReadStatus::Ok => Ok(self.data),
            ReadStatus::Failed(status) => Err(status),
        }
    }
}

impl From<([u8; PAGE_SIZE], bool)> for PageRead {
    fn from((data, ok): ([u8; PAGE_SIZE], bool)) -> Self {
        if ok {
            Self::ok(data)
        } else {
            Self::failed(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_status_word_display() {
        assert_eq!(StatusWord::SUCCESS.to_string(), "9000");
        assert_eq!(StatusWord::new(0x6a, 0x82).to_string(), "6A82");
    }

    #[test]
    fn test_status_word_success() {
        assert!(StatusWord::SUCCESS.is_success());
        assert!(!StatusWord::new(0x90, 0x01).is_success());
        assert!(!StatusWord::new(0x91, 0x00).is_success());
    }

    #[test]
    fn test_status_word_serde() {
        let json = serde_json::to_string(&StatusWord::NOT_FOUND).unwrap();
        assert_eq!(json, r#"{"sw1":106,"sw2":130}"#);
        let back: StatusWord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StatusWord::NOT_FOUND);
    }

    #[rstest]
    #[case(&[0x03, 0x05, 0xD1, 0x01, 0x90, 0x00], Ok([0x03, 0x05, 0xD1, 0x01]))]
    #[case(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x90, 0x00], Ok([0x01, 0x02, 0x03, 0x04]))]
    #[case(&[0x01, 0x02, 0x03, 0x90, 0x00], Err(None))]
    #[case(&[0x90, 0x00], Err(None))]
    #[case(&[0x00, 0x00, 0x00, 0x00, 0x63, 0x00], Err(Some(StatusWord::OPERATION_FAILED)))]
    #[case(&[0x6D, 0x00], Err(Some(StatusWord::INS_NOT_SUPPORTED)))]
    #[case(&[0x90], Err(None))]
    #[case(&[], Err(None))]
    fn test_page_read_from_response(
        #[case] response: &[u8],
        #[case] expected: std::result::Result<[u8; 4], Option<StatusWord>>,
    ) {
        assert_eq!(PageRead::from_response(response).into_result(), expected);
    }

    #[test]
    fn test_page_read_from_tuple() {
        assert!(PageRead::from(([1, 2, 3, 4], true)).is_ok());

        let failed = PageRead::from(([1, 2, 3, 4], false));
        assert!(!failed.is_ok());
        assert_eq!(failed, PageRead::failed(None));
        assert_eq!(failed.data, [0; 4]);
    }

    #[test]
    fn test_short_success_response_reports_no_status() {
        let read = PageRead::from_response(&[0xE1, 0x10, 0x90, 0x00]);
        assert_eq!(read, PageRead::failed(None));
        assert_ne!(read.status, ReadStatus::Failed(Some(StatusWord::SUCCESS)));
    }
}
