//! URI record payload decoding.
//!
//! The first byte of a URI record payload is an identifier code selecting an
//! abbreviated prefix from the NFC Forum URI Record Type Definition; the rest
//! of the payload is the URI suffix in UTF-8.
//!
//! ```text
//! 04 65 78 61 6D 70 6C 65 2E 63 6F 6D
//! ^^ "https://"
//!    ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ "example.com"
//! ```

/// URI identifier code prefixes (0x00-0x23).
pub static URI_PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

/// Look up the prefix for a URI identifier code.
pub fn uri_prefix(code: u8) -> Option<&'static str> {
    URI_PREFIXES.get(usize::from(code)).copied()
}

/// Expand a URI record payload into the full URI.
///
/// An empty payload yields an empty string. Identifier codes outside the
/// table render as `[Unknown prefix XX]`, and the suffix is appended in both
/// cases. Invalid UTF-8 in the suffix is replaced, never rejected.
///
/// # Examples
///
/// ```
/// use tagbridge_ndef::decode_uri_payload;
///
/// assert_eq!(decode_uri_payload(b"\x04example.com"), "https://example.com");
/// assert_eq!(decode_uri_payload(b"\x01example.com"), "http://www.example.com");
/// assert_eq!(decode_uri_payload(b""), "");
/// assert_eq!(decode_uri_payload(b"\x42abc"), "[Unknown prefix 42]abc");
/// ```
pub fn decode_uri_payload(payload: &[u8]) -> String {
    let Some((&code, suffix)) = payload.split_first() else {
        return String::new();
    };

    let suffix = String::from_utf8_lossy(suffix);
    match uri_prefix(code) {
        Some(prefix) => format!("{prefix}{suffix}"),
        None => format!("[Unknown prefix {code:02X}]{suffix}"),
    }
}
