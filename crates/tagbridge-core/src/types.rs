use crate::{
    Result,
    constants::{MAX_TAG_ID_LENGTH, TAG_PATH_SEGMENT},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier forwarded to the home-automation bus when a tag is presented.
///
/// The identifier is trimmed on construction and must be non-empty, at most
/// [`MAX_TAG_ID_LENGTH`] characters and free of control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagId(String);

impl TagId {
    /// Create a new tag identifier with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidTagId` if the identifier is empty, too long or
    /// contains control characters.
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim();

        if id.is_empty() {
            return Err(Error::InvalidTagId("tag id cannot be empty".to_string()));
        }

        let len = id.chars().count();
        if len > MAX_TAG_ID_LENGTH {
            return Err(Error::InvalidTagId(format!(
                "tag id must be at most {MAX_TAG_ID_LENGTH} chars, got {len}"
            )));
        }

        if id.chars().any(char::is_control) {
            return Err(Error::InvalidTagId(
                "tag id must not contain control characters".to_string(),
            ));
        }

        Ok(TagId(id.to_string()))
    }

    /// Derive a tag identifier from a URI.
    ///
    /// Home Assistant tag URLs (`https://www.home-assistant.io/tag/<id>`)
    /// yield the segment after the last `/tag/`; any other URI is used as a
    /// whole. Returns `None` when nothing usable remains.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagbridge_core::TagId;
    ///
    /// let id = TagId::from_uri("https://home-assistant.io/tag/abc").unwrap();
    /// assert_eq!(id.as_str(), "abc");
    ///
    /// let id = TagId::from_uri("https://example.com/door").unwrap();
    /// assert_eq!(id.as_str(), "https://example.com/door");
    ///
    /// assert!(TagId::from_uri("https://home-assistant.io/tag/").is_none());
    /// ```
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        let candidate = match uri.rsplit_once(TAG_PATH_SEGMENT) {
            Some((_, id)) => id,
            None => uri,
        };
        TagId::new(candidate).ok()
    }

    /// Get the tag identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TagId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TagId::new(s)
    }
}

impl TryFrom<String> for TagId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        TagId::new(&value)
    }
}

impl From<TagId> for String {
    fn from(id: TagId) -> Self {
        id.0
    }
}

/// Format bytes as contiguous uppercase hex (`D1015541`).
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Parse hex text into bytes.
///
/// Whitespace and `:` separators are ignored, so both `d1 01 55` and
/// `D1:01:55` are accepted.
///
/// # Errors
/// Returns `Error::InvalidHex` if the text has an odd number of digits or a
/// non-hex character.
pub fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&cleaned).map_err(|e| Error::InvalidHex(format!("'{input}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abc", "abc")]
    #[case("  5f0ba733-e3c1  ", "5f0ba733-e3c1")]
    #[case("library://artist/172", "library://artist/172")]
    fn test_tag_id_valid(#[case] input: &str, #[case] expected: &str) {
        let id: TagId = input.parse().unwrap();
        assert_eq!(id.as_str(), expected);
    }

    #[rstest]
    #[case("")] // empty
    #[case("   ")] // whitespace only
    #[case("ab\u{0}cd")] // control character
    fn test_tag_id_invalid(#[case] input: &str) {
        let result: Result<TagId> = input.parse();
        assert!(matches!(result, Err(Error::InvalidTagId(_))));
    }

    #[test]
    fn test_tag_id_too_long() {
        let long = "x".repeat(MAX_TAG_ID_LENGTH + 1);
        assert!(TagId::new(&long).is_err());
        assert!(TagId::new(&long[..MAX_TAG_ID_LENGTH]).is_ok());
    }

    #[rstest]
    #[case("https://home-assistant.io/tag/abc", Some("abc"))]
    #[case(
        "https://www.home-assistant.io/tag/library://artist/172",
        Some("library://artist/172")
    )]
    #[case("https://a/tag/first/tag/second", Some("second"))]
    #[case("tel:+15551234", Some("tel:+15551234"))]
    #[case("https://home-assistant.io/tag/", None)]
    #[case("", None)]
    fn test_tag_id_from_uri(#[case] uri: &str, #[case] expected: Option<&str>) {
        let id = TagId::from_uri(uri);
        assert_eq!(id.as_ref().map(TagId::as_str), expected);
    }

    #[test]
    fn test_tag_id_serde_roundtrip() {
        let id = TagId::new("abc").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc\"");

        let back: TagId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<TagId>("\"\"").is_err());
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(to_hex(&[0xD1, 0x01, 0x55, 0x0A]), "D101550A");
        assert_eq!(parse_hex("d1 01:55 0a").unwrap(), vec![0xD1, 0x01, 0x55, 0x0A]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
        assert!(matches!(parse_hex("abc"), Err(Error::InvalidHex(_))));
        assert!(matches!(parse_hex("zz"), Err(Error::InvalidHex(_))));
    }
}
