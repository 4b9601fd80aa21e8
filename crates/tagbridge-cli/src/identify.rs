//! Tag identification.
//!
//! Decides which identifier, if any, a decoded NDEF message stands for.

use serde::Serialize;
use tagbridge_core::TagId;
use tagbridge_core::constants::TAG_PATH_SEGMENT;
use tagbridge_ndef::NdefMessage;

/// What a tag's NDEF message identifies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagIdentity {
    /// Identifier to publish
    pub tag_id: Option<TagId>,

    /// URI the identifier was taken from
    pub uri: Option<String>,

    /// Packages named by Android Application Records
    pub android_packages: Vec<String>,
}

/// Identify a tag from its decoded message.
///
/// The first URI record pointing at a `/tag/` path wins (Home Assistant tag
/// URLs); failing that, the first URI record. Messages without URI records
/// have no identifier.
pub fn identify(message: &NdefMessage) -> TagIdentity {
    let uris: Vec<String> = message.uris().collect();
    let uri = uris
        .iter()
        .find(|uri| uri.contains(TAG_PATH_SEGMENT))
        .or_else(|| uris.first())
        .cloned();

    TagIdentity {
        tag_id: uri.as_deref().and_then(TagId::from_uri),
        uri,
        android_packages: message.android_packages().collect(),
    }
}
