//! Decoded NDEF record.

use crate::header::RecordHeader;
use crate::tnf::{Tnf, tnf_name};
use crate::uri::decode_uri_payload;
use bytes::Bytes;
use std::borrow::Cow;
use tagbridge_core::constants::{ANDROID_APP_RECORD_TYPE, URI_RECORD_TYPE};

/// A single decoded NDEF record.
///
/// Records are immutable and only produced by the decoder, so the payload
/// always has exactly the length declared in the record header. The type, id
/// and payload share the buffer the message was decoded from.
///
/// Interpretation helpers (`is_uri_record`, `decoded_uri`, ...) are computed
/// on every call and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdefRecord {
    header: RecordHeader,
    record_type: Bytes,
    record_id: Bytes,
    payload: Bytes,
}

impl NdefRecord {
    pub(crate) fn new(
        header: RecordHeader,
        record_type: Bytes,
        record_id: Bytes,
        payload: Bytes,
    ) -> Self {
        NdefRecord {
            header,
            record_type,
            record_id,
            payload,
        }
    }

    /// The header byte this record was decoded from.
    pub fn header(&self) -> RecordHeader {
        self.header
    }

    /// Type Name Format code (0-7).
    pub fn tnf(&self) -> u8 {
        self.header.tnf()
    }

    /// Type Name Format classification.
    pub fn tnf_kind(&self) -> Option<Tnf> {
        Tnf::from_code(self.tnf())
    }

    /// Human-readable Type Name Format.
    pub fn tnf_name(&self) -> Cow<'static, str> {
        tnf_name(self.tnf())
    }

    /// Raw record type bytes.
    pub fn record_type(&self) -> &[u8] {
        &self.record_type
    }

    /// Raw record id bytes. Empty unless [`has_id`](Self::has_id) is set.
    pub fn record_id(&self) -> &[u8] {
        &self.record_id
    }

    /// Raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as a shared buffer, without copying.
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    pub fn message_begin(&self) -> bool {
        self.header.message_begin()
    }

    pub fn last_record(&self) -> bool {
        self.header.message_end()
    }

    pub fn chunked(&self) -> bool {
        self.header.chunked()
    }

    pub fn short_record(&self) -> bool {
        self.header.short_record()
    }

    pub fn has_id(&self) -> bool {
        self.header.has_id()
    }

    /// Record type as lossy UTF-8.
    pub fn type_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.record_type)
    }

    /// Record id as lossy UTF-8.
    pub fn id_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.record_id)
    }

    /// Payload as lossy UTF-8.
    ///
    /// Binary payloads are converted too; undecodable sequences become
    /// U+FFFD.
    pub fn payload_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Whether this is an NFC Forum URI record (type `"U"`).
    pub fn is_uri_record(&self) -> bool {
        self.record_type.as_ref() == URI_RECORD_TYPE
    }

    /// Whether this is an Android Application Record (type `"android.com:pkg"`).
    pub fn is_android_app_record(&self) -> bool {
        self.type_str() == ANDROID_APP_RECORD_TYPE
    }

    /// The expanded URI, if this is a URI record.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagbridge_ndef::decode_records;
    ///
    /// let mut data = vec![0xD1, 0x01, 0x1A, b'U', 0x04];
    /// data.extend_from_slice(b"home-assistant.io/tag/abc");
    ///
    /// let records = decode_records(&data);
    /// assert_eq!(
    ///     records[0].decoded_uri().as_deref(),
    ///     Some("https://home-assistant.io/tag/abc")
    /// );
    /// ```
    pub fn decoded_uri(&self) -> Option<String> {
        self.is_uri_record()
            .then(|| decode_uri_payload(&self.payload))
    }

    /// The Android package name, if this is an Android Application Record.
    pub fn android_package_name(&self) -> Option<String> {
        self.is_android_app_record()
            .then(|| self.payload_str().into_owned())
    }
}
