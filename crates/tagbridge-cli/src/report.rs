//! Human- and machine-readable description of a presented tag.

use crate::identify::{TagIdentity, identify};
use serde::Serialize;
use tagbridge_core::to_hex;
use tagbridge_hardware::{TagSession, extract_ndef};
use tagbridge_ndef::{NdefMessage, NdefRecord, decode_message};
use tracing::{info, warn};

/// Tag type label; only Type 2 tags are read.
pub const TAG_TYPE: &str = "Type 2 (assumed)";

/// Summary of one decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    pub tnf: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub payload_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_package: Option<String>,
}

impl From<&NdefRecord> for RecordSummary {
    fn from(record: &NdefRecord) -> Self {
        Self {
            tnf: record.tnf_name().into_owned(),
            record_type: record.type_str().into_owned(),
            id: record.has_id().then(|| record.id_str().into_owned()),
            payload_length: record.payload().len(),
            uri: record.decoded_uri(),
            android_package: record.android_package_name(),
        }
    }
}

/// Everything read from a tag in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagReport {
    #[serde(rename = "type")]
    pub tag_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndef_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndef_data_hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndef_error: Option<String>,
    pub records: Vec<RecordSummary>,
    #[serde(flatten)]
    pub identity: TagIdentity,
}

impl TagReport {
    /// Read and decode the tag behind `session`.
    ///
    /// Failures are recorded in the report rather than returned, so a tag
    /// that cannot be read is still reported (without an identifier).
    pub fn read<S: TagSession + ?Sized>(session: &mut S) -> Self {
        let atr = match session.atr() {
            Ok(atr) => Some(atr),
            Err(e) => {
                warn!(error = %e, "Could not read ATR");
                None
            }
        };

        match extract_ndef(session) {
            Ok(ndef) => Self::from_ndef(atr.as_deref(), &ndef),
            Err(e) => Self {
                ndef_error: Some(e.to_string()),
                ..Self::empty(atr.as_deref())
            },
        }
    }

    /// Build a report from an already extracted NDEF message.
    pub fn from_ndef(atr: Option<&[u8]>, ndef: &[u8]) -> Self {
        let message: NdefMessage = decode_message(ndef.to_vec());
        Self {
            ndef_length: Some(ndef.len()),
            ndef_data_hex: Some(to_hex(ndef)),
            records: message.iter().map(RecordSummary::from).collect(),
            identity: identify(&message),
            ..Self::empty(atr)
        }
    }

    fn empty(atr: Option<&[u8]>) -> Self {
        Self {
            tag_type: TAG_TYPE,
            atr: atr.map(to_hex),
            ndef_length: None,
            ndef_data_hex: None,
            ndef_error: None,
            records: Vec::new(),
            identity: TagIdentity::default(),
        }
    }

    /// Log the report, one field per line.
    pub fn log(&self) {
        info!("NFC tag detected");
        info!("type: {}", self.tag_type);
        if let Some(atr) = &self.atr {
            info!("atr: {atr}");
        }
        if let Some(error) = &self.ndef_error {
            warn!("ndef_error: {error}");
        }
        if let (Some(len), Some(hex)) = (self.ndef_length, &self.ndef_data_hex) {
            info!("ndef_length: {len}");
            info!("ndef_data_hex: {hex}");
        }
        for (i, record) in self.records.iter().enumerate() {
            info!(
                index = i,
                tnf = %record.tnf,
                record_type = %record.record_type,
                payload_length = record.payload_length,
                "record"
            );
            if let Some(uri) = &record.uri {
                info!(index = i, "uri: {uri}");
            }
            if let Some(package) = &record.android_package {
                info!(index = i, "android package: {package}");
            }
        }
        match &self.identity.tag_id {
            Some(id) => info!(tag_id = %id, "Tag identified"),
            None => info!("No tag identifier found"),
        }
    }
}
