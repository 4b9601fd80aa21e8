//! Common test utilities for NDEF integration tests.
//!
//! Provides a minimal NDEF record encoder so tests can describe records by
//! their fields and check that decoding reproduces them exactly. The encoder
//! chooses the short-record form automatically when the payload fits in one
//! byte, unless told otherwise.

#![allow(dead_code)]

/// Field-level description of an NDEF record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRecord {
    pub tnf: u8,
    pub record_type: Vec<u8>,
    pub record_id: Option<Vec<u8>>,
    pub payload: Vec<u8>,
    pub chunked: bool,
    pub force_long: bool,
}

impl TestRecord {
    pub fn new(tnf: u8, record_type: &[u8], payload: &[u8]) -> Self {
        Self {
            tnf,
            record_type: record_type.to_vec(),
            record_id: None,
            payload: payload.to_vec(),
            chunked: false,
            force_long: false,
        }
    }

    pub fn with_id(mut self, id: &[u8]) -> Self {
        self.record_id = Some(id.to_vec());
        self
    }

    pub fn long_form(mut self) -> Self {
        self.force_long = true;
        self
    }

    pub fn is_short(&self) -> bool {
        !self.force_long && self.payload.len() <= usize::from(u8::MAX)
    }

    /// Encode this record with the given MB/ME flags.
    pub fn encode(&self, message_begin: bool, message_end: bool) -> Vec<u8> {
        let mut header = self.tnf & 0x07;
        if message_begin {
            header |= 0x80;
        }
        if message_end {
            header |= 0x40;
        }
        if self.chunked {
            header |= 0x20;
        }
        if self.is_short() {
            header |= 0x10;
        }
        if self.record_id.is_some() {
            header |= 0x08;
        }

        let mut out = vec![header, self.record_type.len() as u8];
        if self.is_short() {
            out.push(self.payload.len() as u8);
        } else {
            out.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        }
        if let Some(id) = &self.record_id {
            out.push(id.len() as u8);
        }
        out.extend_from_slice(&self.record_type);
        if let Some(id) = &self.record_id {
            out.extend_from_slice(id);
        }
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Encode records as one message: MB on the first, ME on the last.
pub fn encode_message(records: &[TestRecord]) -> Vec<u8> {
    let last = records.len().saturating_sub(1);
    records
        .iter()
        .enumerate()
        .flat_map(|(i, r)| r.encode(i == 0, i == last))
        .collect()
}

/// URI record with an identifier code and suffix.
pub fn uri_record(code: u8, suffix: &str) -> TestRecord {
    let mut payload = vec![code];
    payload.extend_from_slice(suffix.as_bytes());
    TestRecord::new(0x01, b"U", &payload)
}

/// Android Application Record for a package.
pub fn aar_record(package: &str) -> TestRecord {
    TestRecord::new(0x04, b"android.com:pkg", package.as_bytes())
}

/// The message written by the Home Assistant companion app for a tag.
pub fn home_assistant_message(tag_id: &str) -> Vec<u8> {
    encode_message(&[
        uri_record(0x04, &format!("home-assistant.io/tag/{tag_id}")),
        aar_record("io.homeassistant.companion.android"),
        aar_record("io.homeassistant.companion.android.minimal"),
    ])
}
