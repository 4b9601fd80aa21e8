//! NDEF binary decoder.
//!
//! # Record Layout
//!
//! ```text
//! +--------+-------------+----------------+-----------+------+----+---------+
//! | header | type length | payload length | id length | type | id | payload |
//! |   1    |      1      |     1 or 4     |   0 or 1  |  TL  | IL |   PL    |
//! +--------+-------------+----------------+-----------+------+----+---------+
//! ```
//!
//! - The payload length is one byte when SR is set, otherwise a 32-bit
//!   big-endian value.
//! - The id length and id are present only when IL is set.
//!
//! A message ends after the first record with ME set, or at the end of the
//! buffer. A record that would read past the end is dropped together with
//! everything after it.

use crate::error::{DecodeError, RecordField, Result};
use crate::header::RecordHeader;
use crate::message::NdefMessage;
use crate::record::NdefRecord;
use bytes::Bytes;

/// Bounds-checked cursor over the message buffer.
struct ByteReader<'a> {
    data: &'a Bytes,
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a Bytes, pos: usize) -> Self {
        Self { data, pos }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn take(&mut self, len: usize, field: RecordField) -> Result<Bytes> {
        let available = self.remaining();
        if len > available {
            return Err(DecodeError::truncated(field, self.pos, len, available));
        }
        let bytes = self.data.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(bytes)
    }

    fn read_u8(&mut self, field: RecordField) -> Result<u8> {
        let bytes = self.take(1, field)?;
        Ok(bytes[0])
    }

    fn read_u32_be(&mut self, field: RecordField) -> Result<u32> {
        let bytes = self.take(4, field)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Decode the record starting at `offset`.
///
/// Returns the record and the offset of the byte following it.
///
/// # Errors
///
/// Returns `DecodeError::OffsetOutOfBounds` if `offset` is not inside the
/// buffer, and `DecodeError::Truncated` if any field of the record would
/// read past the end of the buffer. No partial record is ever returned.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use tagbridge_ndef::{decode_record, RecordField};
///
/// let data = Bytes::from_static(&[0xD1, 0x01, 0x01, 0x55, 0x41]);
/// let (record, next) = decode_record(&data, 0).unwrap();
/// assert_eq!(record.record_type(), b"U");
/// assert_eq!(record.payload(), b"A");
/// assert_eq!(next, 5);
///
/// // Declared payload of 9 bytes, only 1 present
/// let data = Bytes::from_static(&[0xD1, 0x01, 0x09, 0x55, 0x41]);
/// let err = decode_record(&data, 0).unwrap_err();
/// assert_eq!(err.field(), Some(RecordField::Payload));
/// ```
pub fn decode_record(data: &Bytes, offset: usize) -> Result<(NdefRecord, usize)> {
    if offset >= data.len() {
        return Err(DecodeError::OffsetOutOfBounds {
            offset,
            len: data.len(),
        });
    }

    let mut reader = ByteReader::new(data, offset);

    let header = RecordHeader::from_byte(reader.read_u8(RecordField::Header)?);
    let type_length = reader.read_u8(RecordField::TypeLength)?;

    let payload_length = if header.short_record() {
        u32::from(reader.read_u8(RecordField::PayloadLength)?)
    } else {
        reader.read_u32_be(RecordField::PayloadLength)?
    };

    let id_length = if header.has_id() {
        reader.read_u8(RecordField::IdLength)?
    } else {
        0
    };

    let record_type = reader.take(usize::from(type_length), RecordField::Type)?;
    let record_id = reader.take(usize::from(id_length), RecordField::Id)?;

    // A length that does not fit in usize cannot fit in the buffer either.
    let payload_length = usize::try_from(payload_length).unwrap_or(usize::MAX);
    let payload = reader.take(payload_length, RecordField::Payload)?;

    let record = NdefRecord::new(header, record_type, record_id, payload);
    Ok((record, reader.pos))
}

/// Lazy iterator over the records of an NDEF message.
///
/// Yields records until the end of the buffer, the first record with ME set
/// (inclusive) or the first record that cannot be decoded (exclusive).
pub struct Records {
    data: Bytes,
    offset: usize,
    done: bool,
}

impl Records {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            offset: 0,
            done: false,
        }
    }
}

impl Iterator for Records {
    type Item = NdefRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.data.len() {
            return None;
        }

        match decode_record(&self.data, self.offset) {
            Ok((record, next)) => {
                self.offset = next;
                self.done = record.last_record();
                Some(record)
            }
            Err(_) => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Records {}

/// Decode an NDEF message into a [`NdefMessage`].
///
/// Takes ownership of the buffer so records can share it without copying.
pub fn decode_message(data: impl Into<Bytes>) -> NdefMessage {
    NdefMessage::new(Records::new(data).collect())
}

/// Decode every record of an NDEF message.
///
/// Never fails: a truncated or malformed record ends the message and the
/// records before it are returned.
///
/// # Examples
///
/// ```
/// use tagbridge_ndef::decode_records;
///
/// assert!(decode_records(&[]).is_empty());
///
/// // Second record is cut short; only the first one is returned.
/// let data = [0x91, 0x01, 0x01, 0x55, 0x00, 0x51, 0x01, 0x05, 0x55];
/// assert_eq!(decode_records(&data).len(), 1);
/// ```
pub fn decode_records(data: &[u8]) -> Vec<NdefRecord> {
    Records::new(Bytes::copy_from_slice(data)).collect()
}
