//! PC/SC reader support (feature `hardware-pcsc`).
//!
//! Talks to contactless readers such as the ACR122U through the system PC/SC
//! service. All calls block; run them on a blocking thread.

use crate::{
    HardwareError, Result,
    apdu::{self, split_response},
    traits::{PageReader, TagSession},
    types::PageRead,
};
use pcsc::{Attribute, Card, Context, MAX_BUFFER_SIZE, Protocols, Scope, ShareMode};
use std::ffi::CString;

/// A PC/SC reader selected by name.
pub struct PcscReader {
    context: Context,
    name: CString,
}

impl PcscReader {
    /// Establish a PC/SC context and pick a reader.
    ///
    /// With a filter, the first reader whose name contains it
    /// (case-insensitive) is used; without one, the first reader listed.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::ReaderNotFound` if no reader matches and
    /// `HardwareError::CommunicationError` if the PC/SC service fails.
    pub fn open(filter: Option<&str>) -> Result<Self> {
        let context = Context::establish(Scope::User)
            .map_err(|e| HardwareError::communication(format!("PC/SC context: {e}")))?;

        let readers = match context.list_readers_owned() {
            Ok(readers) => readers,
            Err(pcsc::Error::NoReadersAvailable) => Vec::new(),
            Err(e) => {
                return Err(HardwareError::communication(format!(
                    "Listing readers: {e}"
                )));
            }
        };

        let name = readers
            .into_iter()
            .find(|name| matches_filter(&name.to_string_lossy(), filter))
            .ok_or_else(|| HardwareError::reader_not_found(filter.unwrap_or("*")))?;

        Ok(Self { context, name })
    }

    /// Reader name as reported by PC/SC.
    pub fn name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }

    /// Connect to the card currently in the field.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::NoCard` when the field is empty and
    /// `HardwareError::Disconnected` when the reader went away.
    pub fn connect(&self) -> Result<PcscCard> {
        let card = self
            .context
            .connect(&self.name, ShareMode::Shared, Protocols::ANY)
            .map_err(|e| map_error(e, &self.name()))?;

        Ok(PcscCard {
            card,
            reader: self.name(),
        })
    }
}

/// A card connected through a PC/SC reader.
pub struct PcscCard {
    card: Card,
    reader: String,
}

impl PcscCard {
    /// Send an APDU and return the raw response (data + SW1 SW2).
    pub fn transmit(&self, command: &[u8]) -> Result<Vec<u8>> {
        let mut buffer = [0u8; MAX_BUFFER_SIZE];
        let response = self
            .card
            .transmit(command, &mut buffer)
            .map_err(|e| map_error(e, &self.reader))?;
        Ok(response.to_vec())
    }
}

impl PageReader for PcscCard {
    fn read_page(&mut self, page: u16) -> PageRead {
        match self.transmit(&apdu::read_binary(page)) {
            Ok(response) => PageRead::from_response(&response),
            Err(_) => PageRead::failed(None),
        }
    }
}

impl TagSession for PcscCard {
    fn atr(&self) -> Result<Vec<u8>> {
        self.card
            .get_attribute_owned(Attribute::AtrString)
            .map_err(|e| map_error(e, &self.reader))
    }

    fn uid(&mut self) -> Result<Vec<u8>> {
        let response = self.transmit(&apdu::GET_UID)?;
        let (data, status) = split_response(&response)
            .ok_or_else(|| HardwareError::invalid_data("Empty GET UID response"))?;
        if !status.is_success() {
            return Err(HardwareError::Status { status });
        }
        Ok(data.to_vec())
    }
}

fn map_error(err: pcsc::Error, device: &str) -> HardwareError {
    match err {
        pcsc::Error::NoSmartcard | pcsc::Error::RemovedCard | pcsc::Error::ResetCard => {
            HardwareError::NoCard
        }
        pcsc::Error::ReaderUnavailable
        | pcsc::Error::UnknownReader
        | pcsc::Error::NoService
        | pcsc::Error::ServiceStopped => HardwareError::disconnected(device),
        other => HardwareError::communication(other.to_string()),
    }
}

fn matches_filter(name: &str, filter: Option<&str>) -> bool {
    filter.is_none_or(|f| name.to_lowercase().contains(&f.to_lowercase()))
}
