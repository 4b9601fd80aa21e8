use crate::record::NdefRecord;

/// Decoded NDEF message: records in the order they appear on the tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NdefMessage {
    records: Vec<NdefRecord>,
}

impl NdefMessage {
    pub fn new(records: Vec<NdefRecord>) -> Self {
        NdefMessage { records }
    }

    /// All records, in encounter order.
    pub fn records(&self) -> &[NdefRecord] {
        &self.records
    }

    /// Get record by index
    pub fn record(&self, index: usize) -> Option<&NdefRecord> {
        self.records.get(index)
    }

    /// Number of records in the message
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NdefRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<NdefRecord> {
        self.records
    }

    /// Expanded URIs of every URI record, in order.
    pub fn uris(&self) -> impl Iterator<Item = String> + '_ {
        self.records.iter().filter_map(NdefRecord::decoded_uri)
    }

    /// Expanded URI of the first URI record.
    pub fn first_uri(&self) -> Option<String> {
        self.uris().next()
    }

    /// Package names of every Android Application Record, in order.
    pub fn android_packages(&self) -> impl Iterator<Item = String> + '_ {
        self.records
            .iter()
            .filter_map(NdefRecord::android_package_name)
    }
}

impl From<Vec<NdefRecord>> for NdefMessage {
    fn from(records: Vec<NdefRecord>) -> Self {
        Self::new(records)
    }
}

impl IntoIterator for NdefMessage {
    type Item = NdefRecord;
    type IntoIter = std::vec::IntoIter<NdefRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a NdefMessage {
    type Item = &'a NdefRecord;
    type IntoIter = std::slice::Iter<'a, NdefRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
