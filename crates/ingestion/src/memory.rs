//! In-memory record source
//!
//! Serves prepared trees (or XML fixtures) through the same interface as a
//! real container. Failing items let tests exercise per-record read errors.

use contracts::{ContractError, RawRecord, RecordSource};

use crate::{parse_record_xml, Result};

/// Record source backed by a vector
#[derive(Debug, Default)]
pub struct MemorySource {
    name: String,
    items: Vec<std::result::Result<RawRecord, String>>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, records: impl IntoIterator<Item = RawRecord>) -> Self {
        Self {
            name: name.into(),
            items: records.into_iter().map(Ok).collect(),
        }
    }

    /// Build a source from rendered record XML; ids are assigned from 1.
    pub fn from_xml<'a>(name: impl Into<String>, documents: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let records = documents
            .into_iter()
            .enumerate()
            .map(|(i, xml)| Ok(RawRecord::new(i as u64 + 1, parse_record_xml(xml)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(name, records))
    }

    /// Append an item that fails to read.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.items.push(Err(message.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl RecordSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn records(&mut self) -> Box<dyn Iterator<Item = std::result::Result<RawRecord, ContractError>> + '_> {
        let name = self.name.as_str();
        Box::new(self.items.iter().map(move |item| match item {
            Ok(record) => Ok(record.clone()),
            Err(message) => Err(ContractError::record_read(name, message.clone())),
        }))
    }
}
