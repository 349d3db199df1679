//! EVTX container source

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use contracts::{ContractError, RawRecord, RecordSource};
use evtx::{EvtxParser, ParserSettings};
use memmap2::Mmap;
use tracing::{debug, info};

use crate::{parse_record_xml, IngestionError, Result};

/// Memory-mapped EVTX file
///
/// Records are rendered to XML by the container reader one at a time and
/// converted to trees on demand.
pub struct EvtxSource {
    name: String,
    parser: EvtxParser<Cursor<Mmap>>,
}

impl EvtxSource {
    /// Open and map a container.
    ///
    /// # Errors
    /// The file cannot be opened or mapped, or its header is not an EVTX header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| IngestionError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        // SAFETY: the mapping is read-only and lives as long as the parser.
        // Truncating the file while it is mapped is outside what this tool supports.
        let map = unsafe { Mmap::map(&file) }.map_err(|source| IngestionError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mapped_len = map.len();

        let parser = EvtxParser::from_read_seek(Cursor::new(map))
            .map_err(|e| IngestionError::Container {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .with_configuration(ParserSettings::default().num_threads(1));

        info!(path = %path.display(), bytes = mapped_len, "Opened EVTX container");

        Ok(Self {
            name: path.display().to_string(),
            parser,
        })
    }
}

impl RecordSource for EvtxSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn records(&mut self) -> Box<dyn Iterator<Item = std::result::Result<RawRecord, ContractError>> + '_> {
        let name = self.name.clone();
        Box::new(self.parser.records().map(move |record| -> std::result::Result<RawRecord, ContractError> {
            let record = record.map_err(|e| ContractError::record_read(&name, e.to_string()))?;
            let tree = parse_record_xml(&record.data).map_err(|e| {
                debug!(record_id = record.event_record_id, error = %e, "Record XML rejected");
                ContractError::record_read(&name, format!("record {}: {e}", record.event_record_id))
            })?;
            Ok(RawRecord::new(record.event_record_id, tree))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::RecordValue;
    use serde_json::json;
    use std::io::Write;

    const FILE_HEADER_SIZE: usize = 4096;
    const CHUNK_SIZE: usize = 65536;
    const CHUNK_HEADER_SIZE: usize = 512;

    /// Element or text node of a template-free BinXML record body
    enum Node {
        Element(&'static str, Vec<(&'static str, String)>, Vec<Node>),
        Text(String),
    }

    fn element(name: &'static str, children: Vec<Node>) -> Node {
        Node::Element(name, Vec::new(), children)
    }

    fn text(name: &'static str, value: impl Into<String>) -> Node {
        Node::Element(name, Vec::new(), vec![Node::Text(value.into())])
    }

    fn put_utf16(chunk: &mut Vec<u8>, value: &str) {
        for unit in value.encode_utf16() {
            chunk.extend_from_slice(&unit.to_le_bytes());
        }
    }

    /// Name reference pointing right after itself, followed by the inline name
    fn put_name(chunk: &mut Vec<u8>, name: &str) {
        let offset = chunk.len() as u32 + 4;
        chunk.extend_from_slice(&offset.to_le_bytes());
        chunk.extend_from_slice(&0u32.to_le_bytes()); // next string
        chunk.extend_from_slice(&0u16.to_le_bytes()); // hash
        chunk.extend_from_slice(&(name.encode_utf16().count() as u16).to_le_bytes());
        put_utf16(chunk, name);
        chunk.extend_from_slice(&0u16.to_le_bytes());
    }

    fn put_string_value(chunk: &mut Vec<u8>, value: &str) {
        chunk.extend_from_slice(&[0x05, 0x01]);
        chunk.extend_from_slice(&(value.encode_utf16().count() as u16).to_le_bytes());
        put_utf16(chunk, value);
    }

    fn put_node(chunk: &mut Vec<u8>, node: &Node) {
        match node {
            Node::Text(value) => put_string_value(chunk, value),
            Node::Element(name, attributes, children) => {
                chunk.push(if attributes.is_empty() { 0x01 } else { 0x41 });
                chunk.extend_from_slice(&0xffffu16.to_le_bytes()); // dependency id
                chunk.extend_from_slice(&0u32.to_le_bytes()); // element size, unused by readers
                put_name(chunk, name);
                if !attributes.is_empty() {
                    chunk.extend_from_slice(&0u32.to_le_bytes());
                }
                for (i, (key, value)) in attributes.iter().enumerate() {
                    chunk.push(if i + 1 == attributes.len() { 0x06 } else { 0x46 });
                    put_name(chunk, key);
                    put_string_value(chunk, value);
                }
                if children.is_empty() {
                    chunk.push(0x03);
                } else {
                    chunk.push(0x02);
                    for child in children {
                        put_node(chunk, child);
                    }
                    chunk.push(0x04);
                }
            }
        }
    }

    fn put_record(chunk: &mut Vec<u8>, record_id: u64, root: &Node) {
        // 2016-07-08T18:12:51Z as FILETIME
        const WRITTEN: u64 = 131_124_751_710_000_000;

        let start = chunk.len();
        chunk.extend_from_slice(b"**\0\0");
        chunk.extend_from_slice(&0u32.to_le_bytes());
        chunk.extend_from_slice(&record_id.to_le_bytes());
        chunk.extend_from_slice(&WRITTEN.to_le_bytes());
        chunk.extend_from_slice(&[0x0f, 0x01, 0x01, 0x00]); // fragment header
        put_node(chunk, root);
        chunk.push(0x00); // end of stream

        let size = (chunk.len() - start + 4) as u32;
        chunk[start + 4..start + 8].copy_from_slice(&size.to_le_bytes());
        chunk.extend_from_slice(&size.to_le_bytes());
    }

    /// One-chunk container holding `roots` as records 1..=n, checksums left at zero
    fn container(roots: &[Node]) -> Vec<u8> {
        let count = roots.len() as u64;

        let mut chunk = Vec::with_capacity(CHUNK_SIZE);
        chunk.extend_from_slice(b"ElfChnk\0");
        for value in [1, count, 1, count] {
            chunk.extend_from_slice(&u64::to_le_bytes(value));
        }
        chunk.extend_from_slice(&128u32.to_le_bytes());
        chunk.resize(CHUNK_HEADER_SIZE, 0);

        let mut last_record = CHUNK_HEADER_SIZE;
        for (i, root) in roots.iter().enumerate() {
            last_record = chunk.len();
            put_record(&mut chunk, i as u64 + 1, root);
        }
        let free_space = chunk.len();
        chunk[44..48].copy_from_slice(&(last_record as u32).to_le_bytes());
        chunk[48..52].copy_from_slice(&(free_space as u32).to_le_bytes());
        chunk.resize(CHUNK_SIZE, 0);

        let mut file = Vec::with_capacity(FILE_HEADER_SIZE + CHUNK_SIZE);
        file.extend_from_slice(b"ElfFile\0");
        file.extend_from_slice(&0u64.to_le_bytes()); // oldest chunk
        file.extend_from_slice(&0u64.to_le_bytes()); // current chunk
        file.extend_from_slice(&(count + 1).to_le_bytes()); // next record id
        file.extend_from_slice(&128u32.to_le_bytes()); // header size
        file.extend_from_slice(&1u16.to_le_bytes()); // minor version
        file.extend_from_slice(&3u16.to_le_bytes()); // major version
        file.extend_from_slice(&(FILE_HEADER_SIZE as u16).to_le_bytes());
        file.extend_from_slice(&1u16.to_le_bytes()); // chunk count
        file.resize(FILE_HEADER_SIZE, 0);
        file.extend_from_slice(&chunk);
        file
    }

    fn logon(second: u32, user: &str) -> Node {
        Node::Element(
            "Event",
            vec![(
                "xmlns",
                "http://schemas.microsoft.com/win/2004/08/events/event".to_string(),
            )],
            vec![
                element(
                    "System",
                    vec![
                        Node::Element(
                            "Provider",
                            vec![("Name", "Microsoft-Windows-Security-Auditing".to_string())],
                            Vec::new(),
                        ),
                        text("EventID", "4624"),
                        Node::Element(
                            "TimeCreated",
                            vec![(
                                "SystemTime",
                                format!("2016-07-08T18:12:{second:02}.681640Z"),
                            )],
                            Vec::new(),
                        ),
                        text("Computer", "WIN-DC01"),
                    ],
                ),
                element(
                    "EventData",
                    vec![
                        Node::Element(
                            "Data",
                            vec![("Name", "TargetUserName".to_string())],
                            vec![Node::Text(user.to_string())],
                        ),
                        Node::Element(
                            "Data",
                            vec![("Name", "LogonType".to_string())],
                            vec![Node::Text("5".to_string())],
                        ),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn test_reads_records_in_container_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&container(&[
            logon(51, "alice"),
            logon(52, "bob"),
            logon(53, "carol"),
        ]))
        .unwrap();
        file.flush().unwrap();

        let mut source = EvtxSource::open(file.path()).unwrap();
        let records: Vec<RawRecord> = source
            .records()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        let ids: Vec<u64> = records.iter().map(|record| record.record_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let expected = [(51, "alice"), (52, "bob"), (53, "carol")];
        for (record, (second, user)) in records.iter().zip(expected) {
            let system_time = record
                .tree
                .pointer(&["Event", "System", "TimeCreated", "@SystemTime"])
                .and_then(RecordValue::as_text)
                .unwrap();
            assert_eq!(system_time, format!("2016-07-08T18:12:{second}.681640Z"));

            assert_eq!(
                record.tree.pointer(&["Event", "System", "EventID"]),
                Some(&RecordValue::Text("4624".into()))
            );
            assert_eq!(
                record.tree.pointer(&["Event", "EventData", "Data"]),
                Some(&RecordValue::from(json!([
                    { "@Name": "TargetUserName", "#text": user },
                    { "@Name": "LogonType", "#text": "5" }
                ])))
            );
        }
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EvtxSource::open(dir.path().join("missing.evtx")).err().unwrap();
        assert!(matches!(err, IngestionError::Open { .. }));
    }

    #[test]
    fn test_open_rejects_non_evtx() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not an event log container, just some bytes")
            .unwrap();
        file.flush().unwrap();

        let err = EvtxSource::open(file.path()).err().unwrap();
        assert!(matches!(err, IngestionError::Container { .. }), "{err}");
    }
}
