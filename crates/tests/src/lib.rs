//! # Integration Tests
//!
//! End-to-end tests across crates.
//!
//! Covers:
//! - Rendered record XML -> tree -> normalized document
//! - Normalizer -> BulkQueue -> in-memory bulk sink
//! - Normalizer -> JSON-lines export
//! - Settings file -> queue configuration

#[cfg(test)]
mod fixtures {
    /// Logon event as rendered by the container reader
    pub const LOGON: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Event xmlns="http://schemas.microsoft.com/win/2004/08/events/event">
  <System>
    <Provider Name="Microsoft-Windows-Security-Auditing" Guid="{54849625-5478-4994-a5ba-3e3b0328c30d}">
    </Provider>
    <EventID>4624</EventID>
    <TimeCreated SystemTime="2016-07-08T18:12:51.681640Z">
    </TimeCreated>
    <EventRecordID>1</EventRecordID>
    <Computer>WIN-DC01</Computer>
  </System>
  <EventData>
    <Data Name="SubjectUserSid">S-1-5-18</Data>
    <Data Name="TargetUserName">alice</Data>
    <Data Name="LogonType">3</Data>
    <Data>unnamed</Data>
  </EventData>
</Event>"#;

    /// Log-cleared event: UserData instead of EventData
    pub const LOG_CLEARED: &str = r#"<Event xmlns="http://schemas.microsoft.com/win/2004/08/events/event">
  <System>
    <EventID>1102</EventID>
    <TimeCreated SystemTime="2016-07-08T18:20:00Z"/>
  </System>
  <UserData>
    <LogFileCleared>
      <SubjectUserName>admin</SubjectUserName>
    </LogFileCleared>
  </UserData>
</Event>"#;

    /// Service event with one unnamed Data value
    pub const SINGLE_DATA: &str = r#"<Event>
  <System>
    <EventID>7036</EventID>
    <TimeCreated SystemTime="2016-07-08 18:25:00.5"/>
  </System>
  <EventData>
    <Data>The Windows Update service entered the running state.</Data>
  </EventData>
</Event>"#;

    /// Binary-only EventData
    pub const BINARY_ONLY: &str = r#"<Event>
  <System>
    <EventID>6008</EventID>
    <TimeCreated SystemTime="2016-07-08 18:30:00"/>
  </System>
  <EventData>
    <Binary>DEADBEEF</Binary>
  </EventData>
</Event>"#;

    /// Timestamp that does not parse
    pub const BAD_TIME: &str = r#"<Event>
  <System>
    <EventID>1</EventID>
    <TimeCreated SystemTime="yesterday"/>
  </System>
</Event>"#;

    pub fn all() -> [&'static str; 5] {
        [LOGON, LOG_CLEARED, SINGLE_DATA, BINARY_ONLY, BAD_TIME]
    }
}

#[cfg(test)]
mod normalize_tests {
    use contracts::RecordSource;
    use ingestion::{parse_record_xml, MemorySource};
    use normalizer::{classify, normalize, PayloadShape};
    use serde_json::{json, Value};

    use super::fixtures;

    fn normalize_xml(xml: &str) -> Value {
        let record = contracts::RawRecord::new(1, parse_record_xml(xml).unwrap());
        Value::Object(normalize(&record).unwrap().into_map())
    }

    #[test]
    fn test_logon_event() {
        let doc = normalize_xml(fixtures::LOGON);

        assert_eq!(doc["@timestamp"], "2016-07-08T18:12:51.681640");
        assert_eq!(
            doc["Event"]["System"]["TimeCreated"]["@SystemTime"],
            "2016-07-08T18:12:51.681640"
        );
        assert_eq!(
            doc["Event"]["EventData"]["Data"],
            json!({
                "SubjectUserSid": "S-1-5-18",
                "TargetUserName": "alice",
                "LogonType": "3"
            })
        );
        assert_eq!(doc["Event"]["System"]["Provider"]["@Name"], "Microsoft-Windows-Security-Auditing");
    }

    #[test]
    fn test_log_cleared_event() {
        let doc = normalize_xml(fixtures::LOG_CLEARED);

        assert_eq!(doc["@timestamp"], "2016-07-08T18:20:00");
        let raw: Value = serde_json::from_str(doc["RawData"].as_str().unwrap()).unwrap();
        assert_eq!(raw["UserData"]["LogFileCleared"]["SubjectUserName"], "admin");
        assert!(doc["Event"].get("UserData").is_some());
    }

    #[test]
    fn test_single_data_event() {
        let doc = normalize_xml(fixtures::SINGLE_DATA);

        assert_eq!(doc["@timestamp"], "2016-07-08T18:25:00.500000");
        assert_eq!(
            doc["Event"]["EventData"],
            json!({ "RawData": "The Windows Update service entered the running state." })
        );
    }

    #[test]
    fn test_binary_only_event() {
        let doc = normalize_xml(fixtures::BINARY_ONLY);

        assert!(doc["Event"].get("EventData").is_none());
        assert_eq!(doc["Event"]["RawData"], r#"{"Binary":"DEADBEEF"}"#);
    }

    #[test]
    fn test_shapes() {
        let shapes: Vec<PayloadShape> = fixtures::all()
            .iter()
            .map(|xml| classify(&parse_record_xml(xml).unwrap()))
            .collect();
        assert_eq!(
            shapes,
            vec![
                PayloadShape::DataEntries,
                PayloadShape::EventOnly,
                PayloadShape::SingleData,
                PayloadShape::EventDataWithoutData,
                PayloadShape::EventOnly,
            ]
        );
    }

    #[test]
    fn test_documents_are_plain_json() {
        let mut source = MemorySource::from_xml("fixtures", fixtures::all()).unwrap();
        for record in source.records() {
            let record = record.unwrap();
            let Ok(doc) = normalize(&record) else {
                continue;
            };
            let text = serde_json::to_string(&doc).unwrap();
            let decoded: contracts::NormalizedDocument = serde_json::from_str(&text).unwrap();
            assert_eq!(decoded, doc);
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use contracts::{IndexName, Metadata, RecordSource};
    use dispatcher::{BulkQueue, DocumentSink, FileSink, MemorySink};
    use ingestion::MemorySource;
    use normalizer::normalize;
    use observability::IngestMetricsAggregator;
    use serde_json::Value;

    use super::fixtures;

    /// MemorySource -> normalize -> BulkQueue -> MemorySink
    #[tokio::test]
    async fn test_e2e_index_pipeline() {
        let xml: Vec<&str> = fixtures::all().iter().cycle().take(12).copied().collect();
        let mut source = MemorySource::from_xml("fixtures", xml).unwrap();

        let sink = MemorySink::new("mem");
        let batches = sink.batches();
        let mut queue = BulkQueue::new(sink, 4).unwrap();
        let index = IndexName::from("winlogs");
        let meta = Metadata::parse(r#"{"case":"IR-7","host":"dc01"}"#).unwrap();
        let mut metrics = IngestMetricsAggregator::new();

        for record in source.records() {
            metrics.record_read();
            match normalize(&record.unwrap()) {
                Ok(doc) => {
                    metrics.record_normalized();
                    if let Some(size) = queue.enqueue(doc, &index, &meta).await.unwrap() {
                        metrics.record_batch(size, true);
                    }
                }
                Err(e) => metrics.record_rejected(e.reason()),
            }
        }
        let report = queue.drain().await.unwrap();
        if let Some(size) = report.final_batch {
            metrics.record_batch(size, true);
        }

        // 12 records, every fifth one has a bad timestamp
        let summary = metrics.summary();
        assert_eq!(summary.records_read, 12);
        assert_eq!(summary.total_rejected, 2);
        assert_eq!(summary.documents_delivered, 10);
        assert_eq!(report.metrics.delivered_count, 10);

        let submitted = batches.lock().unwrap();
        let sizes: Vec<usize> = submitted.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);

        let mut body = Vec::new();
        submitted[0][0].write_bulk_lines(&mut body).unwrap();
        let text = String::from_utf8(body).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(r#"{"index":{"_index":"winlogs","_type":"winlogs"}}"#)
        );
        let source: Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(source["meta"]["case"], "IR-7");
        assert_eq!(source["@timestamp"], "2016-07-08T18:12:51.681640");
    }

    /// A failing submission halts the run; nothing after it is enqueued.
    #[tokio::test]
    async fn test_e2e_fatal_submission() {
        let xml = [fixtures::LOGON; 6];
        let mut source = MemorySource::from_xml("fixtures", xml).unwrap();

        let sink = MemorySink::new("mem").fail_on_batch(2);
        let batches = sink.batches();
        let mut queue = BulkQueue::new(sink, 2).unwrap();
        let index = IndexName::default();
        let meta = Metadata::default();

        let mut enqueued = 0;
        let mut failure = None;
        for record in source.records() {
            let doc = normalize(&record.unwrap()).unwrap();
            enqueued += 1;
            if let Err(e) = queue.enqueue(doc, &index, &meta).await {
                failure = Some(e);
                break;
            }
        }

        assert!(failure.is_some());
        assert_eq!(enqueued, 4);
        assert_eq!(batches.lock().unwrap().len(), 1);
        assert_eq!(queue.metrics().failure_count(), 1);
    }

    /// MemorySource -> normalize -> FileSink
    #[tokio::test]
    async fn test_e2e_export_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Security.json");
        let mut source = MemorySource::from_xml("fixtures", fixtures::all()).unwrap();
        let mut sink = FileSink::open("export", &path).unwrap();

        for record in source.records() {
            if let Ok(doc) = normalize(&record.unwrap()) {
                sink.write(&doc).await.unwrap();
            }
        }
        sink.close().await.unwrap();
        assert_eq!(sink.written(), 4);

        let text = std::fs::read_to_string(&path).unwrap();
        let timestamps: Vec<String> = text
            .lines()
            .map(|line| serde_json::from_str::<Value>(line).unwrap()["@timestamp"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            timestamps,
            vec![
                "2016-07-08T18:12:51.681640",
                "2016-07-08T18:20:00",
                "2016-07-08T18:25:00.500000",
                "2016-07-08T18:30:00",
            ]
        );
    }

    /// Settings file drives the queue threshold and destination
    #[tokio::test]
    async fn test_settings_file_drives_queue() {
        let settings = config_loader::ConfigLoader::load_from_str(
            "index = \"evtx-lab\"\nbatch_size = 3\n[metadata]\nlab = \"a\"\n",
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let sink = MemorySink::new("mem");
        let batches = sink.batches();
        let mut queue = BulkQueue::new(sink, settings.batch_size).unwrap();
        let mut source = MemorySource::from_xml("fixtures", [fixtures::LOGON; 3]).unwrap();
        for record in source.records() {
            let doc = normalize(&record.unwrap()).unwrap();
            queue
                .enqueue(doc, &settings.index, &settings.metadata)
                .await
                .unwrap();
        }

        let submitted = batches.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0][0].index().as_str(), "evtx-lab");
        assert_eq!(submitted[0][2].metadata().as_map()["lab"], "a");
    }
}
