//! PrintSink - debug print of normalized documents

use std::io::{self, Write};

use contracts::{ContractError, DocumentSink, NormalizedDocument};
use tracing::{debug, instrument};

/// Sink that prints each document as one JSON line
pub struct PrintSink {
    name: String,
    out: Box<dyn Write + Send>,
}

impl PrintSink {
    /// Print to stdout
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::with_writer(name, Box::new(io::stdout()))
    }

    /// Print to an arbitrary writer
    pub fn with_writer(name: impl Into<String>, out: Box<dyn Write + Send>) -> Self {
        Self {
            name: name.into(),
            out,
        }
    }

    fn print(&mut self, document: &NormalizedDocument) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, document)?;
        self.out.write_all(b"\n")
    }
}

impl DocumentSink for PrintSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "print_sink_write", skip(self, document), fields(sink = %self.name))]
    async fn write(&mut self, document: &NormalizedDocument) -> Result<(), ContractError> {
        self.print(document)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "print_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.out.flush()?;
        Ok(())
    }

    #[instrument(name = "print_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.out.flush()?;
        debug!(sink = %self.name, "PrintSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Writer that keeps the bytes for inspection
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_print_sink_writes_json_lines() {
        let captured = Captured::default();
        let mut sink = PrintSink::with_writer("debug", Box::new(captured.clone()));

        for n in 0..2 {
            let fields = match json!({ "@timestamp": "2016-07-08T18:12:51", "n": n }) {
                serde_json::Value::Object(fields) => fields,
                _ => unreachable!(),
            };
            sink.write(&NormalizedDocument::new(fields)).await.unwrap();
        }
        sink.close().await.unwrap();

        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            text,
            "{\"@timestamp\":\"2016-07-08T18:12:51\",\"n\":0}\n{\"@timestamp\":\"2016-07-08T18:12:51\",\"n\":1}\n"
        );
    }

    #[test]
    fn test_print_sink_name() {
        let sink = PrintSink::stdout("my_printer");
        assert_eq!(sink.name(), "my_printer");
    }
}
