//! FileSink - JSON-lines export

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, DocumentSink, NormalizedDocument};
use tracing::{debug, error, instrument};

/// Sink that appends one JSON document per line to a file
///
/// The file is opened in append/create mode; existing content is kept.
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    written: u64,
}

impl FileSink {
    /// Open (or create) the export file
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            writer: Some(BufWriter::new(file)),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Documents written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, ContractError> {
        self.writer
            .as_mut()
            .ok_or_else(|| ContractError::sink_write(&self.name, "file already closed"))
    }

    fn append(&mut self, document: &NormalizedDocument) -> Result<(), ContractError> {
        let writer = self.writer()?;
        serde_json::to_writer(&mut *writer, document)?;
        writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }
}

impl DocumentSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "file_sink_write", skip(self, document), fields(sink = %self.name))]
    async fn write(&mut self, document: &NormalizedDocument) -> Result<(), ContractError> {
        self.append(document).map_err(|e| {
            error!(sink = %self.name, path = %self.path.display(), error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer()?.flush()?;
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        debug!(sink = %self.name, written = self.written, "FileSink closed");
        Ok(())
    }
}
