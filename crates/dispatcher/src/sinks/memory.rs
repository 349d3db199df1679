//! MemorySink - records submitted batches (tests and dry runs)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use contracts::{BulkSink, ContractError, DispatchEnvelope};

/// Shared list of submitted batches
pub type SubmittedBatches = Arc<Mutex<Vec<Vec<DispatchEnvelope>>>>;

/// Bulk sink that keeps every batch in memory
///
/// Can be told to fail a given submission (1-based) to exercise the fatal path.
#[derive(Debug, Default)]
pub struct MemorySink {
    name: String,
    batches: SubmittedBatches,
    attempts: usize,
    fail_on: Option<usize>,
    closed: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Fail the `n`-th submission (1-based)
    pub fn fail_on_batch(mut self, n: usize) -> Self {
        self.fail_on = Some(n);
        self
    }

    /// Handle to the submitted batches
    pub fn batches(&self) -> SubmittedBatches {
        Arc::clone(&self.batches)
    }

    /// Handle to the closed flag
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl BulkSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn bulk_index(&mut self, batch: &[DispatchEnvelope]) -> Result<(), ContractError> {
        self.attempts += 1;
        if self.fail_on == Some(self.attempts) {
            return Err(ContractError::sink_write(
                &self.name,
                format!("submission {} refused", self.attempts),
            ));
        }
        self.batches
            .lock()
            .map_err(|_| ContractError::sink_write(&self.name, "batch store poisoned"))?
            .push(batch.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
