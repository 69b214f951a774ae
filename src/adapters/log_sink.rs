//! Log-based record sink adapter.
//!
//! Implements [`RecordSink`] by writing each aggregate record as one JSON
//! line to the logger (UART / USB-CDC in production). Used when no record
//! file is configured.

use log::info;

use crate::app::ports::RecordSink;
use crate::error::SinkError;
use crate::sampling::AggregateRecord;

/// Adapter that logs every [`AggregateRecord`] to the serial console.
#[derive(Debug, Default)]
pub struct LogRecordSink;

impl LogRecordSink {
    pub fn new() -> Self {
        Self
    }
}

impl RecordSink for LogRecordSink {
    fn append(&mut self, record: &AggregateRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record).map_err(|_| SinkError::Encode)?;
        info!("RECORD | {}", line);
        Ok(())
    }
}
