//! JSON-lines record sink.
//!
//! One record per line, flushed after every append so a power cut loses at
//! most the record being written.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::app::ports::RecordSink;
use crate::error::SinkError;
use crate::sampling::AggregateRecord;

#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SinkError::Io(e.kind()))?;
        info!("RECORD | appending to {}", path.display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn append(&mut self, record: &AggregateRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record).map_err(|e| {
            if e.is_io() {
                SinkError::Io(std::io::Error::from(e).kind())
            } else {
                SinkError::Encode
            }
        })?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(|e| SinkError::Io(e.kind()))
    }
}
