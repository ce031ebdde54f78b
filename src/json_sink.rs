use crate::record::LogRecord;
use crate::sink::{Sink, SinkError};
use std::io::{self, Write};
use std::sync::Mutex;

/// Writes each record as a Cloud Logging compatible JSON object.
///
/// Production output is one object per line; development output is
/// pretty-printed. The field set is the same in both.
pub struct JsonSink<W: Write + Send> {
    writer: Mutex<W>,
    pretty: bool,
}

impl JsonSink<io::Stdout> {
    pub fn stdout(pretty: bool) -> Self {
        JsonSink::new(io::stdout(), pretty)
    }
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(writer: W, pretty: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            pretty,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Sink for JsonSink<W> {
    fn submit(&self, record: LogRecord) -> Result<(), SinkError> {
        // Encode outside the lock.
        let mut buf = if self.pretty {
            serde_json::to_vec_pretty(&record)?
        } else {
            serde_json::to_vec(&record)?
        };
        buf.push(b'\n');

        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.write_all(&buf)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.flush()?;
        Ok(())
    }
}
