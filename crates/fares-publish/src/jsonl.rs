use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use fares_core::{CanonicalOffer, PublishError, Publisher};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Writes each offer as a single JSON line and flushes immediately, so a
/// crashed run loses at most the offer being written.
///
/// Writes run on tokio's blocking pool.
pub struct JsonLinesPublisher {
    writer: SharedWriter,
}

impl JsonLinesPublisher {
    #[must_use]
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    /// Appends to `path`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Unreachable`] if the file cannot be opened.
    pub fn append_to(path: &Path) -> Result<Self, PublishError> {
        let file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| PublishError::Unreachable {
                target: path.display().to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!(path = %path.display(), "publishing offers to file");
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }
}

fn write_line(writer: &Mutex<Box<dyn Write + Send>>, line: &str) -> Result<(), PublishError> {
    let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
    writeln!(writer, "{line}")?;
    writer.flush()?;
    Ok(())
}

impl Publisher for JsonLinesPublisher {
    async fn publish(&self, offer: &CanonicalOffer) -> Result<(), PublishError> {
        let line = serde_json::to_string(offer)?;
        let writer = Arc::clone(&self.writer);
        tokio::task::spawn_blocking(move || write_line(&writer, &line))
            .await
            .map_err(io::Error::other)?
    }
}
