use std::{io, path::PathBuf};

use thiserror::Error;
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
};

use super::generator::Report;

/// Same-second reports for one host are numbered up to this many names.
const MAX_NAME_ATTEMPTS: u32 = 100;

/// A report that could not be persisted. Logged and dropped by the monitor.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report {} already exists", path.display())]
    AlreadyExists { path: PathBuf },
    #[error("failed to write report {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes the document under its derived file name, numbering the name
    /// when another report already holds it. Never overwrites.
    pub async fn write(&self, report: &Report) -> Result<PathBuf, ReportError> {
        let (mut file, path) = self.create(report).await?;
        let mut partial = PartialFile::new(path.clone());

        let io_error = |source: io::Error| ReportError::Io {
            path: path.clone(),
            source,
        };
        file.write_all(report.document.as_bytes())
            .await
            .map_err(io_error)?;
        file.flush().await.map_err(io_error)?;
        partial.keep();

        tracing::info!(target: "report", path = %path.display(), url = %report.target, "report generated");
        Ok(path)
    }

    async fn create(&self, report: &Report) -> Result<(File, PathBuf), ReportError> {
        let mut attempt = 1;
        loop {
            let path = self.dir.join(report.numbered_file_name(attempt));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((file, path)),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    if attempt >= MAX_NAME_ATTEMPTS {
                        return Err(ReportError::AlreadyExists { path });
                    }
                    attempt += 1;
                }
                Err(source) => return Err(ReportError::Io { path, source }),
            }
        }
    }
}

/// Removes a half-written report unless `keep` is called. Runs on error
/// returns and when the write future is dropped by a shutdown.
struct PartialFile {
    path: PathBuf,
    complete: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            complete: false,
        }
    }

    fn keep(&mut self) {
        self.complete = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.complete {
            return;
        }
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!(target: "report", path = %self.path.display(), error = %err, "failed to remove partial report");
        }
    }
}
