//! Local files written per migrated video and the shared mapping ledger

use crate::downloader::sanitize_title;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info};

pub const LEDGER_FILE_NAME: &str = "url_mapping.csv";

/// One ledger row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub source_url: String,
    pub destination_url: String,
}

impl MigrationRecord {
    pub fn new(source_url: impl Into<String>, destination_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            destination_url: destination_url.into(),
        }
    }

    /// Render as a single CSV line, quoted where needed.
    pub fn to_csv_line(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.serialize(self)?;
        writer
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()).into())
    }
}

/// Plain-text title and description for each video
pub struct InfoWriter;

impl InfoWriter {
    pub fn info_path(output_dir: &Path, title: &str) -> PathBuf {
        output_dir.join(format!("{}.txt", sanitize_title(title)))
    }

    /// Overwrites any existing file of the same name.
    pub async fn write(title: &str, description: &str, output_dir: &Path) -> Result<PathBuf> {
        let path = Self::info_path(output_dir, title);
        let content = format!("Title: {}\nDescription: {}", title, description);
        fs::write(&path, content).await?;
        info!("Wrote video info to {}", path.display());
        Ok(path)
    }
}

/// Append-only CSV of (source URL, destination URL) rows
pub struct MappingLedger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MappingLedger {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            path: output_dir.join(LEDGER_FILE_NAME),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, record: &MigrationRecord) -> Result<()> {
        let line = record.to_csv_line()?;
        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    /// Append one row. Failures are logged and never propagated.
    pub async fn record(&self, source_url: &str, destination_url: &str) {
        let record = MigrationRecord::new(source_url, destination_url);
        match self.append(&record).await {
            Ok(()) => info!(
                "Successfully wrote mapping: {} to {} in {}",
                source_url,
                destination_url,
                self.path.display()
            ),
            Err(e) => error!("Error writing to file {}: {}", self.path.display(), e),
        }
    }

    /// Every row currently in the ledger, oldest first.
    pub async fn read_all(&self) -> Result<Vec<MigrationRecord>> {
        let content = {
            let _guard = self.lock.lock().await;
            match fs::read(&self.path).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            }
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(content.as_slice());
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }
}
