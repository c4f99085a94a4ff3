//! ytmigrate - move embedded YouTube videos to Vimeo
//!
//! Scans a text file for `https://www.youtube.com/embed/<id>` links, downloads
//! each video and its thumbnail, uploads both to Vimeo and appends a
//! `source,destination` row to `url_mapping.csv`.
//!
//! # Usage
//!
//! ```no_run
//! use ytmigrate::{MigrationConfig, MigrationPipeline, VimeoCredentials};
//!
//! # async fn run() -> ytmigrate::Result<()> {
//! let config = MigrationConfig::default();
//! let credentials = VimeoCredentials::from_env()?;
//! let pipeline = MigrationPipeline::from_config(&config, &credentials)?;
//!
//! let run = pipeline.run_from_file().await?;
//! for job in &run.jobs {
//!     println!("{} -> {:?}", job.source_url, job.destination_url);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A failing video never stops the batch: its job ends up `Failed` and no
//! ledger row is written for it.

pub mod client;
pub mod config;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod pipeline;
pub mod storage;
pub mod thumbnail;
pub mod uploader;
pub mod vimeo;

#[cfg(test)]
mod test_server;

pub use client::{Fetch, FetchedBody, HttpClient};
pub use config::{LogFormat, MigrationConfig, VimeoCredentials};
pub use downloader::{DownloadResult, MediaSource, ResolvedVideo, VideoAsset, YtDlp};
pub use error::{MigrationError, Result};
pub use extractor::{EmbedExtractor, VideoSource};
pub use pipeline::{JobStatus, MigrationJob, MigrationPipeline, PipelineRun, PipelineStats};
pub use storage::{InfoWriter, MappingLedger, MigrationRecord};
pub use thumbnail::ThumbnailFetcher;
pub use uploader::{publish, UploadResult};
pub use vimeo::{ApiResponse, UploadMetadata, VideoHost, VimeoClient};
