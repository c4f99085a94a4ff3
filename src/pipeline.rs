//! Per-video migration: resolve, download, enrich, upload, record

use crate::client::{Fetch, HttpClient};
use crate::config::{MigrationConfig, VimeoCredentials};
use crate::downloader::{DownloadResult, MediaSource, VideoAsset, YtDlp};
use crate::error::Result;
use crate::extractor::{EmbedExtractor, VideoSource};
use crate::storage::{InfoWriter, MappingLedger};
use crate::thumbnail::ThumbnailFetcher;
use crate::uploader::{publish, UploadResult};
use crate::vimeo::{VideoHost, VimeoClient};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Stage a migration job is in, or how it ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Resolving,
    Downloading,
    Enriching,
    Uploading,
    Recording,
    Completed,
    Failed,
}

/// A single source URL being migrated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationJob {
    pub id: String,
    pub source_url: String,
    pub status: JobStatus,
    pub destination_url: Option<String>,
    pub error_message: Option<String>,
    pub bytes_downloaded: u64,
    pub thumbnail_uploaded: bool,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl MigrationJob {
    pub fn new(source_url: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source_url: source_url.to_string(),
            status: JobStatus::Pending,
            destination_url: None,
            error_message: None,
            bytes_downloaded: 0,
            thumbnail_uploaded: false,
            created_at: chrono::Utc::now().to_rfc3339(),
            completed_at: None,
        }
    }
}

/// Pipeline statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub total_jobs: u64,
    pub completed_jobs: u64,
    pub failed_jobs: u64,
    pub thumbnails_uploaded: u64,
    pub total_bytes_downloaded: u64,
}

impl PipelineStats {
    fn from_jobs(jobs: &[MigrationJob]) -> Self {
        jobs.iter().fold(Self::default(), |mut stats, job| {
            stats.total_jobs += 1;
            match job.status {
                JobStatus::Completed => stats.completed_jobs += 1,
                JobStatus::Failed => stats.failed_jobs += 1,
                _ => {}
            }
            if job.thumbnail_uploaded {
                stats.thumbnails_uploaded += 1;
            }
            stats.total_bytes_downloaded += job.bytes_downloaded;
            stats
        })
    }
}

/// Jobs in input order plus their totals
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub jobs: Vec<MigrationJob>,
    pub stats: PipelineStats,
}

/// Migrates every extracted URL, isolating failures per URL
pub struct MigrationPipeline {
    config: MigrationConfig,
    extractor: EmbedExtractor,
    source: Arc<dyn MediaSource>,
    host: Arc<dyn VideoHost>,
    thumbnails: ThumbnailFetcher,
    ledger: MappingLedger,
}

impl MigrationPipeline {
    pub fn new(
        config: &MigrationConfig,
        source: Arc<dyn MediaSource>,
        host: Arc<dyn VideoHost>,
        fetch: Arc<dyn Fetch>,
    ) -> Result<Self> {
        Ok(Self {
            extractor: EmbedExtractor::new()?,
            thumbnails: ThumbnailFetcher::new(fetch, config.strict_thumbnails),
            ledger: MappingLedger::new(&config.output_dir),
            config: config.clone(),
            source,
            host,
        })
    }

    /// Wire the pipeline to yt-dlp, the Vimeo API and a shared HTTP client.
    pub fn from_config(config: &MigrationConfig, credentials: &VimeoCredentials) -> Result<Self> {
        let http = HttpClient::new(config)?;
        let host = VimeoClient::new(http.clone(), &config.vimeo_api_base, credentials)?;
        info!(client_id = %host.client_id(), "Vimeo client ready");
        Self::new(
            config,
            Arc::new(YtDlp::new(config.yt_dlp_path.clone())),
            Arc::new(host),
            Arc::new(http),
        )
    }

    pub fn ledger(&self) -> &MappingLedger {
        &self.ledger
    }

    /// Extract URLs from the configured input file and migrate them all.
    pub async fn run_from_file(&self) -> Result<PipelineRun> {
        let urls = self.extractor.extract_from_file(&self.config.input_file).await?;
        Ok(self.run(urls).await)
    }

    /// Migrate `urls` in order. Never fails; per-URL errors end up in the jobs.
    pub async fn run(&self, urls: Vec<VideoSource>) -> PipelineRun {
        if urls.is_empty() {
            info!("No video URLs to migrate");
            return PipelineRun {
                jobs: Vec::new(),
                stats: PipelineStats::default(),
            };
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.config.output_dir).await {
            error!(
                "Cannot create output directory {}: {}",
                self.config.output_dir.display(),
                e
            );
        }

        let concurrency = self.config.concurrency.max(1);
        let jobs: Vec<MigrationJob> = stream::iter(urls.iter())
            .map(|source| self.migrate(source))
            .buffered(concurrency)
            .collect()
            .await;

        let stats = PipelineStats::from_jobs(&jobs);
        info!(
            total = stats.total_jobs,
            completed = stats.completed_jobs,
            failed = stats.failed_jobs,
            "Migration finished"
        );
        PipelineRun { jobs, stats }
    }

    /// Migrate a single URL. Errors are logged and recorded on the job.
    pub async fn migrate(&self, source: &VideoSource) -> MigrationJob {
        let mut job = MigrationJob::new(source.as_str());
        let span = info_span!("migrate", job_id = %job.id, url = %source);

        async {
            match self.migrate_stages(source, &mut job).await {
                Ok(upload) => {
                    job.status = JobStatus::Recording;
                    self.ledger.record(source.as_str(), &upload.link).await;
                    job.destination_url = Some(upload.link);
                    job.thumbnail_uploaded = upload.thumbnail_uploaded;
                    job.status = JobStatus::Completed;
                    info!("Migration completed");
                }
                Err(e) => {
                    error!("Error downloading video: {}. Error: {}", source, e);
                    job.error_message = Some(e.to_string());
                    job.status = JobStatus::Failed;
                }
            }
            job.completed_at = Some(chrono::Utc::now().to_rfc3339());
        }
        .instrument(span)
        .await;

        job
    }

    async fn migrate_stages(&self, source: &VideoSource, job: &mut MigrationJob) -> Result<UploadResult> {
        let output_dir = self.config.output_dir.as_path();

        job.status = JobStatus::Resolving;
        let video = self.source.resolve(source).await?;
        let title = video.safe_title();

        job.status = JobStatus::Downloading;
        let started = Instant::now();
        let video_path = self.source.download(&video, output_dir).await?;
        let download = DownloadResult::from_file(source.as_str(), &video_path, started.elapsed()).await?;
        job.bytes_downloaded = download.size_bytes;
        info!(
            size_bytes = download.size_bytes,
            sha256 = %download.sha256_hash,
            secs = download.duration_secs,
            "Downloaded video: {}",
            title
        );

        job.status = JobStatus::Enriching;
        let thumbnail = match self
            .thumbnails
            .fetch(&video.video_id, &video.fallback_thumbnail_url, &title, output_dir)
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Thumbnail fetch failed for {}: {}", title, e);
                None
            }
        };
        InfoWriter::write(&title, &video.description, output_dir).await?;

        job.status = JobStatus::Uploading;
        let asset = VideoAsset {
            video_path,
            title,
            description: video.description,
            thumbnail_path: thumbnail,
        };
        publish(self.host.as_ref(), &asset).await
    }
}
