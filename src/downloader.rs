//! Video resolution and download through yt-dlp

use crate::extractor::VideoSource;
use crate::error::{MigrationError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Replace path separators so a title can be used as a file name.
pub fn sanitize_title(title: &str) -> String {
    title.replace('/', "-")
}

/// Metadata for a source video, before anything is downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVideo {
    pub source_url: String,
    pub video_id: String,
    pub title: String,
    pub description: String,
    /// Lower-resolution thumbnail used when the maxres image is unavailable
    pub fallback_thumbnail_url: String,
}

impl ResolvedVideo {
    pub fn safe_title(&self) -> String {
        sanitize_title(&self.title)
    }
}

/// Local files for one video being migrated
#[derive(Debug, Clone)]
pub struct VideoAsset {
    pub video_path: PathBuf,
    pub title: String,
    pub description: String,
    /// Thumbnail written during this run; `None` when the fetch failed
    pub thumbnail_path: Option<PathBuf>,
}

/// Result of a completed download
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub url: String,
    pub output_path: PathBuf,
    pub size_bytes: u64,
    pub sha256_hash: String,
    pub duration_secs: f64,
}

impl DownloadResult {
    /// Size and digest the file a download produced.
    pub async fn from_file(url: &str, output_path: &Path, elapsed: Duration) -> Result<Self> {
        let mut file = File::open(output_path).await?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; 64 * 1024];
        let mut size_bytes = 0u64;

        loop {
            let read = file.read(&mut buf).await?;
            if read == 0 {
                break;
            }
            hasher.update(&buf[..read]);
            size_bytes += read as u64;
        }

        Ok(Self {
            url: url.to_string(),
            output_path: output_path.to_path_buf(),
            size_bytes,
            sha256_hash: hex::encode(hasher.finalize()),
            duration_secs: elapsed.as_secs_f64(),
        })
    }
}

/// Video download client
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Look up title, description, id and fallback thumbnail for `source`.
    async fn resolve(&self, source: &VideoSource) -> Result<ResolvedVideo>;

    /// Download the best single-file stream into `output_dir`, named after the
    /// sanitized title. Returns the path of the written file.
    async fn download(&self, video: &ResolvedVideo, output_dir: &Path) -> Result<PathBuf>;
}

/// Subset of `yt-dlp --dump-single-json`
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    id: String,
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

fn default_thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", video_id)
}

/// Parse the JSON metadata printed by yt-dlp.
pub fn parse_info_json(source_url: &str, json: &str) -> Result<ResolvedVideo> {
    let info: YtDlpInfo = serde_json::from_str(json)?;
    let fallback_thumbnail_url = info
        .thumbnail
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| default_thumbnail_url(&info.id));

    Ok(ResolvedVideo {
        source_url: source_url.to_string(),
        title: info.title.unwrap_or_else(|| info.id.clone()),
        description: info.description.unwrap_or_default(),
        video_id: info.id,
        fallback_thumbnail_url,
    })
}

/// yt-dlp treats `%` as the start of a template field.
fn escape_template(value: &str) -> String {
    value.replace('%', "%%")
}

/// [`MediaSource`] backed by the yt-dlp executable
pub struct YtDlp {
    binary: String,
}

impl YtDlp {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn output_template(video: &ResolvedVideo, output_dir: &Path) -> String {
        let file = format!("{}.%(ext)s", escape_template(&video.safe_title()));
        output_dir.join(file).to_string_lossy().to_string()
    }
}

#[async_trait]
impl MediaSource for YtDlp {
    async fn resolve(&self, source: &VideoSource) -> Result<ResolvedVideo> {
        debug!("Resolving {} with {}", source, self.binary);
        let output = Command::new(&self.binary)
            .arg("--dump-single-json")
            .arg("--no-playlist")
            .arg("--skip-download")
            .arg(source.as_str())
            .output()
            .await
            .map_err(|e| MigrationError::ResolveFailed {
                url: source.to_string(),
                message: format!("failed to run {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            return Err(MigrationError::ResolveFailed {
                url: source.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let json = String::from_utf8_lossy(&output.stdout);
        parse_info_json(source.as_str(), &json).map_err(|e| MigrationError::ResolveFailed {
            url: source.to_string(),
            message: e.to_string(),
        })
    }

    async fn download(&self, video: &ResolvedVideo, output_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(output_dir).await?;
        let template = Self::output_template(video, output_dir);

        let output = Command::new(&self.binary)
            .args(["-f", "best[ext=mp4]/best"])
            .arg("--no-playlist")
            .arg("--no-part")
            .arg("--no-simulate")
            .args(["--print", "after_move:filepath"])
            .args(["-o", &template])
            .arg(&video.source_url)
            .output()
            .await
            .map_err(|e| MigrationError::DownloadFailed {
                url: video.source_url.clone(),
                message: format!("failed to run {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            return Err(MigrationError::DownloadFailed {
                url: video.source_url.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| MigrationError::DownloadFailed {
                url: video.source_url.clone(),
                message: "yt-dlp did not report an output file".to_string(),
            })?;

        info!("Downloaded video: {}", video.safe_title());
        Ok(path)
    }
}
