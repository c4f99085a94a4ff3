//! Upload a downloaded video, look up its public link and attach the thumbnail

use crate::downloader::VideoAsset;
use crate::error::{MigrationError, Result};
use crate::vimeo::{ApiResponse, UploadMetadata, VideoHost};
use bytes::Bytes;
use reqwest::StatusCode;
use std::path::Path;
use tracing::{error, info, warn};

/// Outcome of a successful primary upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Public link recorded in the ledger
    pub link: String,
    /// API resource, e.g. `/videos/123`
    pub uri: String,
    pub request_hash: Option<String>,
    pub thumbnail_uploaded: bool,
}

/// `https://vimeo.com/<id>` for a `/videos/<id>` resource URI.
pub fn link_from_uri(uri: &str) -> Option<String> {
    let id = uri.trim_end_matches('/').rsplit('/').next()?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("https://vimeo.com/{}", id))
}

fn log_response(context: &str, response: &ApiResponse) {
    info!(status = %response.status, "Response received for {}: {}", context, response.body);
    if let Some(hash) = response.request_hash() {
        info!(request_hash = %hash, "Request-Hash: {}", hash);
    }
}

async fn lookup_link(host: &dyn VideoHost, uri: &str) -> Result<(String, Option<String>)> {
    let path = format!("{}?fields=link", uri);
    let fallback = || {
        link_from_uri(uri).ok_or_else(|| {
            MigrationError::UploadFailed(format!("no public link available for {}", uri))
        })
    };

    let response = match host.get(&path).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Request to {} failed: {}", path, e);
            return Ok((fallback()?, None));
        }
    };

    info!("Request made to {}", path);
    log_response(&path, &response);
    let request_hash = response.request_hash().map(str::to_string);

    let link = response
        .json()
        .ok()
        .and_then(|body| body.get("link").and_then(|l| l.as_str()).map(str::to_string));

    match link {
        Some(link) => Ok((link, request_hash)),
        None => {
            warn!(status = %response.status, "No link in response from {}", path);
            Ok((fallback()?, request_hash))
        }
    }
}

async fn upload_thumbnail(host: &dyn VideoHost, uri: &str, thumbnail: &Path, title: &str) -> bool {
    let data = match tokio::fs::read(thumbnail).await {
        Ok(data) => Bytes::from(data),
        Err(e) => {
            error!("Error uploading thumbnail: {}", e);
            return false;
        }
    };

    info!("Uploading thumbnail: {}", thumbnail.display());
    let path = format!("{}/pictures", uri);
    match host.post_file(&path, data, &[("active", "true")]).await {
        Ok(response) if response.status == StatusCode::CREATED => {
            info!("Successfully uploaded thumbnail for {}", title);
            log_response(&path, &response);
            true
        }
        Ok(response) => {
            error!(
                "Error uploading thumbnail. Status code: {}, Response: {}",
                response.status.as_u16(),
                response.body
            );
            false
        }
        Err(e) => {
            error!("Error uploading thumbnail: {}", e);
            false
        }
    }
}

/// Upload `asset` and return its public link.
///
/// Only the primary upload can fail this call. Link lookup and thumbnail
/// problems are logged and the link is still returned.
pub async fn publish(host: &dyn VideoHost, asset: &VideoAsset) -> Result<UploadResult> {
    let metadata = UploadMetadata::new(&asset.title, &asset.description);
    info!(
        "Uploading video: {} with data: {}",
        asset.video_path.display(),
        serde_json::to_string(&metadata)?
    );

    let uri = host.upload(&asset.video_path, &metadata).await?;
    info!("Successfully uploaded {} to {}", asset.title, uri);

    let (link, request_hash) = lookup_link(host, &uri).await?;

    let thumbnail_uploaded = match asset.thumbnail_path.as_deref() {
        Some(thumbnail) if thumbnail.is_file() => {
            upload_thumbnail(host, &uri, thumbnail, &asset.title).await
        }
        Some(thumbnail) => {
            error!("Thumbnail file does not exist: {}", thumbnail.display());
            false
        }
        None => {
            error!("No thumbnail fetched for {}, skipping thumbnail upload", asset.title);
            false
        }
    };

    Ok(UploadResult {
        link,
        uri,
        request_hash,
        thumbnail_uploaded,
    })
}
