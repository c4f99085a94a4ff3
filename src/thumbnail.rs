//! Thumbnail download with a single lower-resolution fallback

use crate::client::Fetch;
use crate::downloader::sanitize_title;
use crate::error::{MigrationError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub fn maxres_thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/maxresdefault.jpg", video_id)
}

pub fn thumbnail_path(output_dir: &Path, title: &str) -> PathBuf {
    output_dir.join(format!("{}_thumbnail.jpg", sanitize_title(title)))
}

pub struct ThumbnailFetcher {
    http: Arc<dyn Fetch>,
    strict: bool,
}

impl ThumbnailFetcher {
    /// With `strict`, a failed fallback fetch writes nothing and returns an error.
    pub fn new(http: Arc<dyn Fetch>, strict: bool) -> Self {
        Self { http, strict }
    }

    /// Fetch the best available thumbnail and write it next to the video.
    pub async fn fetch(
        &self,
        video_id: &str,
        fallback_url: &str,
        title: &str,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let primary = maxres_thumbnail_url(video_id);

        let body = match self.http.fetch(&primary).await {
            Ok(body) if body.is_success() => body,
            Ok(body) => {
                info!(status = %body.status, "Max resolution thumbnail unavailable, using {}", fallback_url);
                self.http.fetch(fallback_url).await?
            }
            Err(e) => {
                warn!("Max resolution thumbnail request failed: {}, using {}", e, fallback_url);
                self.http.fetch(fallback_url).await?
            }
        };

        if !body.is_success() {
            if self.strict {
                return Err(MigrationError::ThumbnailFailed(format!(
                    "{} returned {}",
                    fallback_url, body.status
                )));
            }
            warn!(status = %body.status, "Fallback thumbnail was not a success, writing body anyway");
        }

        let path = thumbnail_path(output_dir, title);
        tokio::fs::write(&path, &body.bytes).await?;
        info!("Saved thumbnail to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchedBody;
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedFetch {
        responses: HashMap<String, (StatusCode, &'static [u8])>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedFetch {
        fn with(mut self, url: &str, status: StatusCode, body: &'static [u8]) -> Self {
            self.responses.insert(url.to_string(), (status, body));
            self
        }
    }

    #[async_trait]
    impl Fetch for ScriptedFetch {
        async fn fetch(&self, url: &str) -> Result<FetchedBody> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.responses.get(url) {
                Some((status, body)) => Ok(FetchedBody {
                    status: *status,
                    bytes: Bytes::from_static(body),
                }),
                None => Err(MigrationError::ThumbnailFailed(format!("unreachable {}", url))),
            }
        }
    }

    const FALLBACK: &str = "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg";

    #[tokio::test]
    async fn uses_maxres_when_available() {
        let dir = tempfile::tempdir().unwrap();
        let http = Arc::new(ScriptedFetch::default().with(
            &maxres_thumbnail_url("dQw4w9WgXcQ"),
            StatusCode::OK,
            b"maxres",
        ));
        let fetcher = ThumbnailFetcher::new(http.clone(), false);

        let path = fetcher
            .fetch("dQw4w9WgXcQ", FALLBACK, "Clip", dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("Clip_thumbnail.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"maxres");
        assert_eq!(http.requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn not_found_falls_back_and_writes_whatever_comes_back() {
        let dir = tempfile::tempdir().unwrap();
        let http = Arc::new(
            ScriptedFetch::default()
                .with(&maxres_thumbnail_url("dQw4w9WgXcQ"), StatusCode::NOT_FOUND, b"nope")
                .with(FALLBACK, StatusCode::NOT_FOUND, b"<html>error page</html>"),
        );
        let fetcher = ThumbnailFetcher::new(http.clone(), false);

        let path = fetcher
            .fetch("dQw4w9WgXcQ", FALLBACK, "A/B Test", dir.path())
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "A-B Test_thumbnail.jpg");
        assert_eq!(std::fs::read(&path).unwrap(), b"<html>error page</html>");
        assert_eq!(
            *http.requested.lock().unwrap(),
            vec![maxres_thumbnail_url("dQw4w9WgXcQ"), FALLBACK.to_string()]
        );
    }

    #[tokio::test]
    async fn transport_error_on_maxres_still_tries_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let http = Arc::new(ScriptedFetch::default().with(FALLBACK, StatusCode::OK, b"hq"));
        let fetcher = ThumbnailFetcher::new(http, false);

        let path = fetcher
            .fetch("dQw4w9WgXcQ", FALLBACK, "Clip", dir.path())
            .await
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hq");
    }

    #[tokio::test]
    async fn strict_policy_writes_nothing_when_both_fail() {
        let dir = tempfile::tempdir().unwrap();
        let http = Arc::new(
            ScriptedFetch::default()
                .with(&maxres_thumbnail_url("dQw4w9WgXcQ"), StatusCode::NOT_FOUND, b"")
                .with(FALLBACK, StatusCode::INTERNAL_SERVER_ERROR, b"oops"),
        );
        let fetcher = ThumbnailFetcher::new(http, true);

        let err = fetcher
            .fetch("dQw4w9WgXcQ", FALLBACK, "Clip", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, MigrationError::ThumbnailFailed(_)));
        assert!(!thumbnail_path(dir.path(), "Clip").exists());
    }
}
