//! Embedded YouTube URL extraction from text files

use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Embedded player URL followed by an 11-character video id.
pub const EMBED_PATTERN: &str = r"https://www\.youtube\.com/embed/[a-zA-Z0-9_-]{11}";

const EMBED_PREFIX: &str = "https://www.youtube.com/embed/";

/// An extracted embed URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoSource(String);

impl VideoSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The video id after `/embed/`, if the URL has that shape.
    pub fn video_id(&self) -> Option<&str> {
        self.0.strip_prefix(EMBED_PREFIX)
    }
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoSource {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Scans text for embedded player URLs
pub struct EmbedExtractor {
    pattern: Regex,
}

impl EmbedExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(EMBED_PATTERN)?,
        })
    }

    /// All matches in order of appearance. Duplicates are kept.
    pub fn extract_from_text(&self, text: &str) -> Vec<VideoSource> {
        self.pattern
            .find_iter(text)
            .map(|m| VideoSource::new(m.as_str()))
            .collect()
    }

    /// Read `path` as UTF-8 text and extract every embed URL in it
    pub async fn extract_from_file(&self, path: &Path) -> Result<Vec<VideoSource>> {
        let text = tokio::fs::read_to_string(path).await?;
        let urls = self.extract_from_text(&text);
        info!("Extracted {} video URLs from {}", urls.len(), path.display());
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrationError;
    use std::io::Write;

    #[test]
    fn finds_single_embed_among_unrelated_text() {
        let extractor = EmbedExtractor::new().unwrap();
        let text = r#"<p>intro</p><iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ" width="560"></iframe> more"#;
        let urls = extractor.extract_from_text(text);
        assert_eq!(
            urls,
            vec![VideoSource::new("https://www.youtube.com/embed/dQw4w9WgXcQ")]
        );
        assert_eq!(urls[0].video_id(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn keeps_file_order_and_duplicates() {
        let extractor = EmbedExtractor::new().unwrap();
        let text = "a https://www.youtube.com/embed/BBBBBBBBBBB \
                    b https://www.youtube.com/embed/AAAAAAAAAAA \
                    c https://www.youtube.com/embed/BBBBBBBBBBB";
        let urls: Vec<_> = extractor
            .extract_from_text(text)
            .into_iter()
            .map(|u| u.as_str().to_string())
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://www.youtube.com/embed/BBBBBBBBBBB",
                "https://www.youtube.com/embed/AAAAAAAAAAA",
                "https://www.youtube.com/embed/BBBBBBBBBBB",
            ]
        );
    }

    #[test]
    fn takes_exactly_eleven_id_characters() {
        let extractor = EmbedExtractor::new().unwrap();
        let urls = extractor.extract_from_text("https://www.youtube.com/embed/abc_-123XYZextra");
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].as_str(), "https://www.youtube.com/embed/abc_-123XYZ");
    }

    #[test]
    fn ignores_near_misses() {
        let extractor = EmbedExtractor::new().unwrap();
        let text = "https://www.youtube.com/embed/short \
                    http://www.youtube.com/embed/dQw4w9WgXcQ \
                    https://wwwXyoutube.com/embed/dQw4w9WgXcQ \
                    https://www.youtube.com/watch?v=dQw4w9WgXcQ";
        assert!(extractor.extract_from_text(text).is_empty());
    }

    #[test]
    fn reads_urls_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "see https://www.youtube.com/embed/dQw4w9WgXcQ here").unwrap();
        let extractor = EmbedExtractor::new().unwrap();
        let urls = tokio_test::block_on(extractor.extract_from_file(file.path())).unwrap();
        assert_eq!(urls.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = EmbedExtractor::new().unwrap();
        let err = extractor
            .extract_from_file(&dir.path().join("absent.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::IoError(_)));
    }
}
