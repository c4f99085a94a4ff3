//! Configuration types for the migration pipeline

use crate::error::{MigrationError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Input file scanned for embed links.
pub const DEFAULT_INPUT_FILE: &str = "youtube-embed.txt";
/// Directory receiving videos, thumbnails, info files and the ledger.
pub const DEFAULT_OUTPUT_DIR: &str = "youtube";
pub const DEFAULT_VIMEO_API_BASE: &str = "https://api.vimeo.com";

pub const ENV_ACCESS_TOKEN: &str = "VIMEO_ACCESS_TOKEN";
pub const ENV_CLIENT_ID: &str = "VIMEO_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "VIMEO_CLIENT_SECRET";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse the `LOG_FORMAT` value, falling back to text output.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Process-wide migration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Text file scanned for embedded video URLs
    pub input_file: PathBuf,

    /// Output directory for every artifact the pipeline writes
    pub output_dir: PathBuf,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// User agent string
    pub user_agent: String,

    /// yt-dlp executable name or path
    pub yt_dlp_path: String,

    /// Vimeo API base URL
    pub vimeo_api_base: String,

    /// Number of URLs migrated at once (1 = strictly sequential)
    pub concurrency: usize,

    /// Refuse to write a thumbnail when the fallback fetch is not a success
    pub strict_thumbnails: bool,

    pub log_format: LogFormat,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from(DEFAULT_INPUT_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            // Uploads of large files run to completion, so this stays generous.
            request_timeout_secs: 3600,
            connect_timeout_secs: 30,
            user_agent: format!("ytmigrate/{}", env!("CARGO_PKG_VERSION")),
            yt_dlp_path: "yt-dlp".to_string(),
            vimeo_api_base: DEFAULT_VIMEO_API_BASE.to_string(),
            concurrency: 1,
            strict_thumbnails: false,
            log_format: LogFormat::Text,
        }
    }
}

impl MigrationConfig {
    /// Path of the append-only mapping ledger
    pub fn ledger_path(&self) -> PathBuf {
        self.output_dir.join(crate::storage::LEDGER_FILE_NAME)
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Vimeo API credentials, read once at startup
///
/// Every API request authenticates with the personal access token as a
/// bearer token. The client id only tags log output and the client secret is
/// never sent, but all three must be present at startup.
#[derive(Clone)]
pub struct VimeoCredentials {
    pub access_token: String,
    pub client_id: String,
    /// Validated as present, never sent
    pub client_secret: String,
}

impl VimeoCredentials {
    /// Read all three credential values from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build credentials from an arbitrary key lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| MigrationError::ConfigError(format!("{} is not set", key)))
        };

        Ok(Self {
            access_token: require(ENV_ACCESS_TOKEN)?,
            client_id: require(ENV_CLIENT_ID)?,
            client_secret: require(ENV_CLIENT_SECRET)?,
        })
    }
}

impl fmt::Debug for VimeoCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VimeoCredentials")
            .field("access_token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
