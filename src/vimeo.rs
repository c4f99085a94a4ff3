//! Vimeo API client

use crate::client::HttpClient;
use crate::config::VimeoCredentials;
use crate::error::{MigrationError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};
use url::Url;

const VIMEO_ACCEPT: &str = "application/vnd.vimeo.*+json;version=3.4";
const TUS_VERSION: &str = "1.0.0";

/// Diagnostic header Vimeo attaches to API responses
pub const REQUEST_HASH_HEADER: &str = "Request-Hash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privacy {
    pub view: String,
    pub comments: String,
}

impl Default for Privacy {
    /// Publicly viewable, comments disabled
    fn default() -> Self {
        Self {
            view: "anybody".to_string(),
            comments: "nobody".to_string(),
        }
    }
}

/// Name, description and privacy sent with an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub name: String,
    pub description: String,
    pub privacy: Privacy,
}

impl UploadMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            privacy: Privacy::default(),
        }
    }
}

/// Status, headers and body of an API call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn request_hash(&self) -> Option<&str> {
        self.header(REQUEST_HASH_HEADER)
    }
}

/// Video upload client
#[async_trait]
pub trait VideoHost: Send + Sync {
    /// Upload a local video file. Returns the resource URI, e.g. `/videos/123`.
    async fn upload(&self, path: &Path, metadata: &UploadMetadata) -> Result<String>;

    async fn get(&self, path: &str) -> Result<ApiResponse>;

    async fn post_file(&self, path: &str, data: Bytes, params: &[(&str, &str)]) -> Result<ApiResponse>;
}

#[derive(Debug, Deserialize)]
struct CreatedVideo {
    uri: String,
    upload: UploadTicket,
}

#[derive(Debug, Deserialize)]
struct UploadTicket {
    upload_link: String,
}

/// [`VideoHost`] talking to the Vimeo REST API with a personal access token
pub struct VimeoClient {
    http: HttpClient,
    base: Url,
    credentials: VimeoCredentials,
}

impl VimeoClient {
    pub fn new(http: HttpClient, api_base: &str, credentials: &VimeoCredentials) -> Result<Self> {
        let base = Url::parse(api_base)?;
        debug!(client_id = %credentials.client_id, "Created Vimeo client for {}", base);
        Ok(Self {
            http,
            base,
            credentials: credentials.clone(),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("bearer {}", self.credentials.access_token))
            .map_err(|e| MigrationError::ConfigError(format!("Invalid access token: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static(VIMEO_ACCEPT));
        Ok(headers)
    }

    async fn into_api_response(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    fn require_success(path: &str, response: ApiResponse) -> Result<ApiResponse> {
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(MigrationError::ApiError {
                path: path.to_string(),
                status: response.status.as_u16(),
                body: response.body,
            })
        }
    }

    async fn create_video(&self, size: u64, metadata: &UploadMetadata) -> Result<CreatedVideo> {
        let body = serde_json::json!({
            "upload": { "approach": "tus", "size": size },
            "name": metadata.name,
            "description": metadata.description,
            "privacy": metadata.privacy,
        });

        let response = self
            .http
            .inner()
            .post(self.endpoint("/me/videos")?)
            .headers(self.auth_headers()?)
            .json(&body)
            .send()
            .await?;
        let response = Self::require_success("/me/videos", Self::into_api_response(response).await?)?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Stream `path` to the tus upload link in a single PATCH.
    async fn send_video_file(&self, upload_link: &str, path: &Path, size: u64) -> Result<()> {
        let file = tokio::fs::File::open(path).await?;
        let body = Body::wrap_stream(ReaderStream::new(file));

        let response = self
            .http
            .inner()
            .request(Method::PATCH, upload_link)
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Offset", "0")
            .header(CONTENT_TYPE, "application/offset+octet-stream")
            .header(CONTENT_LENGTH, size)
            .body(body)
            .send()
            .await?;
        Self::require_success(upload_link, Self::into_api_response(response).await?)?;
        Ok(())
    }

    async fn confirm_offset(&self, upload_link: &str, expected: u64) -> Result<()> {
        let response = self
            .http
            .inner()
            .head(upload_link)
            .header("Tus-Resumable", TUS_VERSION)
            .send()
            .await?;
        let response = Self::require_success(upload_link, Self::into_api_response(response).await?)?;
        let offset = response
            .header("Upload-Offset")
            .and_then(|v| v.parse::<u64>().ok());

        match offset {
            Some(offset) if offset == expected => Ok(()),
            other => Err(MigrationError::UploadFailed(format!(
                "upload incomplete: server has {:?} of {} bytes",
                other, expected
            ))),
        }
    }
}

#[async_trait]
impl VideoHost for VimeoClient {
    async fn upload(&self, path: &Path, metadata: &UploadMetadata) -> Result<String> {
        let size = tokio::fs::metadata(path).await?.len();

        let created = self.create_video(size, metadata).await?;
        debug!("Created {} with upload link {}", created.uri, created.upload.upload_link);

        self.send_video_file(&created.upload.upload_link, path, size).await?;
        self.confirm_offset(&created.upload.upload_link, size).await?;

        info!("Uploaded {} bytes to {}", size, created.uri);
        Ok(created.uri)
    }

    async fn get(&self, path: &str) -> Result<ApiResponse> {
        let response = self
            .http
            .inner()
            .get(self.endpoint(path)?)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        Self::into_api_response(response).await
    }

    async fn post_file(&self, path: &str, data: Bytes, params: &[(&str, &str)]) -> Result<ApiResponse> {
        let response = self
            .http
            .inner()
            .post(self.endpoint(path)?)
            .headers(self.auth_headers()?)
            .query(params)
            .body(data)
            .send()
            .await?;
        Self::into_api_response(response).await
    }
}
