use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::multipart::Form;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::UploadError;

pub const DEFAULT_API_BASE: &str = "https://services.leadconnectorhq.com";
const API_VERSION: &str = "2021-07-28";
const UPLOAD_ENDPOINT: &str = "/medias/upload-file";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub url: String,
    pub file_id: Option<String>,
}

/// Pushes one local file to remote media storage.
pub trait MediaUploader {
    fn upload(&self, path: &Path, parent_id: Option<&str>) -> Result<UploadedMedia, UploadError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    url: Option<String>,
    #[serde(rename = "fileId")]
    file_id: Option<String>,
}

/// Media storage client. Blocking, one request per call, no retries.
pub struct GhlClient {
    token: Option<String>,
    api_base: String,
    http: reqwest::blocking::Client,
}

impl GhlClient {
    pub fn new(token: Option<String>, api_base: impl Into<String>) -> Result<Self, UploadError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(GhlClient {
            token: token.filter(|t| !t.trim().is_empty()),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Token from `GHL_TOKEN`.
    pub fn from_env(api_base: impl Into<String>) -> Result<Self, UploadError> {
        GhlClient::new(std::env::var("GHL_TOKEN").ok(), api_base)
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

impl MediaUploader for GhlClient {
    fn upload(&self, path: &Path, parent_id: Option<&str>) -> Result<UploadedMedia, UploadError> {
        let token = self.token.as_deref().ok_or(UploadError::MissingToken)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut form = Form::new()
            .text("name", name)
            .file("file", path)
            .map_err(|source| UploadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some(parent) = parent_id.filter(|p| !p.is_empty()) {
            form = form.text("parentId", parent.to_string());
        }

        let url = format!("{}{}", self.api_base, UPLOAD_ENDPOINT);
        debug!("POST {} ({})", url, path.display());
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header("Version", API_VERSION)
            .header("Accept", "application/json")
            .multipart(form)
            .send()?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().unwrap_or_default();
            return Err(UploadError::Rejected { status, body });
        }

        let parsed: UploadResponse = response.json()?;
        let url = parsed
            .url
            .filter(|u| !u.is_empty())
            .ok_or(UploadError::MissingUrl)?;
        Ok(UploadedMedia {
            url,
            file_id: parsed.file_id,
        })
    }
}

/// Upload outcomes keyed by image path, for one batch.
///
/// Failures are remembered too, so a bad image is attempted once per batch and
/// every article that shares it gets the same (blank) result.
#[derive(Default)]
pub struct UploadCache {
    outcomes: HashMap<PathBuf, Option<String>>,
    uploads: usize,
    reused: usize,
}

impl UploadCache {
    pub fn new() -> Self {
        UploadCache::default()
    }

    /// Cached URL for `path`, uploading it first if this batch has not seen it.
    pub fn resolve(
        &mut self,
        uploader: &dyn MediaUploader,
        path: &Path,
        parent_id: Option<&str>,
    ) -> Option<String> {
        if let Some(outcome) = self.outcomes.get(path) {
            debug!("Image already uploaded this run: {}", path.display());
            self.reused += 1;
            return outcome.clone();
        }

        self.uploads += 1;
        let outcome = match uploader.upload(path, parent_id) {
            Ok(media) => {
                info!(
                    "Uploaded {} -> {} (file id {})",
                    path.display(),
                    media.url,
                    media.file_id.as_deref().unwrap_or("-")
                );
                Some(media.url)
            }
            Err(e) => {
                warn!("Upload failed for {}: {}", path.display(), e);
                None
            }
        };
        self.outcomes.insert(path.to_path_buf(), outcome.clone());
        outcome
    }

    /// Upload attempts made, successful or not.
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn reused(&self) -> usize {
        self.reused
    }
}
