//! Media-host client for book covers and documents
//!
//! Talks to a Cloudinary-style upload API: signed multipart uploads into
//! per-asset-type folders, and signed destroy calls keyed by public id.

use crate::{config::MediaConfig, error::AppError};
use async_trait::async_trait;
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A multipart file part staged on local disk before upload
#[derive(Debug)]
pub struct StagedUpload {
    pub path: PathBuf,
    pub filename: String,
}

impl StagedUpload {
    /// Remove the staged file; failures are logged, not propagated
    pub async fn cleanup(&self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::warn!(path = %self.path.display(), "Failed to remove staged upload: {}", e);
        }
    }
}

/// Media-host operations
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload a cover image; returns its public URL
    async fn upload_cover(&self, path: &Path, filename: &str) -> Result<String, AppError>;
    /// Upload a book document; returns its public URL
    async fn upload_book_file(&self, path: &Path, filename: &str) -> Result<String, AppError>;
    async fn delete_cover(&self, url: &str) -> Result<(), AppError>;
    async fn delete_book_file(&self, url: &str) -> Result<(), AppError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Cloudinary-backed media store
pub struct CloudinaryMediaStore {
    client: reqwest::Client,
    config: MediaConfig,
}

impl CloudinaryMediaStore {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Sign request params: sorted `key=value` pairs joined with `&`, the
    /// API secret appended, hashed with SHA-256
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<_> = params.to_vec();
        sorted.sort_by_key(|(key, _)| *key);
        let payload = sorted
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hasher.update(self.config.api_secret.expose_secret().as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn upload(
        &self,
        resource_type: &str,
        folder: &str,
        public_id: &str,
        path: &Path,
        filename: &str,
    ) -> Result<String, AppError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            tracing::error!(path = %path.display(), "Failed to read staged upload: {}", e);
            AppError::Internal("Failed to read staged upload".to_string())
        })?;

        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("folder", folder),
            ("public_id", public_id),
            ("timestamp", &timestamp),
        ]);

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string()),
            )
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("public_id", public_id.to_string())
            .text("signature", signature);

        let url = format!(
            "{}/{}/{}/upload",
            self.config.base_url, self.config.cloud_name, resource_type
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Media upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "Media upload rejected");
            return Err(AppError::Upstream(format!(
                "Media host rejected upload with status {}",
                status
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Malformed media upload response: {}", e)))?;

        Ok(parsed.secure_url)
    }

    async fn destroy(&self, resource_type: &str, public_id: &str) -> Result<(), AppError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id), ("timestamp", &timestamp)]);

        let url = format!(
            "{}/{}/{}/destroy",
            self.config.base_url, self.config.cloud_name, resource_type
        );

        let response = self
            .client
            .post(&url)
            .form(&[
                ("public_id", public_id),
                ("api_key", &self.config.api_key),
                ("timestamp", &timestamp),
                ("signature", &signature),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Media delete request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Media host rejected delete with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn upload_cover(&self, path: &Path, filename: &str) -> Result<String, AppError> {
        let public_id = file_stem(filename);
        self.upload("image", &self.config.cover_folder, &public_id, path, filename)
            .await
    }

    async fn upload_book_file(&self, path: &Path, filename: &str) -> Result<String, AppError> {
        self.upload("raw", &self.config.file_folder, filename, path, filename)
            .await
    }

    async fn delete_cover(&self, url: &str) -> Result<(), AppError> {
        let public_id = cover_public_id(url)
            .ok_or_else(|| AppError::Internal("Unrecognized cover URL".to_string()))?;
        self.destroy("image", &public_id).await
    }

    async fn delete_book_file(&self, url: &str) -> Result<(), AppError> {
        let public_id = file_public_id(url)
            .ok_or_else(|| AppError::Internal("Unrecognized file URL".to_string()))?;
        self.destroy("raw", &public_id).await
    }
}

fn file_stem(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

fn last_two_segments(url: &str) -> Option<(&str, &str)> {
    let mut segments = url.trim_end_matches('/').rsplit('/');
    let last = segments.next()?;
    let second_last = segments.next()?;
    if last.is_empty() || second_last.is_empty() {
        return None;
    }
    Some((second_last, last))
}

/// Public id of an image asset: folder plus filename with its extension
/// stripped
pub(crate) fn cover_public_id(url: &str) -> Option<String> {
    let (folder, filename) = last_two_segments(url)?;
    Some(format!("{}/{}", folder, file_stem(filename)))
}

/// Public id of a raw asset: folder plus filename kept verbatim
pub(crate) fn file_public_id(url: &str) -> Option<String> {
    let (folder, filename) = last_two_segments(url)?;
    Some(format!("{}/{}", folder, filename))
}
