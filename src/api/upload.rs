//! File upload endpoints (multipart). The content type of the request is
//! left to the multipart encoder so the boundary lands correctly; only the
//! bearer header is attached.

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;

use super::{ApiClient, ApiError};
use crate::models::{MediaFile, MediaKind};

/// Durable reference returned by the upload endpoint, with the backend's
/// coarse classification of what it stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub url: String,
    pub kind: MediaKind,
}

#[derive(Deserialize)]
struct UploadEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct MultiUploadEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    files: Option<Vec<UploadedEntry>>,
}

#[derive(Deserialize)]
struct UploadedEntry {
    url: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

fn part_for(file: &MediaFile) -> Result<Part, ApiError> {
    Part::bytes(file.bytes.clone())
        .file_name(file.name.clone())
        .mime_str(&file.content_type)
        .map_err(|e| ApiError::Transport(e.to_string()))
}

/// The response `type` is a bucket name ("images"/"audio"/"video"); an
/// unknown one is a decode failure rather than a silent misfile.
fn kind_from_bucket(bucket: Option<String>, fallback: MediaKind) -> Result<MediaKind, ApiError> {
    match bucket {
        None => Ok(fallback),
        Some(b) => MediaKind::from_bucket(&b)
            .ok_or_else(|| ApiError::Decode(format!("unknown upload bucket: {b}"))),
    }
}

impl ApiClient {
    pub async fn upload_file(&self, file: &MediaFile) -> Result<UploadedFile, ApiError> {
        let form = Form::new().part("file", part_for(file)?);
        let builder = self.request(Method::POST, "/upload")?.multipart(form);
        let response = self.send(builder).await?;
        let envelope: UploadEnvelope = Self::parse(response).await?;

        if !envelope.success {
            return Err(ApiError::rejected(envelope.message, "Upload failed"));
        }
        let url = envelope
            .url
            .ok_or_else(|| ApiError::Decode("upload envelope missing url".into()))?;
        let kind = kind_from_bucket(envelope.kind, file.kind)?;

        tracing::debug!(name = %file.name, %url, bucket = kind.bucket(), "file uploaded");
        Ok(UploadedFile { url, kind })
    }

    pub async fn upload_multiple(
        &self,
        files: &[MediaFile],
    ) -> Result<Vec<UploadedFile>, ApiError> {
        let mut form = Form::new();
        for file in files {
            form = form.part("files", part_for(file)?);
        }
        let builder = self
            .request(Method::POST, "/upload/multiple")?
            .multipart(form);
        let response = self.send(builder).await?;
        let envelope: MultiUploadEnvelope = Self::parse(response).await?;

        if !envelope.success {
            return Err(ApiError::rejected(envelope.message, "Upload failed"));
        }
        let entries = envelope
            .files
            .ok_or_else(|| ApiError::Decode("upload envelope missing files".into()))?;

        entries
            .into_iter()
            .zip(files)
            .map(|(entry, file)| {
                Ok(UploadedFile {
                    url: entry.url,
                    kind: kind_from_bucket(entry.kind, file.kind)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_envelope_renames_type_field() {
        let envelope: UploadEnvelope = serde_json::from_str(
            r#"{"success": true, "url": "/uploads/images/a.jpg", "type": "images"}"#,
        )
        .unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.kind.as_deref(), Some("images"));
    }

    #[test]
    fn unknown_bucket_is_a_decode_error() {
        let err = kind_from_bucket(Some("documents".into()), MediaKind::Image).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn missing_bucket_falls_back_to_declared_kind() {
        let kind = kind_from_bucket(None, MediaKind::Audio).unwrap();
        assert_eq!(kind, MediaKind::Audio);
    }
}
