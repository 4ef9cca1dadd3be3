//! Turns a single user-selected file into the payload the relay expects.
//!
//! The declared MIME type is the only signal used: `image/*` files are read as
//! base64 data URLs, everything else as UTF-8 text.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::models::UploadRequest;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a file: {0}")]
    NotAFile(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Text,
}

impl UploadKind {
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            UploadKind::Image
        } else {
            UploadKind::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectedUpload {
    pub content: String,
    pub file_name: String,
    pub kind: UploadKind,
}

impl From<CollectedUpload> for UploadRequest {
    fn from(upload: CollectedUpload) -> Self {
        UploadRequest {
            content: upload.content,
            file_name: upload.file_name,
            is_image: upload.kind == UploadKind::Image,
        }
    }
}

pub fn collect_bytes(file_name: &str, mime: &str, bytes: &[u8]) -> CollectedUpload {
    let kind = UploadKind::from_mime(mime);
    let content = match kind {
        UploadKind::Image => format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        UploadKind::Text => String::from_utf8_lossy(bytes).into_owned(),
    };

    CollectedUpload {
        content,
        file_name: file_name.to_string(),
        kind,
    }
}

/// MIME type guessed from the file extension; empty when unknown.
pub fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or_default()
        .to_string()
}

/// Reads one file from disk. `declared_mime` overrides the extension-based guess.
pub async fn collect_file(
    path: &Path,
    declared_mime: Option<&str>,
) -> Result<CollectedUpload, UploadError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| UploadError::NotAFile(path.to_path_buf()))?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let mime = match declared_mime {
        Some(mime) => mime.to_string(),
        None => guess_mime(path),
    };

    let upload = collect_bytes(&file_name, &mime, &bytes);
    info!(
        file_name = %upload.file_name,
        mime = %mime,
        kind = ?upload.kind,
        bytes = bytes.len(),
        "Collected upload"
    );
    Ok(upload)
}
