//! Local files staged for multipart upload.

use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};

use crate::error::ApiError;

/// Fallback content type when the extension is not recognised.
const OCTET_STREAM: &str = "application/octet-stream";

/// A local file handle plus the name and content type to upload it as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub name: String,
    pub mime_type: String,
}

impl LocalFile {
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Derive the upload name from the file name and the content type
    /// from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = mime_for_path(&path).to_string();
        Self {
            path,
            name,
            mime_type,
        }
    }

    /// Read the file and build the multipart form (`file`, `name`, `type`).
    pub(crate) async fn to_form(&self) -> Result<Form, ApiError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|source| ApiError::Io {
            path: self.path.clone(),
            source,
        })?;

        let part = Part::bytes(bytes)
            .file_name(self.name.clone())
            .mime_str(&self.mime_type)?;

        Ok(Form::new()
            .part("file", part)
            .text("name", self.name.clone())
            .text("type", self.mime_type.clone()))
    }
}

/// Content type for the handful of formats the app accepts.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "txt" => "text/plain",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => OCTET_STREAM,
    }
}
