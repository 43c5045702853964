//! REST API client for the pdfmate backend.
//!
//! Wraps the backend HTTP API (files, PDF transforms, AI operations, user
//! profile/stats, batch jobs, folders) using [`reqwest`]. Every call is a
//! single request; there is no retry, caching or batching here.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;

use pdfmate_core::account::{Profile, ProfileUpdate};
use pdfmate_core::files::FileDescriptor;
use pdfmate_core::options::{
    merge_options, resolve, BatchOptions, ChatOptions, CompressOptions, ConvertOptions,
    ImageToPdfOptions, MergeOptions, OcrOptions, OperationKind, SplitOptions, SummarizeOptions,
};
use pdfmate_core::token::TokenSource;
use pdfmate_core::types::{FileId, OptionMap};

use crate::config::ClientConfig;
use crate::error::{error_message, ApiError};
use crate::models::{ChatMessage, FilePage, FileQuery, FileUpdate, Folder, PageQuery};
use crate::result::{find_descriptor, OperationResult};
use crate::upload::LocalFile;

/// HTTP client for the pdfmate backend.
///
/// Cheap to clone: the connection pool and token source are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    config: ClientConfig,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    /// Create a client with its own connection pool.
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self::with_client(reqwest::Client::new(), config, tokens)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        config: ClientConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client,
            config,
            tokens,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ---- health ----

    /// `GET /health`. The only unauthenticated endpoint.
    pub async fn health(&self) -> Result<serde_json::Value, ApiError> {
        let request = self
            .client
            .get(self.url("/health"))
            .timeout(self.config.request_timeout);
        self.send_json(request).await
    }

    // ---- files ----

    /// `GET /files?page=&limit=&search=&type=`.
    pub async fn list_files(&self, query: &FileQuery) -> Result<FilePage, ApiError> {
        let request = self.authorized(Method::GET, "/files").await?.query(query);
        self.send_json(request).await
    }

    /// `GET /files/{id}`.
    pub async fn get_file(&self, file_id: &str) -> Result<FileDescriptor, ApiError> {
        let request = self
            .authorized(Method::GET, &format!("/files/{file_id}"))
            .await?;
        let value: serde_json::Value = self.send_json(request).await?;
        descriptor_from(value)
    }

    /// `POST /files/upload` as multipart form data.
    ///
    /// A file must be uploaded before any transform can reference it.
    pub async fn upload_file(&self, file: &LocalFile) -> Result<FileDescriptor, ApiError> {
        let form = file.to_form().await?;
        let request = self
            .authorized(Method::POST, "/files/upload")
            .await?
            .timeout(self.config.upload_timeout)
            .multipart(form);

        tracing::debug!(name = %file.name, mime = %file.mime_type, "Uploading file");
        let value: serde_json::Value = self.send_json(request).await?;
        descriptor_from(value)
    }

    /// `PUT /files/{id}` (rename or move to a folder).
    pub async fn update_file(
        &self,
        file_id: &str,
        update: &FileUpdate,
    ) -> Result<FileDescriptor, ApiError> {
        let request = self
            .authorized(Method::PUT, &format!("/files/{file_id}"))
            .await?
            .json(update);
        let value: serde_json::Value = self.send_json(request).await?;
        descriptor_from(value)
    }

    /// `DELETE /files/{id}`.
    pub async fn delete_file(&self, file_id: &str) -> Result<(), ApiError> {
        let request = self
            .authorized(Method::DELETE, &format!("/files/{file_id}"))
            .await?;
        self.send_empty(request).await
    }

    // ---- PDF transforms ----

    /// `POST /pdf/merge`.
    pub async fn merge_pdfs(
        &self,
        file_ids: &[FileId],
        output_name: &str,
        overrides: &OptionMap,
    ) -> Result<OperationResult, ApiError> {
        let body = json!({
            "fileIds": file_ids,
            "outputName": output_name,
            "options": resolve::<MergeOptions>(overrides),
        });
        self.post_operation("/pdf/merge", &body).await
    }

    /// `POST /pdf/split`.
    pub async fn split_pdf(
        &self,
        file_id: &str,
        overrides: &OptionMap,
    ) -> Result<OperationResult, ApiError> {
        let body = json!({
            "fileId": file_id,
            "options": resolve::<SplitOptions>(overrides),
        });
        self.post_operation("/pdf/split", &body).await
    }

    /// `POST /pdf/compress`.
    pub async fn compress_pdf(
        &self,
        file_id: &str,
        output_name: &str,
        overrides: &OptionMap,
    ) -> Result<OperationResult, ApiError> {
        let body = json!({
            "fileId": file_id,
            "outputName": output_name,
            "options": resolve::<CompressOptions>(overrides),
        });
        self.post_operation("/pdf/compress", &body).await
    }

    /// `POST /pdf/convert`.
    pub async fn convert_pdf(
        &self,
        file_id: &str,
        overrides: &OptionMap,
    ) -> Result<OperationResult, ApiError> {
        let body = json!({
            "fileId": file_id,
            "options": resolve::<ConvertOptions>(overrides),
        });
        self.post_operation("/pdf/convert", &body).await
    }

    /// `POST /pdf/image-to-pdf`.
    pub async fn images_to_pdf(
        &self,
        file_ids: &[FileId],
        output_name: &str,
        overrides: &OptionMap,
    ) -> Result<OperationResult, ApiError> {
        let body = json!({
            "fileIds": file_ids,
            "outputName": output_name,
            "options": resolve::<ImageToPdfOptions>(overrides),
        });
        self.post_operation("/pdf/image-to-pdf", &body).await
    }

    /// `POST /pdf/ocr`.
    pub async fn ocr_pdf(
        &self,
        file_id: &str,
        overrides: &OptionMap,
    ) -> Result<OperationResult, ApiError> {
        let body = json!({
            "fileId": file_id,
            "options": resolve::<OcrOptions>(overrides),
        });
        self.post_operation("/pdf/ocr", &body).await
    }

    // ---- AI ----

    /// `POST /ai/summarize`.
    pub async fn summarize_pdf(
        &self,
        file_id: &str,
        overrides: &OptionMap,
    ) -> Result<OperationResult, ApiError> {
        let body = json!({
            "fileId": file_id,
            "options": resolve::<SummarizeOptions>(overrides),
        });
        self.post_operation("/ai/summarize", &body).await
    }

    /// `POST /ai/chat`. `history` holds earlier turns, oldest first.
    pub async fn chat_with_pdf(
        &self,
        file_id: &str,
        message: &str,
        history: &[ChatMessage],
        overrides: &OptionMap,
    ) -> Result<OperationResult, ApiError> {
        let body = json!({
            "fileId": file_id,
            "message": message,
            "history": history,
            "options": resolve::<ChatOptions>(overrides),
        });
        self.post_operation("/ai/chat", &body).await
    }

    // ---- user ----

    /// `GET /user/profile`.
    pub async fn get_profile(&self) -> Result<Profile, ApiError> {
        let request = self.authorized(Method::GET, "/user/profile").await?;
        let value: serde_json::Value = self.send_json(request).await?;
        unwrap_envelope(value, "profile")
    }

    /// `PUT /user/profile`.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        let request = self
            .authorized(Method::PUT, "/user/profile")
            .await?
            .json(update);
        let value: serde_json::Value = self.send_json(request).await?;
        unwrap_envelope(value, "profile")
    }

    /// `GET /user/stats`. The shape is owned by the backend.
    pub async fn get_stats(&self) -> Result<serde_json::Value, ApiError> {
        let request = self.authorized(Method::GET, "/user/stats").await?;
        self.send_json(request).await
    }

    // ---- batch ----

    /// `POST /batch`: run one operation over many uploaded files.
    ///
    /// `options` are resolved against the operation's defaults and
    /// `batch_options` against [`BatchOptions`].
    pub async fn create_batch(
        &self,
        operation: OperationKind,
        file_ids: &[FileId],
        options: &OptionMap,
        batch_options: &OptionMap,
    ) -> Result<OperationResult, ApiError> {
        let body = json!({
            "operation": operation,
            "fileIds": file_ids,
            "options": merge_options(operation.default_options(), options),
            "batchOptions": resolve::<BatchOptions>(batch_options),
        });
        self.post_operation("/batch", &body).await
    }

    /// `GET /batch/{id}`.
    pub async fn get_batch(&self, batch_id: &str) -> Result<serde_json::Value, ApiError> {
        let request = self
            .authorized(Method::GET, &format!("/batch/{batch_id}"))
            .await?;
        self.send_json(request).await
    }

    /// `GET /batch?page=&limit=`.
    pub async fn list_batches(&self, page: &PageQuery) -> Result<serde_json::Value, ApiError> {
        let request = self.authorized(Method::GET, "/batch").await?.query(page);
        self.send_json(request).await
    }

    // ---- folders ----

    /// `GET /folders`.
    pub async fn list_folders(&self) -> Result<Vec<Folder>, ApiError> {
        let request = self.authorized(Method::GET, "/folders").await?;
        let value: serde_json::Value = self.send_json(request).await?;
        unwrap_envelope(value, "folders")
    }

    /// `POST /folders`.
    pub async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Folder, ApiError> {
        let request = self
            .authorized(Method::POST, "/folders")
            .await?
            .json(&json!({ "name": name, "parentId": parent_id }));
        let value: serde_json::Value = self.send_json(request).await?;
        unwrap_envelope(value, "folder")
    }

    /// `PUT /folders/{id}`.
    pub async fn rename_folder(&self, folder_id: &str, name: &str) -> Result<Folder, ApiError> {
        let request = self
            .authorized(Method::PUT, &format!("/folders/{folder_id}"))
            .await?
            .json(&json!({ "name": name }));
        let value: serde_json::Value = self.send_json(request).await?;
        unwrap_envelope(value, "folder")
    }

    /// `DELETE /folders/{id}`.
    pub async fn delete_folder(&self, folder_id: &str) -> Result<(), ApiError> {
        let request = self
            .authorized(Method::DELETE, &format!("/folders/{folder_id}"))
            .await?;
        self.send_empty(request).await
    }

    /// `POST /folders/{id}/files`.
    pub async fn move_files_to_folder(
        &self,
        folder_id: &str,
        file_ids: &[FileId],
    ) -> Result<serde_json::Value, ApiError> {
        let request = self
            .authorized(Method::POST, &format!("/folders/{folder_id}/files"))
            .await?
            .json(&json!({ "fileIds": file_ids }));
        self.send_json(request).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    /// Build a request carrying the current bearer token.
    ///
    /// Fails with [`ApiError::Unauthenticated`] without touching the
    /// network when there is no session.
    async fn authorized(
        &self,
        method: Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let token = self
            .tokens
            .access_token()
            .await
            .ok_or(ApiError::Unauthenticated)?;
        Ok(self
            .client
            .request(method, self.url(path))
            .timeout(self.config.request_timeout)
            .bearer_auth(token))
    }

    async fn post_operation(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<OperationResult, ApiError> {
        let request = self.authorized(Method::POST, path).await?.json(body);
        tracing::debug!(path, "Dispatching operation");
        self.send_json(request).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(&self, request: reqwest::RequestBuilder) -> Result<(), ApiError> {
        Self::ensure_success(request.send().await?).await?;
        Ok(())
    }

    /// Return the response unchanged on a 2xx status, otherwise an
    /// [`ApiError::Http`] carrying the best-effort server message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        let message = error_message(status.as_u16(), &body);
        tracing::error!(status = status.as_u16(), path = %url, error = %message, "Backend request failed");

        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

/// Decode a file descriptor returned bare or under `file` / `data`.
fn descriptor_from(value: serde_json::Value) -> Result<FileDescriptor, ApiError> {
    find_descriptor(&value, &["file", "data"])
        .or_else(|| serde_json::from_value(value).ok())
        .ok_or_else(|| ApiError::UnexpectedResponse("response has no file descriptor".into()))
}

/// Decode `T` from either `{ "<key>": T }`, `{ "data": T }` or a bare `T`.
fn unwrap_envelope<T: DeserializeOwned>(
    value: serde_json::Value,
    key: &str,
) -> Result<T, ApiError> {
    let inner = match value {
        serde_json::Value::Object(mut obj) if obj.contains_key(key) || obj.contains_key("data") => {
            obj.remove(key).or_else(|| obj.remove("data")).unwrap_or_default()
        }
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| ApiError::UnexpectedResponse(e.to_string()))
}
