//! Upload-then-transform pipeline with coarse progress reporting.
//!
//! [`PdfService`] stages local files on the backend one at a time, then
//! issues the transform. Progress is reported through milestones only:
//! uploads fill `[0, 0.3]`, then one `Processing` update, then one
//! `Completed` update when the backend answers.
//!
//! Nothing is cancelled or rolled back: if a later upload or the
//! transform fails, earlier uploads stay on the backend.

use std::path::PathBuf;

use pdfmate_core::files::FileDescriptor;
use pdfmate_core::options::OperationKind;
use pdfmate_core::progress::{MilestoneTracker, ProgressFn};
use pdfmate_core::types::OptionMap;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{file_ids, ChatMessage};
use crate::result::OperationResult;
use crate::upload::LocalFile;

/// A sequential multi-file upload stopped at the first failure.
#[derive(Debug, thiserror::Error)]
#[error("Upload of {} failed after {} file(s): {source}", path.display(), uploaded.len())]
pub struct BatchUploadError {
    /// Files uploaded before the failure, in order.
    pub uploaded: Vec<FileDescriptor>,
    /// Zero-based index of the file that failed.
    pub failed_index: usize,
    pub path: PathBuf,
    #[source]
    pub source: ApiError,
}

impl From<BatchUploadError> for ApiError {
    fn from(err: BatchUploadError) -> Self {
        err.source
    }
}

/// High-level PDF operations over [`ApiClient`].
#[derive(Clone)]
pub struct PdfService {
    api: ApiClient,
}

impl PdfService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Upload `files` strictly in order.
    ///
    /// The next upload does not start until the previous one resolves. On
    /// the first failure the remaining files are never attempted and the
    /// error carries the descriptors of the files that did succeed.
    pub async fn upload_files(
        &self,
        files: &[LocalFile],
        progress: Option<ProgressFn<'_>>,
    ) -> Result<Vec<FileDescriptor>, BatchUploadError> {
        let mut tracker = MilestoneTracker::new(progress);
        self.upload_all(files, &mut tracker).await
    }

    /// Upload and merge `files` into one PDF named `output_name`.
    pub async fn merge(
        &self,
        files: &[LocalFile],
        output_name: &str,
        overrides: &OptionMap,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<OperationResult, ApiError> {
        let mut tracker = MilestoneTracker::new(progress);
        let uploaded = self.upload_all(files, &mut tracker).await?;

        tracker.processing();
        let result = self
            .api
            .merge_pdfs(&file_ids(&uploaded), output_name, overrides)
            .await?;
        finish(&mut tracker, OperationKind::Merge, &result);
        Ok(result)
    }

    /// Upload image files and combine them into one PDF.
    pub async fn images_to_pdf(
        &self,
        images: &[LocalFile],
        output_name: &str,
        overrides: &OptionMap,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<OperationResult, ApiError> {
        let mut tracker = MilestoneTracker::new(progress);
        let uploaded = self.upload_all(images, &mut tracker).await?;

        tracker.processing();
        let result = self
            .api
            .images_to_pdf(&file_ids(&uploaded), output_name, overrides)
            .await?;
        finish(&mut tracker, OperationKind::ImageToPdf, &result);
        Ok(result)
    }

    /// Upload and compress one PDF.
    pub async fn compress(
        &self,
        file: &LocalFile,
        output_name: &str,
        overrides: &OptionMap,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<OperationResult, ApiError> {
        let mut tracker = MilestoneTracker::new(progress);
        let uploaded = self.upload_one(file, &mut tracker).await?;

        tracker.processing();
        let result = self
            .api
            .compress_pdf(&uploaded.id, output_name, overrides)
            .await?;
        finish(&mut tracker, OperationKind::Compress, &result);
        Ok(result)
    }

    /// Upload and split one PDF.
    pub async fn split(
        &self,
        file: &LocalFile,
        overrides: &OptionMap,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<OperationResult, ApiError> {
        let mut tracker = MilestoneTracker::new(progress);
        let uploaded = self.upload_one(file, &mut tracker).await?;

        tracker.processing();
        let result = self.api.split_pdf(&uploaded.id, overrides).await?;
        finish(&mut tracker, OperationKind::Split, &result);
        Ok(result)
    }

    /// Upload one PDF and convert it to another format.
    pub async fn convert(
        &self,
        file: &LocalFile,
        overrides: &OptionMap,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<OperationResult, ApiError> {
        let mut tracker = MilestoneTracker::new(progress);
        let uploaded = self.upload_one(file, &mut tracker).await?;

        tracker.processing();
        let result = self.api.convert_pdf(&uploaded.id, overrides).await?;
        finish(&mut tracker, OperationKind::Convert, &result);
        Ok(result)
    }

    /// Upload one scanned document and run OCR on it.
    pub async fn ocr(
        &self,
        file: &LocalFile,
        overrides: &OptionMap,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<OperationResult, ApiError> {
        let mut tracker = MilestoneTracker::new(progress);
        let uploaded = self.upload_one(file, &mut tracker).await?;

        tracker.processing();
        let result = self.api.ocr_pdf(&uploaded.id, overrides).await?;
        finish(&mut tracker, OperationKind::Ocr, &result);
        Ok(result)
    }

    /// Upload one PDF and summarize it.
    pub async fn summarize(
        &self,
        file: &LocalFile,
        overrides: &OptionMap,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<OperationResult, ApiError> {
        let mut tracker = MilestoneTracker::new(progress);
        let uploaded = self.upload_one(file, &mut tracker).await?;

        tracker.processing();
        let result = self.api.summarize_pdf(&uploaded.id, overrides).await?;
        finish(&mut tracker, OperationKind::Summarize, &result);
        Ok(result)
    }

    /// Ask a question about an already-uploaded file. No progress.
    pub async fn chat(
        &self,
        file_id: &str,
        message: &str,
        history: &[ChatMessage],
        overrides: &OptionMap,
    ) -> Result<OperationResult, ApiError> {
        self.api
            .chat_with_pdf(file_id, message, history, overrides)
            .await
    }

    // ---- private helpers ----

    async fn upload_one(
        &self,
        file: &LocalFile,
        tracker: &mut MilestoneTracker<'_>,
    ) -> Result<FileDescriptor, ApiError> {
        let mut uploaded = self
            .upload_all(std::slice::from_ref(file), tracker)
            .await?;
        uploaded
            .pop()
            .ok_or_else(|| ApiError::UnexpectedResponse("upload returned nothing".into()))
    }

    async fn upload_all(
        &self,
        files: &[LocalFile],
        tracker: &mut MilestoneTracker<'_>,
    ) -> Result<Vec<FileDescriptor>, BatchUploadError> {
        let total = files.len();
        let mut uploaded = Vec::with_capacity(total);
        tracker.upload_started(total);

        for (index, file) in files.iter().enumerate() {
            match self.api.upload_file(file).await {
                Ok(descriptor) => {
                    tracing::debug!(
                        file_id = %descriptor.id,
                        index,
                        total,
                        "File uploaded",
                    );
                    uploaded.push(descriptor);
                    tracker.file_uploaded(index + 1, total);
                }
                Err(source) => {
                    tracing::error!(
                        path = %file.path.display(),
                        index,
                        total,
                        error = %source,
                        "Upload failed, skipping remaining files",
                    );
                    return Err(BatchUploadError {
                        uploaded,
                        failed_index: index,
                        path: file.path.clone(),
                        source,
                    });
                }
            }
        }

        Ok(uploaded)
    }
}

fn finish(tracker: &mut MilestoneTracker<'_>, kind: OperationKind, result: &OperationResult) {
    tracker.completed();
    tracing::info!(
        operation = %kind,
        output = ?result.file().map(|f| f.id),
        "Operation completed",
    );
}
