//! Per-operation option structs and the default/override merge.
//!
//! Every backend operation has a struct whose [`Default`] impl is the
//! documented default table for that operation. Callers pass overrides as
//! a loose [`OptionMap`]; [`resolve`] shallow-merges them over the
//! defaults to produce the mapping that goes on the wire.
//!
//! Field names serialize in camelCase to match the backend.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::OptionMap;

// ---------------------------------------------------------------------------
// Operation kinds
// ---------------------------------------------------------------------------

/// One backend-invoked PDF operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Merge,
    Split,
    Compress,
    Convert,
    ImageToPdf,
    Ocr,
    Summarize,
    Chat,
    Batch,
}

impl OperationKind {
    pub const ALL: [OperationKind; 9] = [
        Self::Merge,
        Self::Split,
        Self::Compress,
        Self::Convert,
        Self::ImageToPdf,
        Self::Ocr,
        Self::Summarize,
        Self::Chat,
        Self::Batch,
    ];

    /// Wire name, as used in batch requests.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Split => "split",
            Self::Compress => "compress",
            Self::Convert => "convert",
            Self::ImageToPdf => "imageToPdf",
            Self::Ocr => "ocr",
            Self::Summarize => "summarize",
            Self::Chat => "chat",
            Self::Batch => "batch",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| CoreError::Validation(format!("Unknown operation '{name}'")))
    }

    /// The documented default option mapping for this operation.
    pub fn default_options(self) -> OptionMap {
        match self {
            Self::Merge => MergeOptions::default_map(),
            Self::Split => SplitOptions::default_map(),
            Self::Compress => CompressOptions::default_map(),
            Self::Convert => ConvertOptions::default_map(),
            Self::ImageToPdf => ImageToPdfOptions::default_map(),
            Self::Ocr => OcrOptions::default_map(),
            Self::Summarize => SummarizeOptions::default_map(),
            Self::Chat => ChatOptions::default_map(),
            Self::Batch => BatchOptions::default_map(),
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Defaults and merging
// ---------------------------------------------------------------------------

/// A typed option struct with a documented default table.
pub trait OperationOptions: Serialize + Default {
    const KIND: OperationKind;

    /// Serialize into a wire mapping.
    fn to_map(&self) -> OptionMap {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => OptionMap::new(),
        }
    }

    fn default_map() -> OptionMap {
        Self::default().to_map()
    }
}

/// Shallow-merge `overrides` over `defaults`.
///
/// Same-named keys are replaced wholesale (nested objects included), keys
/// absent from `overrides` keep their default, and keys unknown to the
/// defaults are passed through untouched.
pub fn merge_options(mut defaults: OptionMap, overrides: &OptionMap) -> OptionMap {
    for (key, value) in overrides {
        defaults.insert(key.clone(), value.clone());
    }
    defaults
}

/// Resolve caller overrides against the defaults for `T`.
pub fn resolve<T: OperationOptions>(overrides: &OptionMap) -> OptionMap {
    merge_options(T::default_map(), overrides)
}

/// Build an override map from a JSON object literal.
///
/// Anything other than an object yields an empty map, i.e. "use defaults".
pub fn overrides(value: serde_json::Value) -> OptionMap {
    match value {
        serde_json::Value::Object(map) => map,
        _ => OptionMap::new(),
    }
}

// ---------------------------------------------------------------------------
// Option structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOptions {
    /// One bookmark per source document (default: `true`).
    pub add_bookmarks: bool,
    pub preserve_metadata: bool,
    pub page_numbers: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            add_bookmarks: true,
            preserve_metadata: true,
            page_numbers: false,
        }
    }
}

impl OperationOptions for MergeOptions {
    const KIND: OperationKind = OperationKind::Merge;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Fixed number of pages per output file.
    Pages,
    /// Explicit page ranges such as `"1-3"`.
    Ranges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitOptions {
    pub split_mode: SplitMode,
    pub pages_per_file: u32,
    /// Only consulted in [`SplitMode::Ranges`].
    pub ranges: Vec<String>,
    pub preserve_bookmarks: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            split_mode: SplitMode::Pages,
            pages_per_file: 1,
            ranges: Vec::new(),
            preserve_bookmarks: true,
        }
    }
}

impl OperationOptions for SplitOptions {
    const KIND: OperationKind = OperationKind::Split;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    Medium,
    High,
}

/// Compression defaults: medium level, image quality 85, image
/// optimisation on, metadata kept, colour kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressOptions {
    pub compression_level: CompressionLevel,
    /// JPEG quality for re-encoded images, 1-100.
    pub image_quality: u8,
    pub optimize_images: bool,
    pub remove_metadata: bool,
    pub grayscale: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            compression_level: CompressionLevel::Medium,
            image_quality: 85,
            optimize_images: true,
            remove_metadata: false,
            grayscale: false,
        }
    }
}

impl OperationOptions for CompressOptions {
    const KIND: OperationKind = OperationKind::Compress;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Docx,
    Xlsx,
    Pptx,
    Txt,
    Jpg,
    Png,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOptions {
    pub target_format: TargetFormat,
    pub preserve_layout: bool,
    pub include_images: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            target_format: TargetFormat::Docx,
            preserve_layout: true,
            include_images: true,
        }
    }
}

impl OperationOptions for ConvertOptions {
    const KIND: OperationKind = OperationKind::Convert;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    A4,
    Letter,
    Legal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageToPdfOptions {
    pub page_size: PageSize,
    pub orientation: Orientation,
    /// Page margin in points.
    pub margin: u32,
    pub fit_to_page: bool,
    pub image_quality: u8,
}

impl Default for ImageToPdfOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            margin: 20,
            fit_to_page: true,
            image_quality: 90,
        }
    }
}

impl OperationOptions for ImageToPdfOptions {
    const KIND: OperationKind = OperationKind::ImageToPdf;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrOutput {
    SearchablePdf,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrOptions {
    /// Tesseract-style language code.
    pub language: String,
    pub output_format: OcrOutput,
    pub dpi: u32,
    pub deskew: bool,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            output_format: OcrOutput::SearchablePdf,
            dpi: 300,
            deskew: true,
        }
    }
}

impl OperationOptions for OcrOptions {
    const KIND: OperationKind = OperationKind::Ocr;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    Paragraph,
    Bullets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeOptions {
    pub length: SummaryLength,
    pub style: SummaryStyle,
    pub language: String,
    pub include_key_points: bool,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            length: SummaryLength::Medium,
            style: SummaryStyle::Paragraph,
            language: "en".to_string(),
            include_key_points: true,
        }
    }
}

impl OperationOptions for SummarizeOptions {
    const KIND: OperationKind = OperationKind::Summarize;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOptions {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Send the document text along with the question.
    pub include_context: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            include_context: true,
        }
    }
}

impl OperationOptions for ChatOptions {
    const KIND: OperationKind = OperationKind::Chat;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchPriority {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOptions {
    pub priority: BatchPriority,
    pub notify_on_complete: bool,
    pub continue_on_error: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            priority: BatchPriority::Normal,
            notify_on_complete: true,
            continue_on_error: false,
        }
    }
}

impl OperationOptions for BatchOptions {
    const KIND: OperationKind = OperationKind::Batch;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
