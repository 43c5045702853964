//! File descriptors returned by the backend.

use serde::{Deserialize, Serialize};

use crate::types::{FileId, Timestamp};

/// A file known to the backend, as shown in lists and recent-file views.
///
/// Only `id` and `name` are guaranteed; everything else is best effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: FileId,
    pub name: String,
    #[serde(default, alias = "type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}
