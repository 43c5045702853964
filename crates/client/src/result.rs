//! Opaque operation results.

use serde::{Deserialize, Serialize};

use pdfmate_core::files::FileDescriptor;

const FILE_POINTERS: [&str; 3] = ["/file", "/result/file", "/data/file"];

/// JSON returned by a backend operation.
///
/// The client does not interpret the shape beyond [`file`](Self::file),
/// which digs out a file descriptor for display when one is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationResult(serde_json::Value);

impl OperationResult {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// The produced file, looked up under `file`, `result.file` or `data.file`.
    pub fn file(&self) -> Option<FileDescriptor> {
        FILE_POINTERS.iter().find_map(|pointer| {
            let file = self.0.pointer(pointer)?;
            serde_json::from_value(file.clone()).ok()
        })
    }
}

/// Look for a descriptor under the given wrapper keys only.
pub(crate) fn find_descriptor(value: &serde_json::Value, keys: &[&str]) -> Option<FileDescriptor> {
    for key in keys {
        let Some(inner) = value.get(*key) else {
            continue;
        };
        if let Ok(descriptor) = serde_json::from_value::<FileDescriptor>(inner.clone()) {
            return Some(descriptor);
        }
        if let Some(file) = inner.get("file") {
            if let Ok(descriptor) = serde_json::from_value::<FileDescriptor>(file.clone()) {
                return Some(descriptor);
            }
        }
    }
    None
}
