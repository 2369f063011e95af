// casup-common/src/model/upload.rs
use serde_json::Value;

/// What the client reported back for one successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadResult {
    /// Digest of the uploaded root, formatted as `<hash>/<size>`.
    pub digest: String,
    /// Per-file content details, when the client was asked for them and they parsed.
    pub file_details: Option<Vec<Value>>,
}
