//! Decentralized storage uploads.
//!
//! # Data Flow
//! ```text
//! local file ──▶ GenericFile (bytes + content type)
//!                   │
//!                   ▼
//!     Uploader::upload ──▶ irys.rs (price, fund, POST) ──▶ URI
//!                               │
//!                               ▼
//!                   bundle.rs (signed ANS-104 data item)
//! ```

pub mod bundle;
pub mod irys;

use std::future::Future;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

pub use irys::IrysUploader;

/// Errors that can occur while uploading.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with a non-success status.
    #[error("Storage node returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The data item could not be built.
    #[error("Bundle error: {0}")]
    Bundle(#[from] bundle::BundleError),

    /// Paying the node for storage failed.
    #[error("Funding error: {0}")]
    Funding(String),

    /// The node's response was missing a field we need.
    #[error("Unexpected response from storage node: {0}")]
    UnexpectedResponse(String),

    /// The uploader returned no URI.
    #[error("Upload returned no URI")]
    EmptyResponse,
}

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// A named blob with a content type, ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl GenericFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, inferring the content type from its extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file_name, content_type_for(path), bytes))
    }
}

/// MIME type for a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "json" => "application/json",
        "mp4" => "video/mp4",
        "glb" => "model/gltf-binary",
        _ => "application/octet-stream",
    }
}

/// Persists content and returns retrievable URIs.
pub trait Uploader {
    /// Upload files; returns one URI per file, in order.
    fn upload(&self, files: &[GenericFile]) -> impl Future<Output = UploadResult<Vec<String>>>;

    /// Serialize `value` as JSON and upload it.
    fn upload_json<T: Serialize>(&self, value: &T) -> impl Future<Output = UploadResult<String>> {
        async move {
            let bytes = serde_json::to_vec(value)?;
            let file = GenericFile::new("metadata.json", "application/json", bytes);
            let uris = self.upload(std::slice::from_ref(&file)).await?;
            uris.into_iter().next().ok_or(UploadError::EmptyResponse)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingUploader {
        uploaded: Mutex<Vec<GenericFile>>,
    }

    impl Uploader for RecordingUploader {
        async fn upload(&self, files: &[GenericFile]) -> UploadResult<Vec<String>> {
            let mut uploaded = self.uploaded.lock().unwrap();
            let mut uris = Vec::new();
            for file in files {
                uploaded.push(file.clone());
                uris.push(format!("mem://{}", uploaded.len()));
            }
            Ok(uris)
        }
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("pfp.jpg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("PFP.JPEG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a/b.png")), "image/png");
        assert_eq!(content_type_for(Path::new("meta.json")), "application/json");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_generic_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pfp.jpg");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0xff, 0xd8, 0xff]).unwrap();

        let generic = GenericFile::from_path(&path).unwrap();
        assert_eq!(generic.file_name, "pfp.jpg");
        assert_eq!(generic.content_type, "image/jpeg");
        assert_eq!(generic.bytes, vec![0xff, 0xd8, 0xff]);
    }

    #[tokio::test]
    async fn test_upload_json_default() {
        let uploader = RecordingUploader::default();
        let uri = uploader
            .upload_json(&serde_json::json!({ "name": "howdy" }))
            .await
            .unwrap();
        assert_eq!(uri, "mem://1");

        let uploaded = uploader.uploaded.lock().unwrap();
        assert_eq!(uploaded[0].content_type, "application/json");
        assert_eq!(uploaded[0].bytes, br#"{"name":"howdy"}"#.to_vec());
    }
}
