use crate::error::CumulusError;
use std::path::Path;
use tokio::io::AsyncRead;

/// Payloads at or above this size should arrive as [UploadContent::Streamed]
/// so an upload never buffers more than this in memory.
pub const STREAM_THRESHOLD_BYTES: u64 = 100 * 1024 * 1024;

/// Upload payload bytes as handed over by the transport layer: buffered
/// in memory for small files, streamed for large ones.
pub enum UploadContent {
    Buffered(Vec<u8>),
    Streamed(Box<dyn AsyncRead + Send + Unpin>),
}

/// Manipulates the physical storage hierarchy. Paths are absolute; layout
/// decisions live in [PathResolver](crate::core::path::PathResolver).
#[async_trait::async_trait]
pub trait FileStorage {
    /// Write an upload payload to `path`, creating parent directories as
    /// needed. The bytes are flushed to disk before this returns; a failed
    /// or short write removes the partial file and errors, so a file is
    /// either fully present or absent.
    ///
    /// * `path`: Absolute destination, including the storage name.
    /// * `content`: The payload.
    /// * `size_bytes`: Declared payload size; a mismatch is an error.
    async fn write(
        &self,
        path: &Path,
        content: UploadContent,
        size_bytes: u64,
    ) -> Result<(), CumulusError>;

    /// Unlink a single file.
    async fn remove_file(&self, path: &Path) -> Result<(), CumulusError>;

    /// Create a directory and any missing ancestors.
    async fn create_dir_all(&self, path: &Path) -> Result<(), CumulusError>;

    /// Rename a file or directory.
    async fn rename(&self, from: &Path, to: &Path) -> Result<(), CumulusError>;

    /// Remove a directory subtree.
    async fn remove_dir_all(&self, path: &Path) -> Result<(), CumulusError>;

    /// Whether a file or directory exists at `path`.
    async fn exists(&self, path: &Path) -> bool;
}
