use crate::{
    core::storage::{FileStorage, UploadContent},
    err,
    error::CumulusError,
    map_err,
};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Filesystem implementation of [FileStorage].
#[derive(Debug, Clone, Default)]
pub struct FsStorage;

impl FsStorage {
    async fn fill(
        &self,
        file: &mut tokio::fs::File,
        content: UploadContent,
        size_bytes: u64,
    ) -> Result<(), CumulusError> {
        let written = match content {
            UploadContent::Buffered(bytes) => {
                map_err!(file.write_all(&bytes).await);
                bytes.len() as u64
            }
            UploadContent::Streamed(mut reader) => {
                map_err!(tokio::io::copy(&mut reader, file).await)
            }
        };

        if written != size_bytes {
            return err!(
                InvalidInput,
                "upload truncated; declared {size_bytes} bytes, received {written}"
            );
        }

        map_err!(file.sync_all().await);

        Ok(())
    }
}

#[async_trait::async_trait]
impl FileStorage for FsStorage {
    async fn write(
        &self,
        path: &Path,
        content: UploadContent,
        size_bytes: u64,
    ) -> Result<(), CumulusError> {
        debug!("Writing {}", path.display());

        if let Some(parent) = path.parent() {
            map_err!(tokio::fs::create_dir_all(parent).await);
        }

        // create_new so a storage name collision surfaces instead of
        // silently clobbering existing bytes.
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return err!(AlreadyExists, "{}", path.display());
            }
            Err(e) => return Err(CumulusError::new(file!(), line!(), column!(), e.into())),
        };

        match self.fill(&mut file, content, size_bytes).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // A failed or short write leaves nothing behind.
                drop(file);
                let _ = tokio::fs::remove_file(path).await;
                Err(e)
            }
        }
    }

    async fn remove_file(&self, path: &Path) -> Result<(), CumulusError> {
        debug!("Removing {}", path.display());
        map_err!(tokio::fs::remove_file(path).await);
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), CumulusError> {
        map_err!(tokio::fs::create_dir_all(path).await);
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), CumulusError> {
        debug!("Renaming {} -> {}", from.display(), to.display());
        map_err!(tokio::fs::rename(from, to).await);
        Ok(())
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<(), CumulusError> {
        debug!("Removing directory {}", path.display());
        map_err!(tokio::fs::remove_dir_all(path).await);
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIR: &str = "__fs_storage_tests";
    const CONTENT: &[u8] = b"Hello world.";

    #[tokio::test]
    async fn writes_and_removes() {
        tokio::fs::create_dir(DIR).await.unwrap();

        let storage = FsStorage;
        let path = std::path::PathBuf::from(DIR).join("foo.txt");

        storage
            .write(
                &path,
                UploadContent::Buffered(CONTENT.to_vec()),
                CONTENT.len() as u64,
            )
            .await
            .unwrap();

        let bytes = tokio::fs::read(&path).await.unwrap();
        assert_eq!(CONTENT, bytes);

        // Same storage name twice is a conflict.
        let conflict = storage
            .write(
                &path,
                UploadContent::Buffered(CONTENT.to_vec()),
                CONTENT.len() as u64,
            )
            .await;
        assert!(conflict.is_err());
        // The original bytes survive the failed second write.
        assert_eq!(CONTENT, tokio::fs::read(&path).await.unwrap());

        storage.remove_file(&path).await.unwrap();
        assert!(!storage.exists(&path).await);

        tokio::fs::remove_dir_all(DIR).await.unwrap();
    }

    #[tokio::test]
    async fn short_write_leaves_nothing() {
        tokio::fs::create_dir("__fs_storage_short").await.unwrap();

        let storage = FsStorage;
        let path = std::path::PathBuf::from("__fs_storage_short").join("bar.txt");

        let result = storage
            .write(
                &path,
                UploadContent::Buffered(CONTENT.to_vec()),
                CONTENT.len() as u64 + 1,
            )
            .await;

        assert!(result.is_err());
        assert!(!storage.exists(&path).await);

        tokio::fs::remove_dir_all("__fs_storage_short").await.unwrap();
    }
}
