use crate::{
    core::{
        model::{
            file::{
                AudioMeta, File, FileInsert, FileListItem, ImageMeta, MediaType, VideoMeta,
            },
            folder::Folder,
            page_count, Pagination, SortOrder,
        },
        provider::ProviderState,
        repo::{file::FileRepo, folder::FolderRepo, quota::QuotaRepo, Atomic},
    },
    err,
    error::CumulusError,
    transaction,
};
use chrono::Utc;
use dto::{FileDownload, FileUpload};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Page size for media grid listings.
pub const FILE_LIST_PAGE_SIZE: i64 = 24;

/// Number of files returned by the recent listing.
const RECENT_FILES: i64 = 12;
/// Number of folders returned by the recent listing.
const RECENT_FOLDERS: i64 = 8;

/// The file ingestion pipeline and the read models over file metadata.
///
/// An upload moves through: admission pre-check, flushed disk write, one
/// transaction persisting the row, the folder association and the
/// conditional quota charge, then post-commit media probing. Failures
/// before the transaction commits leave no row and no bytes; probing
/// failures leave the committed file without enriched metadata.
#[derive(Clone)]
pub struct FileService<R> {
    pub repo: R,
    providers: ProviderState,
}

impl<R> FileService<R>
where
    R: FileRepo + FolderRepo + QuotaRepo + Atomic + Send + Sync,
{
    pub fn new(repo: R, providers: ProviderState) -> Self {
        Self { repo, providers }
    }

    /// Ingest an upload into `parent_id`, or into the user's root folder
    /// if no parent is given.
    pub async fn upload(
        &self,
        user_id: &str,
        parent_id: Option<i64>,
        upload: FileUpload,
    ) -> Result<File, CumulusError> {
        let FileUpload {
            name,
            mime,
            size_bytes,
            content,
        } = upload;

        super::folder::validate_segment(&name)?;
        if size_bytes == 0 {
            return err!(InvalidInput, "no file payload");
        }

        let size_kb = size_bytes.div_ceil(1024) as i64;

        // Read-only pre-flight so oversized uploads are rejected before any
        // bytes hit the disk. The authoritative admission is the conditional
        // charge inside the persistence transaction.
        if !self.repo.can_admit(user_id, size_kb).await? {
            if self.repo.get_quota(user_id).await?.is_none() {
                return err!(DoesNotExist, "Storage quota for user '{user_id}'");
            }
            return err!(QuotaExceeded, "{size_kb} KB does not fit user '{user_id}' quota");
        }

        let media_type = MediaType::from_mime(&mime);
        let unique_name = unique_storage_name(&name);
        let extension = extension_of(&name);

        let folder = match parent_id {
            Some(id) => {
                let Some(folder) = self.repo.get_folder(id).await? else {
                    return err!(DoesNotExist, "Folder with ID {id}");
                };
                if folder.user_id != user_id {
                    return err!(Forbidden, "folder {id} belongs to another user");
                }
                folder
            }
            None => match self.repo.get_root_folder(user_id).await? {
                Some(root) => root,
                None => return err!(DoesNotExist, "Root folder for user '{user_id}'"),
            },
        };

        let dir = self.providers.paths.resolve(&self.repo, folder.id).await?;
        let path = dir.join(&unique_name);

        self.providers.storage.write(&path, content, size_bytes).await?;

        let file = match self
            .persist_upload(user_id, folder.id, &name, &unique_name, &extension, media_type, size_kb)
            .await
        {
            Ok(file) => file,
            Err(e) => {
                // The bytes are on disk but no row references them; unlink
                // so the failed upload leaves nothing behind.
                if let Err(cleanup) = self.providers.storage.remove_file(&path).await {
                    warn!(
                        "Could not remove {} after failed upload: {cleanup}",
                        path.display()
                    );
                }
                return Err(e);
            }
        };

        info!(
            "Ingested '{}' ({}, {size_kb} KB) for user '{user_id}'",
            file.name, file.id
        );

        // Probing failure never unwinds the committed upload; the file
        // simply stays without enriched metadata.
        if let Err(e) = self.enrich_media(&file, &path).await {
            warn!("Media probing for '{}' failed, continuing without metadata", file.name);
            e.print();
        }

        Ok(file)
    }

    /// Steps 6 and 7 of the pipeline as one transaction: the file row, its
    /// folder association and the conditional quota charge.
    async fn persist_upload(
        &self,
        user_id: &str,
        folder_id: i64,
        name: &str,
        unique_name: &str,
        extension: &str,
        media_type: MediaType,
        size_kb: i64,
    ) -> Result<File, CumulusError> {
        transaction!(self.repo, |tx| async move {
            let insert = FileInsert::new(user_id, name, unique_name, size_kb, extension, media_type);
            let file = self.repo.insert_file(insert, tx).await?;

            self.repo.set_file_parent(file.id, folder_id, tx).await?;

            if !self.repo.try_charge(user_id, size_kb, tx).await? {
                return err!(QuotaExceeded, "{size_kb} KB does not fit user '{user_id}' quota");
            }

            Ok(file)
        })
    }

    /// Probe the uploaded bytes and persist the type-specific metadata
    /// record, including a generated thumbnail for visual media.
    async fn enrich_media(&self, file: &File, path: &Path) -> Result<(), CumulusError> {
        match file.media_type {
            MediaType::Video => {
                let attrs = self.providers.media.probe(path, file.media_type).await?;
                let (width, height) = require_resolution(&attrs)?;
                let Some(duration_secs) = attrs.duration_secs else {
                    return err!(InvalidMetadata, "video '{}' has no duration", file.name);
                };
                let Some(fps) = attrs.fps else {
                    return err!(InvalidMetadata, "video '{}' has no frame rate", file.name);
                };

                let thumbnail = self.render_thumbnail(file, path).await?;

                self.repo
                    .insert_video_meta(VideoMeta {
                        file_id: file.id,
                        width,
                        height,
                        duration_secs,
                        fps,
                        thumbnail: Some(thumbnail),
                    })
                    .await
            }
            MediaType::Image => {
                let attrs = self.providers.media.probe(path, file.media_type).await?;
                let (width, height) = require_resolution(&attrs)?;

                let thumbnail = self.render_thumbnail(file, path).await?;

                self.repo
                    .insert_image_meta(ImageMeta {
                        file_id: file.id,
                        width,
                        height,
                        thumbnail: Some(thumbnail),
                    })
                    .await
            }
            MediaType::Audio => {
                let attrs = self.providers.media.probe(path, file.media_type).await?;
                let Some(duration_secs) = attrs.duration_secs else {
                    return err!(InvalidMetadata, "audio '{}' has no duration", file.name);
                };

                self.repo
                    .insert_audio_meta(AudioMeta {
                        file_id: file.id,
                        duration_secs,
                    })
                    .await
            }
            MediaType::Other => Ok(()),
        }
    }

    async fn render_thumbnail(&self, file: &File, path: &Path) -> Result<String, CumulusError> {
        let thumb_dir = self.providers.paths.thumbnail_dir(&file.user_id);
        self.providers.storage.create_dir_all(&thumb_dir).await?;

        let thumb_name = format!("{}.jpg", file.unique_name);
        let dest = thumb_dir.join(&thumb_name);

        self.providers
            .media
            .thumbnail(path, file.media_type, &dest)
            .await?;

        Ok(thumb_name)
    }

    /// A file's metadata merged with its type-specific attributes and
    /// favourite flag.
    pub async fn file_detail(
        &self,
        user_id: &str,
        file_id: i64,
    ) -> Result<FileDetail, CumulusError> {
        let file = self.get_file(user_id, file_id).await?;
        let path = self.disk_path(&file).await?;

        let mut detail = FileDetail {
            path: path.display().to_string(),
            width: None,
            height: None,
            duration_secs: None,
            fps: None,
            thumbnail: None,
            is_favourite: self.repo.is_favourite(file.id).await?,
            tags: self.repo.list_file_tags(file.id).await?,
            file,
        };

        match detail.file.media_type {
            MediaType::Video => {
                if let Some(meta) = self.repo.get_video_meta(file_id).await? {
                    detail.width = Some(meta.width);
                    detail.height = Some(meta.height);
                    detail.duration_secs = Some(meta.duration_secs);
                    detail.fps = Some(meta.fps);
                    detail.thumbnail = meta.thumbnail;
                }
            }
            MediaType::Image => {
                if let Some(meta) = self.repo.get_image_meta(file_id).await? {
                    detail.width = Some(meta.width);
                    detail.height = Some(meta.height);
                    detail.thumbnail = meta.thumbnail;
                }
            }
            MediaType::Audio => {
                if let Some(meta) = self.repo.get_audio_meta(file_id).await? {
                    detail.duration_secs = Some(meta.duration_secs);
                }
            }
            MediaType::Other => {}
        }

        Ok(detail)
    }

    /// Open a file's bytes for download.
    pub async fn download(&self, user_id: &str, file_id: i64) -> Result<FileDownload, CumulusError> {
        let file = self.get_file(user_id, file_id).await?;
        let path = self.disk_path(&file).await?;

        let Ok(meta) = tokio::fs::metadata(&path).await else {
            return err!(DoesNotExist, "Bytes of file {file_id} at {}", path.display());
        };

        let stream = crate::map_err!(tokio::fs::File::open(&path).await);

        Ok(FileDownload {
            stream,
            size_bytes: meta.len(),
            name: file.name,
            extension: file.extension,
        })
    }

    /// Move a file into a different folder. The physical rename happens
    /// first; if the association update fails the rename is undone, best
    /// effort.
    pub async fn move_file(
        &self,
        user_id: &str,
        file_id: i64,
        folder_id: i64,
    ) -> Result<(), CumulusError> {
        let file = self.get_file(user_id, file_id).await?;

        let Some(target) = self.repo.get_folder(folder_id).await? else {
            return err!(DoesNotExist, "Folder with ID {folder_id}");
        };
        if target.user_id != user_id {
            return err!(Forbidden, "folder {folder_id} belongs to another user");
        }

        let from = self.disk_path(&file).await?;
        let to = self
            .providers
            .paths
            .resolve(&self.repo, target.id)
            .await?
            .join(&file.unique_name);

        self.providers.storage.rename(&from, &to).await?;

        if let Err(e) = self.repo.update_file_parent(file.id, target.id).await {
            if let Err(undo) = self.providers.storage.rename(&to, &from).await {
                warn!(
                    "Could not move {} back after association update failure: {undo}",
                    to.display()
                );
            }
            return Err(e);
        }

        Ok(())
    }

    /// The newest live files and folders of a user.
    pub async fn list_recent(&self, user_id: &str) -> Result<RecentContent, CumulusError> {
        let files = self.repo.list_recent_files(user_id, RECENT_FILES).await?;
        let folders = self
            .repo
            .list_folders(user_id, Pagination::new(RECENT_FOLDERS, 1))
            .await?;

        Ok(RecentContent { files, folders })
    }

    /// Paginated live files of one media category, optionally filtered by
    /// extension.
    pub async fn list_by_type(
        &self,
        user_id: &str,
        media_type: MediaType,
        order: SortOrder,
        extension: Option<&str>,
        page: i64,
    ) -> Result<FilePage, CumulusError> {
        if page < 1 {
            return err!(InvalidInput, "page must be a positive number");
        }

        let extension = extension.map(str::to_lowercase);
        let extension = extension.as_deref();

        let total = self
            .repo
            .count_files_by_type(user_id, media_type, extension)
            .await?;
        let files = self
            .repo
            .list_files_by_type(
                user_id,
                media_type,
                extension,
                order,
                Pagination::new(FILE_LIST_PAGE_SIZE, page),
            )
            .await?;

        Ok(FilePage {
            files,
            pages: page_count(total, FILE_LIST_PAGE_SIZE),
        })
    }

    /// Get a file owned by `user_id`.
    pub async fn get_file(&self, user_id: &str, file_id: i64) -> Result<File, CumulusError> {
        match self.repo.get_file(user_id, file_id).await? {
            Some(file) => Ok(file),
            None => err!(DoesNotExist, "File with ID {file_id}"),
        }
    }

    /// Absolute location of a file's bytes, derived from its folder
    /// association.
    async fn disk_path(&self, file: &File) -> Result<std::path::PathBuf, CumulusError> {
        let Some(parent) = self.repo.get_parent_folder(file.id).await? else {
            return err!(DoesNotExist, "Parent folder of file {}", file.id);
        };

        let dir = self.providers.paths.resolve(&self.repo, parent.id).await?;
        Ok(dir.join(&file.unique_name))
    }
}

/// A file's metadata merged with its type-specific attributes.
#[derive(Debug, Serialize)]
pub struct FileDetail {
    #[serde(flatten)]
    pub file: File,
    /// Absolute location of the bytes.
    pub path: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub duration_secs: Option<f64>,
    pub fps: Option<f64>,
    pub thumbnail: Option<String>,
    pub is_favourite: bool,
    pub tags: Vec<String>,
}

/// One page of a media grid listing.
#[derive(Debug, Serialize)]
pub struct FilePage {
    pub files: Vec<FileListItem>,
    pub pages: i64,
}

/// The newest files and folders of a user.
#[derive(Debug, Serialize)]
pub struct RecentContent {
    pub files: Vec<FileListItem>,
    pub folders: Vec<Folder>,
}

/// Collision-resistant storage name: millisecond timestamp prefix plus the
/// display name.
fn unique_storage_name(name: &str) -> String {
    format!("{}{name}", Utc::now().timestamp_millis())
}

/// Lowercased extension of a display name; empty when there is none.
fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

fn require_resolution(
    attrs: &crate::core::media::MediaAttributes,
) -> Result<(i64, i64), CumulusError> {
    match attrs.width.zip(attrs.height) {
        Some((w, h)) => Ok((w as i64, h as i64)),
        None => err!(InvalidMetadata, "no resolution in probe output"),
    }
}

/// File service DTOs.
pub mod dto {
    use crate::core::storage::UploadContent;

    /// An upload payload as handed over by the transport layer.
    pub struct FileUpload {
        /// Display name, as sent by the client.
        pub name: String,

        /// Declared content type.
        pub mime: String,

        /// Declared payload size.
        pub size_bytes: u64,

        /// The bytes.
        pub content: UploadContent,
    }

    impl FileUpload {
        /// An upload buffered fully in memory.
        pub fn buffered(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
            Self {
                name: name.into(),
                mime: mime.into(),
                size_bytes: bytes.len() as u64,
                content: UploadContent::Buffered(bytes),
            }
        }
    }

    /// An open handle over a file's bytes for the transport layer.
    pub struct FileDownload {
        pub stream: tokio::fs::File,
        pub size_bytes: u64,
        pub name: String,
        pub extension: String,
    }
}
