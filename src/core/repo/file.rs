use super::Atomic;
use crate::{
    core::model::{
        file::{
            AudioMeta, BinnedFile, File, FileInsert, FileListItem, FolderFile, ImageMeta,
            MediaType, VideoMeta,
        },
        folder::Folder,
        Pagination, SortOrder,
    },
    error::CumulusError,
};

/// Keeps track of file metadata, folder associations, bin markers,
/// media attributes and the ownership metadata referenced by the
/// favourite/tag modules.
#[async_trait::async_trait]
pub trait FileRepo {
    /// Get a file owned by `user_id` based on ID.
    async fn get_file(&self, user_id: &str, id: i64) -> Result<Option<File>, CumulusError>;

    /// Insert file metadata.
    ///
    /// * `file`: Insert payload.
    /// * `tx`: The transaction to run in.
    async fn insert_file(
        &self,
        file: FileInsert<'_>,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<File, CumulusError>
    where
        Self: Atomic;

    /// Create the file's folder association.
    async fn set_file_parent(
        &self,
        file_id: i64,
        folder_id: i64,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<(), CumulusError>
    where
        Self: Atomic;

    /// Point the file's folder association at a different folder.
    /// Returns the number of affected rows.
    async fn update_file_parent(&self, file_id: i64, folder_id: i64)
        -> Result<u64, CumulusError>;

    /// The folder a file is associated with.
    async fn get_parent_folder(&self, file_id: i64) -> Result<Option<Folder>, CumulusError>;

    /// Paginated live (non-binned) files directly inside a folder.
    async fn list_folder_files(
        &self,
        user_id: &str,
        folder_id: i64,
        p: Pagination,
    ) -> Result<Vec<FileListItem>, CumulusError>;

    /// Number of live files directly inside a folder.
    async fn count_folder_files(&self, user_id: &str, folder_id: i64)
        -> Result<i64, CumulusError>;

    /// Every file (live or binned) associated with any of the given folders.
    async fn list_files_in_folders(&self, ids: &[i64]) -> Result<Vec<FolderFile>, CumulusError>;

    /// Remove file rows by id. Associated markers, associations, media
    /// attributes, favourites and tags cascade.
    async fn remove_files(
        &self,
        ids: &[i64],
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<u64, CumulusError>
    where
        Self: Atomic;

    /// Remove a single file row.
    async fn remove_file(&self, id: i64, tx: &mut <Self as Atomic>::Tx)
        -> Result<u64, CumulusError>
    where
        Self: Atomic;

    /// The newest live files of a user.
    async fn list_recent_files(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<FileListItem>, CumulusError>;

    /// Paginated live files of one media category, optionally filtered
    /// by extension.
    async fn list_files_by_type(
        &self,
        user_id: &str,
        media_type: MediaType,
        extension: Option<&str>,
        order: SortOrder,
        p: Pagination,
    ) -> Result<Vec<FileListItem>, CumulusError>;

    /// Number of live files of one media category.
    async fn count_files_by_type(
        &self,
        user_id: &str,
        media_type: MediaType,
        extension: Option<&str>,
    ) -> Result<i64, CumulusError>;

    // Bin markers.

    /// Mark a file as binned.
    async fn mark_deleted(&self, file_id: i64) -> Result<(), CumulusError>;

    /// The bin timestamp of a file, if it is binned.
    async fn get_deleted_at(&self, file_id: i64)
        -> Result<Option<chrono::DateTime<chrono::Utc>>, CumulusError>;

    /// Remove a file's bin marker. Returns the number of affected rows.
    async fn unmark_deleted(&self, file_id: i64) -> Result<u64, CumulusError>;

    /// Paginated binned files, ordered by bin timestamp.
    async fn list_deleted_files(
        &self,
        user_id: &str,
        media_type: Option<MediaType>,
        order: SortOrder,
        p: Pagination,
    ) -> Result<Vec<BinnedFile>, CumulusError>;

    /// Number of binned files.
    async fn count_deleted_files(
        &self,
        user_id: &str,
        media_type: Option<MediaType>,
    ) -> Result<i64, CumulusError>;

    // Media attributes. Written after the ingestion transaction commits.

    async fn insert_video_meta(&self, meta: VideoMeta) -> Result<(), CumulusError>;

    async fn insert_image_meta(&self, meta: ImageMeta) -> Result<(), CumulusError>;

    async fn insert_audio_meta(&self, meta: AudioMeta) -> Result<(), CumulusError>;

    async fn get_video_meta(&self, file_id: i64) -> Result<Option<VideoMeta>, CumulusError>;

    async fn get_image_meta(&self, file_id: i64) -> Result<Option<ImageMeta>, CumulusError>;

    async fn get_audio_meta(&self, file_id: i64) -> Result<Option<AudioMeta>, CumulusError>;

    // Ownership metadata referenced by the excluded favourite/tag modules.

    /// Mark a file as a favourite of its owner.
    async fn set_favourite(&self, user_id: &str, file_id: i64) -> Result<(), CumulusError>;

    /// Whether a file is marked as a favourite.
    async fn is_favourite(&self, file_id: i64) -> Result<bool, CumulusError>;

    /// Attach a tag to a file.
    async fn tag_file(&self, file_id: i64, tag: &str) -> Result<(), CumulusError>;

    /// All tags attached to a file.
    async fn list_file_tags(&self, file_id: i64) -> Result<Vec<String>, CumulusError>;
}
