use super::Atomic;
use crate::{
    core::model::{
        folder::{Folder, FolderInsert},
        Pagination,
    },
    error::CumulusError,
};

/// Keeps track of the per-user folder tree. Folders are only ever created
/// under an existing parent and never reparented, so the tree is acyclic
/// by construction.
#[async_trait::async_trait]
pub trait FolderRepo {
    /// Get folder metadata based on ID.
    async fn get_folder(&self, id: i64) -> Result<Option<Folder>, CumulusError>;

    /// Get a user's root folder (the one without a parent).
    async fn get_root_folder(&self, user_id: &str) -> Result<Option<Folder>, CumulusError>;

    /// Insert folder metadata.
    async fn insert_folder(&self, folder: FolderInsert<'_>) -> Result<Folder, CumulusError>;

    /// Update a folder's name. Returns the number of affected rows.
    async fn rename_folder(&self, id: i64, name: &str) -> Result<u64, CumulusError>;

    /// All immediate children of a folder, unpaginated. Used for tree walks.
    async fn list_child_folders(&self, parent_id: i64) -> Result<Vec<Folder>, CumulusError>;

    /// Paginated immediate children of a folder, newest first.
    async fn list_child_folders_page(
        &self,
        user_id: &str,
        parent_id: i64,
        p: Pagination,
    ) -> Result<Vec<Folder>, CumulusError>;

    /// Number of immediate children of a folder.
    async fn count_child_folders(&self, user_id: &str, parent_id: i64)
        -> Result<i64, CumulusError>;

    /// Paginated flat listing of a user's folders, newest first.
    async fn list_folders(
        &self,
        user_id: &str,
        p: Pagination,
    ) -> Result<Vec<Folder>, CumulusError>;

    /// Total number of a user's folders.
    async fn count_folders(&self, user_id: &str) -> Result<i64, CumulusError>;

    /// Remove folder rows by id.
    ///
    /// * `ids`: Folder IDs.
    /// * `tx`: The transaction to run in.
    async fn remove_folders(
        &self,
        ids: &[i64],
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<u64, CumulusError>
    where
        Self: Atomic;
}
