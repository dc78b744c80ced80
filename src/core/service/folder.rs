use crate::{
    core::{
        model::{
            file::FileListItem,
            folder::{Folder, FolderInsert},
            page_count, Pagination,
        },
        provider::ProviderState,
        repo::{file::FileRepo, folder::FolderRepo, quota::QuotaRepo, Atomic},
    },
    err,
    error::CumulusError,
    transaction, ROOT_FOLDER_NAME,
};
use serde::Serialize;
use std::{collections::HashMap, str::FromStr};
use tracing::{info, warn};

/// Page size for folder content listings.
pub const FOLDER_CONTENT_PAGE_SIZE: i64 = 10;

/// Page size for flat folder listings.
pub const FOLDER_LIST_PAGE_SIZE: i64 = 24;

/// How recursive folder deletion treats physical-deletion errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Abort on the first physical-deletion error; the database transaction
    /// rolls back and no rows change. Files unlinked before the error stay
    /// unlinked.
    Strict,

    /// Log physical-deletion errors, record the failed paths in the report
    /// and keep going. The database transaction always completes.
    #[default]
    BestEffort,
}

impl FromStr for DeletePolicy {
    type Err = CumulusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(DeletePolicy::Strict),
            "best-effort" => Ok(DeletePolicy::BestEffort),
            other => err!(ParseConfig, "invalid delete policy '{other}'"),
        }
    }
}

/// High level operations on the folder tree: creation, rename, recursive
/// deletion and content listing.
#[derive(Clone)]
pub struct FolderService<R> {
    pub repo: R,
    providers: ProviderState,
    policy: DeletePolicy,
}

impl<R> FolderService<R>
where
    R: FolderRepo + FileRepo + QuotaRepo + Atomic + Send + Sync,
{
    pub fn new(repo: R, providers: ProviderState, policy: DeletePolicy) -> Self {
        Self {
            repo,
            providers,
            policy,
        }
    }

    /// Get a folder owned by `user_id`.
    pub async fn get_folder(&self, user_id: &str, folder_id: i64) -> Result<Folder, CumulusError> {
        let Some(folder) = self.repo.get_folder(folder_id).await? else {
            return err!(DoesNotExist, "Folder with ID {folder_id}");
        };

        if folder.user_id != user_id {
            return err!(Forbidden, "folder {folder_id} belongs to another user");
        }

        Ok(folder)
    }

    /// Get a user's root folder, creating it (directory and row) if it does
    /// not exist yet. Idempotent; called before a user's first upload.
    pub async fn ensure_root(&self, user_id: &str) -> Result<Folder, CumulusError> {
        if let Some(root) = self.repo.get_root_folder(user_id).await? {
            return Ok(root);
        }

        let dir = self.providers.paths.user_root(user_id);
        self.providers.storage.create_dir_all(&dir).await?;

        let root = self
            .repo
            .insert_folder(FolderInsert::new(user_id, ROOT_FOLDER_NAME, None))
            .await?;

        info!("Created root folder for user '{user_id}'");

        Ok(root)
    }

    /// Create a folder under `parent_id`, or under the user's root if no
    /// parent is given. Fails with `AlreadyExists` if a directory of that
    /// name is already present at the resolved path. The physical directory
    /// and the row are one unit of work: a failed insert removes the
    /// just-created directory.
    pub async fn create_folder(
        &self,
        user_id: &str,
        parent_id: Option<i64>,
        name: &str,
    ) -> Result<Folder, CumulusError> {
        validate_segment(name)?;

        let parent = match parent_id {
            Some(id) => self.get_folder(user_id, id).await?,
            None => match self.repo.get_root_folder(user_id).await? {
                Some(root) => root,
                None => return err!(DoesNotExist, "Root folder for user '{user_id}'"),
            },
        };

        let dir = self
            .providers
            .paths
            .resolve(&self.repo, parent.id)
            .await?
            .join(name);

        if self.providers.storage.exists(&dir).await {
            return err!(AlreadyExists, "Folder '{name}'");
        }

        self.providers.storage.create_dir_all(&dir).await?;

        match self
            .repo
            .insert_folder(FolderInsert::new(user_id, name, Some(parent.id)))
            .await
        {
            Ok(folder) => Ok(folder),
            Err(e) => {
                if let Err(cleanup) = self.providers.storage.remove_dir_all(&dir).await {
                    warn!(
                        "Could not remove directory of failed folder insert ({}): {cleanup}",
                        dir.display()
                    );
                }
                Err(e)
            }
        }
    }

    /// Rename a folder. The physical rename happens first; if the row
    /// update fails afterwards the directory is renamed back, best effort.
    pub async fn rename_folder(
        &self,
        user_id: &str,
        folder_id: i64,
        new_name: &str,
    ) -> Result<(), CumulusError> {
        validate_segment(new_name)?;

        let folder = self.get_folder(user_id, folder_id).await?;

        if folder.is_root() {
            return err!(InvalidInput, "the root folder cannot be renamed");
        }

        let old_dir = self.providers.paths.resolve(&self.repo, folder.id).await?;
        let new_dir = old_dir.with_file_name(new_name);

        if self.providers.storage.exists(&new_dir).await {
            return err!(AlreadyExists, "Folder '{new_name}'");
        }

        self.providers.storage.rename(&old_dir, &new_dir).await?;

        if let Err(e) = self.repo.rename_folder(folder.id, new_name).await {
            if let Err(undo) = self.providers.storage.rename(&new_dir, &old_dir).await {
                warn!(
                    "Could not rename {} back after row update failure: {undo}",
                    new_dir.display()
                );
            }
            return Err(e);
        }

        Ok(())
    }

    /// Recursively delete a folder: every descendant file is unlinked and
    /// its row removed, the physical subtree is removed, and the user's
    /// quota is decremented by the accumulated size. Row deletes and the
    /// quota adjustment are one transaction; physical deletions already
    /// performed are not undone if it aborts. Physical-deletion errors are
    /// handled per the configured [DeletePolicy].
    pub async fn delete_folder(
        &self,
        user_id: &str,
        folder_id: i64,
    ) -> Result<FolderDeleteReport, CumulusError> {
        let folder = self.get_folder(user_id, folder_id).await?;

        if folder.is_root() {
            return err!(InvalidInput, "the root folder cannot be deleted");
        }

        // The subtree is collected before the transaction opens; a rename
        // racing this walk is a documented limitation.
        let top_dir = self.providers.paths.resolve(&self.repo, folder.id).await?;

        let mut folder_ids = vec![folder.id];
        let mut dirs = HashMap::from([(folder.id, top_dir.clone())]);
        let mut queue = vec![folder];

        while let Some(next) = queue.pop() {
            for child in self.repo.list_child_folders(next.id).await? {
                dirs.insert(child.id, dirs[&next.id].join(&child.name));
                folder_ids.push(child.id);
                queue.push(child);
            }
        }

        let files = self.repo.list_files_in_folders(&folder_ids).await?;
        let thumb_dir = self.providers.paths.thumbnail_dir(user_id);

        transaction!(self.repo, |tx| async move {
            let mut freed_kb = 0;
            let mut failures = Vec::new();

            for entry in &files {
                freed_kb += entry.file.size_kb;

                let path = dirs[&entry.folder_id].join(&entry.file.unique_name);

                if let Err(e) = self.providers.storage.remove_file(&path).await {
                    match self.policy {
                        DeletePolicy::Strict => return Err(e),
                        DeletePolicy::BestEffort => {
                            warn!("Could not unlink {}: {e}", path.display());
                            failures.push(path.display().to_string());
                        }
                    }
                }

                // Thumbnails are derived data; their removal is best effort
                // under either policy.
                let thumb = thumb_dir.join(format!("{}.jpg", entry.file.unique_name));
                if self.providers.storage.exists(&thumb).await {
                    let _ = self.providers.storage.remove_file(&thumb).await;
                }
            }

            let file_ids: Vec<i64> = files.iter().map(|e| e.file.id).collect();
            let removed_files = self.repo.remove_files(&file_ids, tx).await?;
            self.repo.remove_folders(&folder_ids, tx).await?;
            self.repo.release_quota(user_id, freed_kb, tx).await?;

            if let Err(e) = self.providers.storage.remove_dir_all(&top_dir).await {
                match self.policy {
                    DeletePolicy::Strict => return Err(e),
                    DeletePolicy::BestEffort => {
                        warn!("Could not remove {}: {e}", top_dir.display());
                        failures.push(top_dir.display().to_string());
                    }
                }
            }

            info!("Deleted folder subtree {folder_id} ({removed_files} files, {freed_kb} KB)");

            Ok(FolderDeleteReport {
                removed_files,
                freed_kb,
                failures,
            })
        })
    }

    /// Paginated listing of a folder's live files and immediate child
    /// folders. The page count is computed from whichever of the two is
    /// larger.
    pub async fn folder_content(
        &self,
        user_id: &str,
        folder_id: i64,
        page: i64,
    ) -> Result<FolderContent, CumulusError> {
        if page < 1 {
            return err!(InvalidInput, "page must be a positive number");
        }

        let folder = self.get_folder(user_id, folder_id).await?;

        let file_count = self.repo.count_folder_files(user_id, folder.id).await?;
        let folder_count = self.repo.count_child_folders(user_id, folder.id).await?;

        let p = Pagination::new(FOLDER_CONTENT_PAGE_SIZE, page);
        let files = self.repo.list_folder_files(user_id, folder.id, p).await?;
        let folders = self
            .repo
            .list_child_folders_page(user_id, folder.id, p)
            .await?;

        Ok(FolderContent {
            files,
            folders,
            pages: page_count(file_count.max(folder_count), FOLDER_CONTENT_PAGE_SIZE),
        })
    }

    /// Paginated flat listing of a user's folders, newest first.
    pub async fn list_folders(&self, user_id: &str, page: i64) -> Result<FolderPage, CumulusError> {
        if page < 1 {
            return err!(InvalidInput, "page must be a positive number");
        }

        let total = self.repo.count_folders(user_id).await?;
        let folders = self
            .repo
            .list_folders(user_id, Pagination::new(FOLDER_LIST_PAGE_SIZE, page))
            .await?;

        Ok(FolderPage {
            folders,
            pages: page_count(total, FOLDER_LIST_PAGE_SIZE),
        })
    }
}

/// Outcome of a recursive folder deletion.
#[derive(Debug, Serialize)]
pub struct FolderDeleteReport {
    /// Number of file rows removed.
    pub removed_files: u64,

    /// Total size credited back to the quota.
    pub freed_kb: i64,

    /// Paths that could not be physically removed under
    /// [DeletePolicy::BestEffort].
    pub failures: Vec<String>,
}

/// One page of a folder's contents.
#[derive(Debug, Serialize)]
pub struct FolderContent {
    pub files: Vec<FileListItem>,
    pub folders: Vec<Folder>,
    pub pages: i64,
}

/// One page of a user's flat folder listing.
#[derive(Debug, Serialize)]
pub struct FolderPage {
    pub folders: Vec<Folder>,
    pub pages: i64,
}

/// A folder or file name must be a single path segment.
pub(crate) fn validate_segment(name: &str) -> Result<(), CumulusError> {
    if name.is_empty() {
        return err!(InvalidInput, "name cannot be empty");
    }

    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return err!(InvalidInput, "'{name}' is not a valid name");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_validation() {
        assert!(validate_segment("docs").is_ok());
        assert!(validate_segment("with space").is_ok());
        assert!(validate_segment("").is_err());
        assert!(validate_segment("..").is_err());
        assert!(validate_segment("a/b").is_err());
        assert!(validate_segment("a\\b").is_err());
    }

    #[test]
    fn delete_policy_from_str() {
        assert_eq!(
            "strict".parse::<DeletePolicy>().unwrap(),
            DeletePolicy::Strict
        );
        assert_eq!(
            "best-effort".parse::<DeletePolicy>().unwrap(),
            DeletePolicy::BestEffort
        );
        assert!("aggressive".parse::<DeletePolicy>().is_err());
    }
}
