use crate::{
    core::{
        model::{
            file::{BinnedFile, File, MediaType},
            page_count, Pagination, SortOrder,
        },
        provider::ProviderState,
        repo::{file::FileRepo, folder::FolderRepo, quota::QuotaRepo, Atomic},
        service::folder::DeletePolicy,
    },
    err,
    error::CumulusError,
    transaction,
};
use serde::Serialize;
use tracing::{info, warn};

/// Page size for bin listings.
pub const BIN_PAGE_SIZE: i64 = 24;

/// The soft-delete lifecycle. Binning and restoring only flip a marker;
/// the bytes, the quota charge and all attached metadata stay in place
/// until a permanent delete.
#[derive(Clone)]
pub struct BinService<R> {
    pub repo: R,
    providers: ProviderState,
    policy: DeletePolicy,
}

impl<R> BinService<R>
where
    R: FileRepo + FolderRepo + QuotaRepo + Atomic + Send + Sync,
{
    pub fn new(repo: R, providers: ProviderState, policy: DeletePolicy) -> Self {
        Self {
            repo,
            providers,
            policy,
        }
    }

    /// Mark a file as binned. The file disappears from live listings but
    /// keeps its bytes, quota charge, favourites and tags.
    pub async fn move_to_bin(&self, user_id: &str, file_id: i64) -> Result<(), CumulusError> {
        let file = self.owned_file(user_id, file_id).await?;

        if self.repo.get_deleted_at(file.id).await?.is_some() {
            return err!(InvalidInput, "file {file_id} is already in the bin");
        }

        self.repo.mark_deleted(file.id).await
    }

    /// Remove a file's bin marker, returning it to live listings.
    pub async fn restore(&self, user_id: &str, file_id: i64) -> Result<(), CumulusError> {
        let file = self.owned_file(user_id, file_id).await?;

        let affected = self.repo.unmark_deleted(file.id).await?;
        if affected == 0 {
            return err!(InvalidInput, "file {file_id} is not in the bin");
        }

        Ok(())
    }

    /// Permanently remove a file, binned or live: its bytes, its thumbnail,
    /// its row and the quota charge.
    pub async fn delete_permanently(&self, user_id: &str, file_id: i64) -> Result<(), CumulusError> {
        let file = self.owned_file(user_id, file_id).await?;

        self.purge(&file).await?;

        info!("Purged '{}' ({}) for user '{user_id}'", file.name, file.id);

        Ok(())
    }

    /// Permanently remove every binned file of a user.
    pub async fn clean_bin(&self, user_id: &str) -> Result<BinCleanReport, CumulusError> {
        let total = self.repo.count_deleted_files(user_id, None).await?;
        let binned = self
            .repo
            .list_deleted_files(
                user_id,
                None,
                SortOrder::Asc,
                Pagination::new(total.max(1), 1),
            )
            .await?;

        let mut report = BinCleanReport {
            purged: 0,
            freed_kb: 0,
            failures: vec![],
        };

        for item in binned {
            let Some(file) = self.repo.get_file(user_id, item.id).await? else {
                continue;
            };

            match self.purge(&file).await {
                Ok(()) => {
                    report.purged += 1;
                    report.freed_kb += file.size_kb;
                }
                Err(e) => {
                    warn!("Could not purge '{}' during bin clean: {e}", file.name);
                    report.failures.push(file.name);
                }
            }
        }

        info!(
            "Cleaned bin of user '{user_id}': {} purged, {} KB freed",
            report.purged, report.freed_kb
        );

        Ok(report)
    }

    /// Paginated binned files, ordered by bin timestamp.
    pub async fn list_deleted(
        &self,
        user_id: &str,
        media_type: Option<MediaType>,
        order: SortOrder,
        page: i64,
    ) -> Result<BinPage, CumulusError> {
        if page < 1 {
            return err!(InvalidInput, "page must be a positive number");
        }

        let total = self.repo.count_deleted_files(user_id, media_type).await?;
        let files = self
            .repo
            .list_deleted_files(user_id, media_type, order, Pagination::new(BIN_PAGE_SIZE, page))
            .await?;

        Ok(BinPage {
            files,
            pages: page_count(total, BIN_PAGE_SIZE),
        })
    }

    /// Unlink the bytes, then remove the row and release the quota charge
    /// in one transaction. The physical unlink honours the configured
    /// delete policy; the thumbnail is always best effort.
    async fn purge(&self, file: &File) -> Result<(), CumulusError> {
        let path = match self.repo.get_parent_folder(file.id).await? {
            Some(parent) => self
                .providers
                .paths
                .resolve(&self.repo, parent.id)
                .await?
                .join(&file.unique_name),
            None => return err!(DoesNotExist, "Parent folder of file {}", file.id),
        };

        if let Err(e) = self.providers.storage.remove_file(&path).await {
            match self.policy {
                DeletePolicy::Strict => return Err(e),
                DeletePolicy::BestEffort => {
                    warn!("Could not remove {}: {e}", path.display());
                }
            }
        }

        let thumb = self
            .providers
            .paths
            .thumbnail_dir(&file.user_id)
            .join(format!("{}.jpg", file.unique_name));
        if let Err(e) = self.providers.storage.remove_file(&thumb).await {
            warn!("Could not remove thumbnail {}: {e}", thumb.display());
        }

        let (user_id, file_id, size_kb) = (file.user_id.as_str(), file.id, file.size_kb);

        transaction!(self.repo, |tx| async move {
            self.repo.remove_file(file_id, tx).await?;
            self.repo.release_quota(user_id, size_kb, tx).await?;
            Ok(())
        })
    }

    async fn owned_file(&self, user_id: &str, file_id: i64) -> Result<File, CumulusError> {
        match self.repo.get_file(user_id, file_id).await? {
            Some(file) => Ok(file),
            None => err!(DoesNotExist, "File with ID {file_id}"),
        }
    }
}

/// Outcome of a full bin clean.
#[derive(Debug, Serialize)]
pub struct BinCleanReport {
    /// Files fully purged.
    pub purged: u64,

    /// Quota released by the purged files.
    pub freed_kb: i64,

    /// Display names of files that could not be purged.
    pub failures: Vec<String>,
}

/// One page of the bin listing.
#[derive(Debug, Serialize)]
pub struct BinPage {
    pub files: Vec<BinnedFile>,
    pub pages: i64,
}
