use crate::{
    core::{model::quota::StorageQuota, repo::quota::QuotaRepo},
    err,
    error::CumulusError,
};

/// High level operations for the per-user storage ledger. Counter
/// mutations happen inside the transactions of the services that move
/// bytes; this service covers provisioning and read access.
#[derive(Clone)]
pub struct QuotaService<R> {
    pub repo: R,
}

impl<R> QuotaService<R>
where
    R: QuotaRepo + Send + Sync,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Get a user's quota row.
    pub async fn get_quota(&self, user_id: &str) -> Result<StorageQuota, CumulusError> {
        match self.repo.get_quota(user_id).await? {
            Some(quota) => Ok(quota),
            None => err!(DoesNotExist, "Storage quota for user '{user_id}'"),
        }
    }

    /// Provision a quota row for a new user.
    pub async fn create_quota(
        &self,
        user_id: &str,
        total_kb: i64,
    ) -> Result<StorageQuota, CumulusError> {
        if total_kb <= 0 {
            return err!(InvalidInput, "total quota must be positive");
        }

        if self.repo.get_quota(user_id).await?.is_some() {
            return err!(AlreadyExists, "Storage quota for user '{user_id}'");
        }

        self.repo.create_quota(user_id, total_kb).await
    }

    /// Read-only admission pre-check for a prospective write of `delta_kb`.
    pub async fn check_admission(
        &self,
        user_id: &str,
        delta_kb: i64,
    ) -> Result<bool, CumulusError> {
        self.repo.can_admit(user_id, delta_kb).await
    }
}
