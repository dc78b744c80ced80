use super::Atomic;
use crate::{core::model::quota::StorageQuota, error::CumulusError};

/// The quota ledger. Every mutation is a transactional read-modify-write
/// statement scoped to the user's row; callers never write counters
/// computed from stale reads.
#[async_trait::async_trait]
pub trait QuotaRepo {
    /// Get a user's quota row.
    async fn get_quota(&self, user_id: &str) -> Result<Option<StorageQuota>, CumulusError>;

    /// Provision a quota row for a user. Called by the external user module
    /// at registration time.
    async fn create_quota(
        &self,
        user_id: &str,
        total_kb: i64,
    ) -> Result<StorageQuota, CumulusError>;

    /// Read-only admission pre-check: `used + delta <= total`. Called
    /// before committing any disk write for an upload. The authoritative
    /// check is [try_charge](QuotaRepo::try_charge).
    async fn can_admit(&self, user_id: &str, delta_kb: i64) -> Result<bool, CumulusError>;

    /// Conditionally add `delta_kb` to the user's used quota in a single
    /// statement: the update only applies when the result stays within
    /// `total_kb`. Returns whether the charge was applied. Running this
    /// inside the ingestion transaction closes the admission race between
    /// concurrent uploads of the same user.
    async fn try_charge(
        &self,
        user_id: &str,
        delta_kb: i64,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<bool, CumulusError>
    where
        Self: Atomic;

    /// Subtract `delta_kb` from the user's used quota, clamped at zero.
    async fn release_quota(
        &self,
        user_id: &str,
        delta_kb: i64,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<(), CumulusError>
    where
        Self: Atomic;
}
