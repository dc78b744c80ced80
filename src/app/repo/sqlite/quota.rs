use crate::{
    core::{
        model::quota::StorageQuota,
        repo::{quota::QuotaRepo, Atomic},
    },
    error::CumulusError,
    map_err,
};
use sqlx::SqlitePool;

#[async_trait::async_trait]
impl QuotaRepo for SqlitePool {
    async fn get_quota(&self, user_id: &str) -> Result<Option<StorageQuota>, CumulusError> {
        let quota = map_err!(
            sqlx::query_as::<_, StorageQuota>(
                "SELECT user_id, total_kb, used_kb FROM storage_quotas WHERE user_id = ?",
            )
            .bind(user_id)
            .fetch_optional(self)
            .await
        );

        Ok(quota)
    }

    async fn create_quota(
        &self,
        user_id: &str,
        total_kb: i64,
    ) -> Result<StorageQuota, CumulusError> {
        map_err!(
            sqlx::query(
                "INSERT INTO storage_quotas (user_id, total_kb, used_kb) VALUES (?, ?, 0)",
            )
            .bind(user_id)
            .bind(total_kb)
            .execute(self)
            .await
        );

        Ok(StorageQuota {
            user_id: user_id.to_string(),
            total_kb,
            used_kb: 0,
        })
    }

    async fn can_admit(&self, user_id: &str, delta_kb: i64) -> Result<bool, CumulusError> {
        let row: Option<(bool,)> = map_err!(
            sqlx::query_as(
                "SELECT used_kb + ? <= total_kb FROM storage_quotas WHERE user_id = ?",
            )
            .bind(delta_kb)
            .bind(user_id)
            .fetch_optional(self)
            .await
        );

        Ok(row.is_some_and(|r| r.0))
    }

    async fn try_charge(
        &self,
        user_id: &str,
        delta_kb: i64,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<bool, CumulusError> {
        // Single conditional statement; the update only lands when the
        // charge fits, which makes concurrent charges race-free.
        let result = map_err!(
            sqlx::query(
                "UPDATE storage_quotas
                 SET used_kb = used_kb + ?
                 WHERE user_id = ? AND used_kb + ? <= total_kb",
            )
            .bind(delta_kb)
            .bind(user_id)
            .bind(delta_kb)
            .execute(&mut **tx)
            .await
        );

        Ok(result.rows_affected() == 1)
    }

    async fn release_quota(
        &self,
        user_id: &str,
        delta_kb: i64,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<(), CumulusError> {
        map_err!(
            sqlx::query(
                "UPDATE storage_quotas
                 SET used_kb = MAX(used_kb - ?, 0)
                 WHERE user_id = ?",
            )
            .bind(delta_kb)
            .bind(user_id)
            .execute(&mut **tx)
            .await
        );

        Ok(())
    }
}
