use serde::Serialize;
use sqlx::FromRow;

/// Per-user storage ledger. `used_kb` never exceeds `total_kb` at the
/// moment an ingestion is admitted and never goes below zero.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StorageQuota {
    pub user_id: String,
    pub total_kb: i64,
    pub used_kb: i64,
}

impl StorageQuota {
    pub fn remaining_kb(&self) -> i64 {
        (self.total_kb - self.used_kb).max(0)
    }
}
