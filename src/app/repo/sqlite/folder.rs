use super::placeholders;
use crate::{
    core::{
        model::{
            folder::{Folder, FolderInsert},
            Pagination,
        },
        repo::{folder::FolderRepo, Atomic},
    },
    error::CumulusError,
    map_err,
};
use chrono::Utc;
use sqlx::SqlitePool;

#[async_trait::async_trait]
impl FolderRepo for SqlitePool {
    async fn get_folder(&self, id: i64) -> Result<Option<Folder>, CumulusError> {
        let folder = map_err!(
            sqlx::query_as::<_, Folder>(
                "SELECT id, user_id, name, parent_id, created_at FROM folders WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(self)
            .await
        );

        Ok(folder)
    }

    async fn get_root_folder(&self, user_id: &str) -> Result<Option<Folder>, CumulusError> {
        let folder = map_err!(
            sqlx::query_as::<_, Folder>(
                "SELECT id, user_id, name, parent_id, created_at
                 FROM folders
                 WHERE user_id = ? AND parent_id IS NULL",
            )
            .bind(user_id)
            .fetch_optional(self)
            .await
        );

        Ok(folder)
    }

    async fn insert_folder(&self, folder: FolderInsert<'_>) -> Result<Folder, CumulusError> {
        let created_at = Utc::now();

        let result = map_err!(
            sqlx::query(
                "INSERT INTO folders (user_id, name, parent_id, created_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(folder.user_id)
            .bind(folder.name)
            .bind(folder.parent_id)
            .bind(created_at)
            .execute(self)
            .await
        );

        Ok(Folder {
            id: result.last_insert_rowid(),
            user_id: folder.user_id.to_string(),
            name: folder.name.to_string(),
            parent_id: folder.parent_id,
            created_at,
        })
    }

    async fn rename_folder(&self, id: i64, name: &str) -> Result<u64, CumulusError> {
        let result = map_err!(
            sqlx::query("UPDATE folders SET name = ? WHERE id = ?")
                .bind(name)
                .bind(id)
                .execute(self)
                .await
        );

        Ok(result.rows_affected())
    }

    async fn list_child_folders(&self, parent_id: i64) -> Result<Vec<Folder>, CumulusError> {
        let folders = map_err!(
            sqlx::query_as::<_, Folder>(
                "SELECT id, user_id, name, parent_id, created_at
                 FROM folders
                 WHERE parent_id = ?",
            )
            .bind(parent_id)
            .fetch_all(self)
            .await
        );

        Ok(folders)
    }

    async fn list_child_folders_page(
        &self,
        user_id: &str,
        parent_id: i64,
        p: Pagination,
    ) -> Result<Vec<Folder>, CumulusError> {
        let (limit, offset) = p.limit_offset();

        let folders = map_err!(
            sqlx::query_as::<_, Folder>(
                "SELECT id, user_id, name, parent_id, created_at
                 FROM folders
                 WHERE user_id = ? AND parent_id = ?
                 ORDER BY created_at DESC, id DESC
                 LIMIT ? OFFSET ?",
            )
            .bind(user_id)
            .bind(parent_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self)
            .await
        );

        Ok(folders)
    }

    async fn count_child_folders(
        &self,
        user_id: &str,
        parent_id: i64,
    ) -> Result<i64, CumulusError> {
        let count: (i64,) = map_err!(
            sqlx::query_as(
                "SELECT COUNT(*) FROM folders WHERE user_id = ? AND parent_id = ?",
            )
            .bind(user_id)
            .bind(parent_id)
            .fetch_one(self)
            .await
        );

        Ok(count.0)
    }

    async fn list_folders(
        &self,
        user_id: &str,
        p: Pagination,
    ) -> Result<Vec<Folder>, CumulusError> {
        let (limit, offset) = p.limit_offset();

        let folders = map_err!(
            sqlx::query_as::<_, Folder>(
                "SELECT id, user_id, name, parent_id, created_at
                 FROM folders
                 WHERE user_id = ? AND parent_id IS NOT NULL
                 ORDER BY created_at DESC, id DESC
                 LIMIT ? OFFSET ?",
            )
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self)
            .await
        );

        Ok(folders)
    }

    async fn count_folders(&self, user_id: &str) -> Result<i64, CumulusError> {
        let count: (i64,) = map_err!(
            sqlx::query_as(
                "SELECT COUNT(*) FROM folders WHERE user_id = ? AND parent_id IS NOT NULL",
            )
            .bind(user_id)
            .fetch_one(self)
            .await
        );

        Ok(count.0)
    }

    async fn remove_folders(
        &self,
        ids: &[i64],
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<u64, CumulusError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let query = format!(
            "DELETE FROM folders WHERE id IN ({})",
            placeholders(ids.len())
        );

        let mut query = sqlx::query(&query);
        for id in ids {
            query = query.bind(id);
        }

        let result = map_err!(query.execute(&mut **tx).await);

        Ok(result.rows_affected())
    }
}
