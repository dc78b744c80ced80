use super::placeholders;
use crate::{
    core::{
        model::{
            file::{
                AudioMeta, BinnedFile, File, FileInsert, FileListItem, FolderFile, ImageMeta,
                MediaType, VideoMeta,
            },
            folder::Folder,
            Pagination, SortOrder,
        },
        repo::{file::FileRepo, Atomic},
    },
    error::CumulusError,
    map_err,
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Columns of the listing read model. `is_favourite` is derived; binned
/// files are filtered out by `LIVE`.
const LIST_COLUMNS: &str = "f.id, f.name, f.unique_name, f.size_kb, f.extension, f.media_type, f.created_at,
     EXISTS (SELECT 1 FROM favourites fav WHERE fav.file_id = f.id) AS is_favourite";

const LIVE: &str = "NOT EXISTS (SELECT 1 FROM deleted_files d WHERE d.file_id = f.id)";

#[async_trait::async_trait]
impl FileRepo for SqlitePool {
    async fn get_file(&self, user_id: &str, id: i64) -> Result<Option<File>, CumulusError> {
        let file = map_err!(
            sqlx::query_as::<_, File>(
                "SELECT id, user_id, name, unique_name, size_kb, extension, media_type, created_at
                 FROM files
                 WHERE user_id = ? AND id = ?",
            )
            .bind(user_id)
            .bind(id)
            .fetch_optional(self)
            .await
        );

        Ok(file)
    }

    async fn insert_file(
        &self,
        file: FileInsert<'_>,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<File, CumulusError> {
        let created_at = Utc::now();

        let result = map_err!(
            sqlx::query(
                "INSERT INTO files (user_id, name, unique_name, size_kb, extension, media_type, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(file.user_id)
            .bind(file.name)
            .bind(file.unique_name)
            .bind(file.size_kb)
            .bind(file.extension)
            .bind(file.media_type)
            .bind(created_at)
            .execute(&mut **tx)
            .await
        );

        Ok(File {
            id: result.last_insert_rowid(),
            user_id: file.user_id.to_string(),
            name: file.name.to_string(),
            unique_name: file.unique_name.to_string(),
            size_kb: file.size_kb,
            extension: file.extension.to_string(),
            media_type: file.media_type,
            created_at,
        })
    }

    async fn set_file_parent(
        &self,
        file_id: i64,
        folder_id: i64,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<(), CumulusError> {
        map_err!(
            sqlx::query("INSERT INTO file_parents (file_id, folder_id) VALUES (?, ?)")
                .bind(file_id)
                .bind(folder_id)
                .execute(&mut **tx)
                .await
        );

        Ok(())
    }

    async fn update_file_parent(
        &self,
        file_id: i64,
        folder_id: i64,
    ) -> Result<u64, CumulusError> {
        let result = map_err!(
            sqlx::query("UPDATE file_parents SET folder_id = ? WHERE file_id = ?")
                .bind(folder_id)
                .bind(file_id)
                .execute(self)
                .await
        );

        Ok(result.rows_affected())
    }

    async fn get_parent_folder(&self, file_id: i64) -> Result<Option<Folder>, CumulusError> {
        let folder = map_err!(
            sqlx::query_as::<_, Folder>(
                "SELECT fo.id, fo.user_id, fo.name, fo.parent_id, fo.created_at
                 FROM folders fo
                 JOIN file_parents fp ON fp.folder_id = fo.id
                 WHERE fp.file_id = ?",
            )
            .bind(file_id)
            .fetch_optional(self)
            .await
        );

        Ok(folder)
    }

    async fn list_folder_files(
        &self,
        user_id: &str,
        folder_id: i64,
        p: Pagination,
    ) -> Result<Vec<FileListItem>, CumulusError> {
        let (limit, offset) = p.limit_offset();

        let query = format!(
            "SELECT {LIST_COLUMNS}
             FROM files f
             JOIN file_parents fp ON fp.file_id = f.id
             WHERE f.user_id = ? AND fp.folder_id = ? AND {LIVE}
             ORDER BY f.created_at DESC, f.id DESC
             LIMIT ? OFFSET ?"
        );

        let files = map_err!(
            sqlx::query_as::<_, FileListItem>(&query)
                .bind(user_id)
                .bind(folder_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self)
                .await
        );

        Ok(files)
    }

    async fn count_folder_files(
        &self,
        user_id: &str,
        folder_id: i64,
    ) -> Result<i64, CumulusError> {
        let query = format!(
            "SELECT COUNT(*)
             FROM files f
             JOIN file_parents fp ON fp.file_id = f.id
             WHERE f.user_id = ? AND fp.folder_id = ? AND {LIVE}"
        );

        let count: (i64,) = map_err!(
            sqlx::query_as(&query)
                .bind(user_id)
                .bind(folder_id)
                .fetch_one(self)
                .await
        );

        Ok(count.0)
    }

    async fn list_files_in_folders(
        &self,
        ids: &[i64],
    ) -> Result<Vec<FolderFile>, CumulusError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let query = format!(
            "SELECT fp.folder_id,
                    f.id, f.user_id, f.name, f.unique_name, f.size_kb, f.extension,
                    f.media_type, f.created_at
             FROM files f
             JOIN file_parents fp ON fp.file_id = f.id
             WHERE fp.folder_id IN ({})",
            placeholders(ids.len())
        );

        let mut query = sqlx::query_as::<_, FolderFile>(&query);
        for id in ids {
            query = query.bind(id);
        }

        let files = map_err!(query.fetch_all(self).await);

        Ok(files)
    }

    async fn remove_files(
        &self,
        ids: &[i64],
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<u64, CumulusError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let query = format!(
            "DELETE FROM files WHERE id IN ({})",
            placeholders(ids.len())
        );

        let mut query = sqlx::query(&query);
        for id in ids {
            query = query.bind(id);
        }

        let result = map_err!(query.execute(&mut **tx).await);

        Ok(result.rows_affected())
    }

    async fn remove_file(
        &self,
        id: i64,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<u64, CumulusError> {
        let result = map_err!(
            sqlx::query("DELETE FROM files WHERE id = ?")
                .bind(id)
                .execute(&mut **tx)
                .await
        );

        Ok(result.rows_affected())
    }

    async fn list_recent_files(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<FileListItem>, CumulusError> {
        let query = format!(
            "SELECT {LIST_COLUMNS}
             FROM files f
             WHERE f.user_id = ? AND {LIVE}
             ORDER BY f.created_at DESC, f.id DESC
             LIMIT ?"
        );

        let files = map_err!(
            sqlx::query_as::<_, FileListItem>(&query)
                .bind(user_id)
                .bind(limit)
                .fetch_all(self)
                .await
        );

        Ok(files)
    }

    async fn list_files_by_type(
        &self,
        user_id: &str,
        media_type: MediaType,
        extension: Option<&str>,
        order: SortOrder,
        p: Pagination,
    ) -> Result<Vec<FileListItem>, CumulusError> {
        let (limit, offset) = p.limit_offset();

        let ext_clause = if extension.is_some() {
            "AND f.extension = ?"
        } else {
            ""
        };

        let query = format!(
            "SELECT {LIST_COLUMNS}
             FROM files f
             WHERE f.user_id = ? AND f.media_type = ? {ext_clause} AND {LIVE}
             ORDER BY f.created_at {order}, f.id {order}
             LIMIT ? OFFSET ?",
            order = order.as_sql()
        );

        let mut query = sqlx::query_as::<_, FileListItem>(&query)
            .bind(user_id)
            .bind(media_type);

        if let Some(ext) = extension {
            query = query.bind(ext);
        }

        let files = map_err!(query.bind(limit).bind(offset).fetch_all(self).await);

        Ok(files)
    }

    async fn count_files_by_type(
        &self,
        user_id: &str,
        media_type: MediaType,
        extension: Option<&str>,
    ) -> Result<i64, CumulusError> {
        let ext_clause = if extension.is_some() {
            "AND f.extension = ?"
        } else {
            ""
        };

        let query = format!(
            "SELECT COUNT(*)
             FROM files f
             WHERE f.user_id = ? AND f.media_type = ? {ext_clause} AND {LIVE}"
        );

        let mut query = sqlx::query_as::<_, (i64,)>(&query)
            .bind(user_id)
            .bind(media_type);

        if let Some(ext) = extension {
            query = query.bind(ext);
        }

        let count = map_err!(query.fetch_one(self).await);

        Ok(count.0)
    }

    async fn mark_deleted(&self, file_id: i64) -> Result<(), CumulusError> {
        map_err!(
            sqlx::query("INSERT INTO deleted_files (file_id, deleted_at) VALUES (?, ?)")
                .bind(file_id)
                .bind(Utc::now())
                .execute(self)
                .await
        );

        Ok(())
    }

    async fn get_deleted_at(
        &self,
        file_id: i64,
    ) -> Result<Option<DateTime<Utc>>, CumulusError> {
        let row: Option<(DateTime<Utc>,)> = map_err!(
            sqlx::query_as("SELECT deleted_at FROM deleted_files WHERE file_id = ?")
                .bind(file_id)
                .fetch_optional(self)
                .await
        );

        Ok(row.map(|r| r.0))
    }

    async fn unmark_deleted(&self, file_id: i64) -> Result<u64, CumulusError> {
        let result = map_err!(
            sqlx::query("DELETE FROM deleted_files WHERE file_id = ?")
                .bind(file_id)
                .execute(self)
                .await
        );

        Ok(result.rows_affected())
    }

    async fn list_deleted_files(
        &self,
        user_id: &str,
        media_type: Option<MediaType>,
        order: SortOrder,
        p: Pagination,
    ) -> Result<Vec<BinnedFile>, CumulusError> {
        let (limit, offset) = p.limit_offset();

        let type_clause = if media_type.is_some() {
            "AND f.media_type = ?"
        } else {
            ""
        };

        let query = format!(
            "SELECT f.id, f.name, f.unique_name, f.size_kb, f.extension, f.media_type,
                    f.created_at, d.deleted_at
             FROM files f
             JOIN deleted_files d ON d.file_id = f.id
             WHERE f.user_id = ? {type_clause}
             ORDER BY d.deleted_at {order}, f.id {order}
             LIMIT ? OFFSET ?",
            order = order.as_sql()
        );

        let mut query = sqlx::query_as::<_, BinnedFile>(&query).bind(user_id);

        if let Some(media_type) = media_type {
            query = query.bind(media_type);
        }

        let files = map_err!(query.bind(limit).bind(offset).fetch_all(self).await);

        Ok(files)
    }

    async fn count_deleted_files(
        &self,
        user_id: &str,
        media_type: Option<MediaType>,
    ) -> Result<i64, CumulusError> {
        let type_clause = if media_type.is_some() {
            "AND f.media_type = ?"
        } else {
            ""
        };

        let query = format!(
            "SELECT COUNT(*)
             FROM files f
             JOIN deleted_files d ON d.file_id = f.id
             WHERE f.user_id = ? {type_clause}"
        );

        let mut query = sqlx::query_as::<_, (i64,)>(&query).bind(user_id);

        if let Some(media_type) = media_type {
            query = query.bind(media_type);
        }

        let count = map_err!(query.fetch_one(self).await);

        Ok(count.0)
    }

    async fn insert_video_meta(&self, meta: VideoMeta) -> Result<(), CumulusError> {
        map_err!(
            sqlx::query(
                "INSERT INTO videos (file_id, width, height, duration_secs, fps, thumbnail)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(meta.file_id)
            .bind(meta.width)
            .bind(meta.height)
            .bind(meta.duration_secs)
            .bind(meta.fps)
            .bind(meta.thumbnail)
            .execute(self)
            .await
        );

        Ok(())
    }

    async fn insert_image_meta(&self, meta: ImageMeta) -> Result<(), CumulusError> {
        map_err!(
            sqlx::query(
                "INSERT INTO images (file_id, width, height, thumbnail)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(meta.file_id)
            .bind(meta.width)
            .bind(meta.height)
            .bind(meta.thumbnail)
            .execute(self)
            .await
        );

        Ok(())
    }

    async fn insert_audio_meta(&self, meta: AudioMeta) -> Result<(), CumulusError> {
        map_err!(
            sqlx::query("INSERT INTO audios (file_id, duration_secs) VALUES (?, ?)")
                .bind(meta.file_id)
                .bind(meta.duration_secs)
                .execute(self)
                .await
        );

        Ok(())
    }

    async fn get_video_meta(&self, file_id: i64) -> Result<Option<VideoMeta>, CumulusError> {
        let meta = map_err!(
            sqlx::query_as::<_, VideoMeta>(
                "SELECT file_id, width, height, duration_secs, fps, thumbnail
                 FROM videos
                 WHERE file_id = ?",
            )
            .bind(file_id)
            .fetch_optional(self)
            .await
        );

        Ok(meta)
    }

    async fn get_image_meta(&self, file_id: i64) -> Result<Option<ImageMeta>, CumulusError> {
        let meta = map_err!(
            sqlx::query_as::<_, ImageMeta>(
                "SELECT file_id, width, height, thumbnail FROM images WHERE file_id = ?",
            )
            .bind(file_id)
            .fetch_optional(self)
            .await
        );

        Ok(meta)
    }

    async fn get_audio_meta(&self, file_id: i64) -> Result<Option<AudioMeta>, CumulusError> {
        let meta = map_err!(
            sqlx::query_as::<_, AudioMeta>(
                "SELECT file_id, duration_secs FROM audios WHERE file_id = ?",
            )
            .bind(file_id)
            .fetch_optional(self)
            .await
        );

        Ok(meta)
    }

    async fn set_favourite(&self, user_id: &str, file_id: i64) -> Result<(), CumulusError> {
        map_err!(
            sqlx::query(
                "INSERT OR IGNORE INTO favourites (user_id, file_id) VALUES (?, ?)",
            )
            .bind(user_id)
            .bind(file_id)
            .execute(self)
            .await
        );

        Ok(())
    }

    async fn is_favourite(&self, file_id: i64) -> Result<bool, CumulusError> {
        let row: Option<(i64,)> = map_err!(
            sqlx::query_as("SELECT 1 FROM favourites WHERE file_id = ?")
                .bind(file_id)
                .fetch_optional(self)
                .await
        );

        Ok(row.is_some())
    }

    async fn tag_file(&self, file_id: i64, tag: &str) -> Result<(), CumulusError> {
        map_err!(
            sqlx::query("INSERT OR IGNORE INTO file_tags (file_id, tag) VALUES (?, ?)")
                .bind(file_id)
                .bind(tag)
                .execute(self)
                .await
        );

        Ok(())
    }

    async fn list_file_tags(&self, file_id: i64) -> Result<Vec<String>, CumulusError> {
        let tags = map_err!(
            sqlx::query_scalar::<_, String>(
                "SELECT tag FROM file_tags WHERE file_id = ? ORDER BY tag",
            )
            .bind(file_id)
            .fetch_all(self)
            .await
        );

        Ok(tags)
    }
}
