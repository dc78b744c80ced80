use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Folder metadata row. Folders form a tree per user, rooted at the
/// `main` folder (`parent_id` is `NULL`). The physical location of a
/// folder is derived from the parent chain, never stored.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Folder {
    pub id: i64,

    /// Owner.
    pub user_id: String,

    /// Final path segment of the folder.
    pub name: String,

    /// `None` marks the per-user root folder.
    pub parent_id: Option<i64>,

    pub created_at: DateTime<Utc>,
}

impl Folder {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Insert payload for folder metadata.
#[derive(Debug)]
pub struct FolderInsert<'a> {
    pub user_id: &'a str,
    pub name: &'a str,
    pub parent_id: Option<i64>,
}

impl<'a> FolderInsert<'a> {
    pub fn new(user_id: &'a str, name: &'a str, parent_id: Option<i64>) -> Self {
        Self {
            user_id,
            name,
            parent_id,
        }
    }
}
