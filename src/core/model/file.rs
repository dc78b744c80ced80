use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Media category derived from the declared content type at upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Other,
}

impl MediaType {
    /// Category from a declared MIME type, e.g. `video/mp4` -> `Video`.
    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next().unwrap_or_default() {
            "image" => MediaType::Image,
            "video" => MediaType::Video,
            "audio" => MediaType::Audio,
            _ => MediaType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Other => "other",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// File metadata row. The bytes live at
/// `<user root>/<folder chain>/<unique_name>`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct File {
    pub id: i64,

    /// Owner.
    pub user_id: String,

    /// Display name, as uploaded.
    pub name: String,

    /// Collision-resistant storage name (timestamp-prefixed display name).
    pub unique_name: String,

    /// Size in kilobytes, rounded up.
    pub size_kb: i64,

    /// Lowercased extension of the display name.
    pub extension: String,

    pub media_type: MediaType,

    pub created_at: DateTime<Utc>,
}

/// Insert payload for file metadata.
#[derive(Debug)]
pub struct FileInsert<'a> {
    pub user_id: &'a str,
    pub name: &'a str,
    pub unique_name: &'a str,
    pub size_kb: i64,
    pub extension: &'a str,
    pub media_type: MediaType,
}

impl<'a> FileInsert<'a> {
    pub fn new(
        user_id: &'a str,
        name: &'a str,
        unique_name: &'a str,
        size_kb: i64,
        extension: &'a str,
        media_type: MediaType,
    ) -> Self {
        Self {
            user_id,
            name,
            unique_name,
            size_kb,
            extension,
            media_type,
        }
    }
}

/// Read model for file listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FileListItem {
    pub id: i64,
    pub name: String,
    pub unique_name: String,
    pub size_kb: i64,
    pub extension: String,
    pub media_type: MediaType,
    pub created_at: DateTime<Utc>,
    pub is_favourite: bool,
}

/// Read model for the bin listing; ordered by `deleted_at`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BinnedFile {
    pub id: i64,
    pub name: String,
    pub unique_name: String,
    pub size_kb: i64,
    pub extension: String,
    pub media_type: MediaType,
    pub created_at: DateTime<Utc>,
    pub deleted_at: DateTime<Utc>,
}

/// A file paired with its parent folder id; used by the recursive
/// folder delete to locate the bytes of every descendant file.
#[derive(Debug, Clone, FromRow)]
pub struct FolderFile {
    pub folder_id: i64,

    #[sqlx(flatten)]
    pub file: File,
}

/// Video-specific metadata extracted by the media prober.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VideoMeta {
    pub file_id: i64,
    pub width: i64,
    pub height: i64,
    pub duration_secs: f64,
    pub fps: f64,
    pub thumbnail: Option<String>,
}

/// Image-specific metadata extracted by the media prober.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ImageMeta {
    pub file_id: i64,
    pub width: i64,
    pub height: i64,
    pub thumbnail: Option<String>,
}

/// Audio-specific metadata extracted by the media prober.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AudioMeta {
    pub file_id: i64,
    pub duration_secs: f64,
}
