use serde::{Deserialize, Serialize};

pub mod file;
pub mod folder;
pub mod quota;

/// Offset-based pagination used by every listing operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of items per page.
    pub per_page: i64,

    /// 1-based page number.
    pub page: i64,
}

impl Pagination {
    pub fn new(per_page: i64, page: i64) -> Self {
        Self { per_page, page }
    }

    pub fn limit_offset(&self) -> (i64, i64) {
        let page = self.page.max(1);
        (self.per_page, (page - 1) * self.per_page)
    }
}

/// Sorting direction for listings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Total page count for a listing; 0 when there are no items.
pub fn page_count(total: i64, per_page: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + per_page - 1) / per_page
    }
}
