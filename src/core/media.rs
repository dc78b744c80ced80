use crate::{core::model::file::MediaType, error::CumulusError};
use serde::Serialize;
use std::path::Path;

/// Intrinsic attributes extracted from a media file's bytes. Which fields
/// are populated depends on the media category.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MediaAttributes {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
    pub fps: Option<f64>,
}

/// Extracts media attributes and renders thumbnails. Invoked only after
/// the uploaded bytes are durably on disk and the file row is committed;
/// implementations may block for seconds on large video and must not hold
/// any lock on shared state.
#[async_trait::async_trait]
pub trait MediaProbe {
    /// Extract the intrinsic attributes of the file at `path`.
    ///
    /// Video yields width/height, duration and frame rate; image yields
    /// width/height; audio yields duration only. `Other` is rejected with
    /// `UnsupportedMediaType`.
    async fn probe(
        &self,
        path: &Path,
        media_type: MediaType,
    ) -> Result<MediaAttributes, CumulusError>;

    /// Render a fixed-size JPEG thumbnail of the file at `src` to `dest`.
    /// Video snapshots are taken near the 1-second mark; images are
    /// center-cropped. Audio and `Other` are rejected.
    async fn thumbnail(
        &self,
        src: &Path,
        media_type: MediaType,
        dest: &Path,
    ) -> Result<(), CumulusError>;
}
