use crate::core::{media::MediaProbe, path::PathResolver, storage::FileStorage};
use std::sync::Arc;

/// Downstream providers the services need besides the repository.
#[derive(Clone)]
pub struct ProviderState {
    /// Physical byte storage.
    pub storage: Arc<dyn FileStorage + Send + Sync>,

    /// Media attribute extraction and thumbnailing.
    pub media: Arc<dyn MediaProbe + Send + Sync>,

    /// On-disk layout.
    pub paths: PathResolver,
}
