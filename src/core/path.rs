use crate::{core::repo::folder::FolderRepo, err, error::CumulusError};
use std::path::PathBuf;

/// Upper bound on the folder-chain walk; the tree is acyclic by
/// construction, so hitting this means corrupted parent rows.
const MAX_FOLDER_DEPTH: usize = 128;

/// Directory under each user root holding generated thumbnails.
const THUMBNAIL_DIR: &str = ".thumbnails";

/// Computes the on-disk location of folders from the folder metadata
/// store. Every component resolves paths through this so the physical
/// layout and the DB layout stay in lockstep. Folders store only
/// `(parent_id, name)`; the full path is derived here by walking the
/// parent chain.
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// The base directory of the storage hierarchy.
    base: PathBuf,
}

impl PathResolver {
    /// * `base`: Base directory. Must exist.
    pub fn new(base: &str) -> Self {
        let base = PathBuf::from(base)
            .canonicalize()
            .expect("unable to canonicalize upload path");

        if !base.is_dir() {
            panic!("not a directory: {}", base.display());
        }

        Self { base }
    }

    /// The directory holding everything a user owns.
    pub fn user_root(&self, user_id: &str) -> PathBuf {
        self.base.join(user_id)
    }

    /// The directory holding a user's generated thumbnails.
    pub fn thumbnail_dir(&self, user_id: &str) -> PathBuf {
        self.user_root(user_id).join(THUMBNAIL_DIR)
    }

    /// Absolute directory of a folder: the owner's root plus the chain of
    /// folder names from the root (exclusive) down to the folder. The root
    /// folder itself resolves to the user root. Deterministic over the
    /// folder state, no side effects.
    pub async fn resolve<R>(&self, repo: &R, folder_id: i64) -> Result<PathBuf, CumulusError>
    where
        R: FolderRepo + Sync + ?Sized,
    {
        let Some(mut current) = repo.get_folder(folder_id).await? else {
            return err!(DoesNotExist, "Folder with ID {folder_id}");
        };

        let user_id = current.user_id.clone();
        let mut segments = Vec::new();

        while let Some(parent_id) = current.parent_id {
            if segments.len() >= MAX_FOLDER_DEPTH {
                return err!(
                    InvalidInput,
                    "folder chain of {folder_id} exceeds {MAX_FOLDER_DEPTH} levels"
                );
            }

            segments.push(current.name);

            current = match repo.get_folder(parent_id).await? {
                Some(folder) => folder,
                None => return err!(DoesNotExist, "Folder with ID {parent_id}"),
            };
        }

        let mut path = self.user_root(&user_id);
        for segment in segments.iter().rev() {
            path.push(segment);
        }

        Ok(path)
    }
}
