// ABOUTME: Non-fatal failures recorded during a reconciliation pass.
// ABOUTME: Each names the image and repository involved; none of them stops the worker.

use crate::registry::RegistryError;
use crate::runtime::ImageError;
use crate::types::ParseImageRefError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("invalid image name {image}: {source}")]
    InvalidImage {
        image: String,
        source: ParseImageRefError,
    },

    #[error("cannot name {image} under prefix {prefix:?}: {source}")]
    Naming {
        image: String,
        prefix: String,
        source: ParseImageRefError,
    },

    #[error("local repository {repository} unavailable for {image}: {source}")]
    LocalRepository {
        repository: String,
        image: String,
        source: RegistryError,
    },

    #[error("remote repository {repository} unavailable for {image}: {source}")]
    RemoteRepository {
        repository: String,
        image: String,
        source: RegistryError,
    },

    #[error("pull of {image}:{tag} from {origin} failed: {source}")]
    Pull {
        image: String,
        tag: String,
        origin: String,
        source: ImageError,
    },

    #[error("tagging {image}:{tag} as {destination} failed: {source}")]
    Tag {
        image: String,
        tag: String,
        destination: String,
        source: ImageError,
    },

    #[error("push of {destination}:{tag} failed: {source}")]
    Push {
        image: String,
        tag: String,
        destination: String,
        source: ImageError,
    },
}

/// Which step of a pass failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    InvalidImage,
    LocalRepository,
    RemoteRepository,
    Pull,
    Tag,
    Push,
}

impl SyncError {
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            SyncError::InvalidImage { .. } | SyncError::Naming { .. } => {
                SyncErrorKind::InvalidImage
            }
            SyncError::LocalRepository { .. } => SyncErrorKind::LocalRepository,
            SyncError::RemoteRepository { .. } => SyncErrorKind::RemoteRepository,
            SyncError::Pull { .. } => SyncErrorKind::Pull,
            SyncError::Tag { .. } => SyncErrorKind::Tag,
            SyncError::Push { .. } => SyncErrorKind::Push,
        }
    }

    /// The declared image the failure concerns.
    pub fn image(&self) -> &str {
        match self {
            SyncError::InvalidImage { image, .. }
            | SyncError::Naming { image, .. }
            | SyncError::LocalRepository { image, .. }
            | SyncError::RemoteRepository { image, .. }
            | SyncError::Pull { image, .. }
            | SyncError::Tag { image, .. }
            | SyncError::Push { image, .. } => image,
        }
    }
}
