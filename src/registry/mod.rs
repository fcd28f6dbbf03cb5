// ABOUTME: Registry tag listing used to diff and locate image versions.
// ABOUTME: Defines the TagLister seam and its OCI distribution client implementation.

mod client;
mod error;

pub use client::OciTagLister;
pub use error::RegistryError;

use async_trait::async_trait;

use crate::config::RemoteRepository;
use crate::runtime::traits::sealed::Sealed;
use crate::types::ImageRef;

/// Lists the tags a repository holds for one image.
#[async_trait]
pub trait TagLister: Sealed + Send + Sync {
    /// Tags for `image` on `repo`, in the order the registry returned them.
    ///
    /// Returns [`RegistryError::NotFound`] when the registry has never seen
    /// the image.
    async fn list_tags(
        &self,
        repo: &RemoteRepository,
        image: &ImageRef,
    ) -> Result<Vec<String>, RegistryError>;
}
