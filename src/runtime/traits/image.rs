// ABOUTME: Image operations trait for container runtimes.
// ABOUTME: Pull from a source registry, re-tag locally, and push to a destination.

use super::sealed::Sealed;
use super::shared_types::RegistryAccess;
use crate::types::ImageRef;
use async_trait::async_trait;

/// Image transfer operations. Each call runs to completion; no timeout is
/// imposed here.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// Pull `reference:tag` into the daemon.
    async fn pull_image(
        &self,
        reference: &ImageRef,
        tag: &str,
        access: &RegistryAccess,
    ) -> Result<(), ImageError>;

    /// Add `target:tag` as a name for the existing `source:tag`.
    async fn tag_image(
        &self,
        source: &ImageRef,
        target: &ImageRef,
        tag: &str,
    ) -> Result<(), ImageError>;

    /// Push `reference:tag` to the registry named by the reference.
    async fn push_image(
        &self,
        reference: &ImageRef,
        tag: &str,
        access: &RegistryAccess,
    ) -> Result<(), ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("authentication failed for registry: {0}")]
    AuthenticationFailed(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("tag failed: {0}")]
    TagFailed(String),

    #[error("push failed: {0}")]
    PushFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
