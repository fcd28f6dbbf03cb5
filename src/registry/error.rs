// ABOUTME: Errors from registry tag listing.
// ABOUTME: NotFound is kept apart so callers can treat an unknown repository as empty.

/// Errors from listing tags on a registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The registry does not know this repository.
    #[error("repository not found: {0}")]
    NotFound(String),

    #[error("invalid registry endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("failed to connect to registry {registry}: {message}")]
    Connection { registry: String, message: String },

    #[error("tag listing failed for {repository}: {message}")]
    Query { repository: String, message: String },
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }
}
