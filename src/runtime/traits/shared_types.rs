// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: RegistryAuth, RegistryAccess, and RuntimeMetadata.

use std::collections::BTreeMap;

/// Registry authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    /// Username.
    pub username: String,
    /// Password or token.
    pub password: String,
    /// Registry server (e.g., "ghcr.io").
    pub server: Option<String>,
}

impl std::fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

/// How to reach a registry for one pull or push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryAccess {
    /// Credentials, if the registry requires them.
    pub auth: Option<RegistryAuth>,
    /// Relax transport security for this registry only.
    pub insecure: bool,
    /// Extra headers sent with requests the crate builds itself.
    pub meta_headers: BTreeMap<String, Vec<String>>,
}

/// Runtime metadata.
#[derive(Debug, Clone)]
pub struct RuntimeMetadata {
    /// Runtime name (e.g., "Docker", "Podman").
    pub name: String,
    /// Runtime version.
    pub version: String,
    /// API version.
    pub api_version: String,
    /// Operating system.
    pub os: String,
    /// Architecture.
    pub arch: String,
}
