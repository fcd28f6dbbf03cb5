// ABOUTME: Container runtime kinds and the daemon sockets they listen on.
// ABOUTME: RuntimeSocket pairs a runtime with its socket; SocketOverride carries config choices.

use std::fmt;

use serde::{Deserialize, Serialize};

pub(crate) const ROOTFUL_PODMAN_SOCKET: &str = "/run/podman/podman.sock";
pub(crate) const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Which daemon sits behind an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Docker,
    Podman,
}

impl RuntimeType {
    /// Guess the runtime from a socket path.
    pub fn from_socket_path(path: &str) -> Self {
        if path.contains("podman") {
            RuntimeType::Podman
        } else {
            RuntimeType::Docker
        }
    }

    /// Socket a stock rootful install listens on.
    pub fn default_socket(self) -> &'static str {
        match self {
            RuntimeType::Docker => DOCKER_SOCKET,
            RuntimeType::Podman => ROOTFUL_PODMAN_SOCKET,
        }
    }

    /// Whether pull and push can skip TLS verification per request.
    ///
    /// Only the libpod API takes `tlsVerify=false`; Docker relies on its
    /// daemon-wide insecure-registries list.
    pub fn relaxes_tls_per_request(self) -> bool {
        matches!(self, RuntimeType::Podman)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RuntimeType::Docker => "Docker",
            RuntimeType::Podman => "Podman",
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuntimeType::Docker => "docker",
            RuntimeType::Podman => "podman",
        })
    }
}

/// A daemon socket on this host and the runtime behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSocket {
    pub runtime_type: RuntimeType,
    pub path: String,
}

impl RuntimeSocket {
    pub fn endpoint(&self) -> String {
        format!("unix://{}", self.path)
    }
}

/// Runtime and socket pinned in `dockerConfig`. Unset fields are detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketOverride {
    pub runtime: Option<RuntimeType>,
    pub socket: Option<String>,
}
