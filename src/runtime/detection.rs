// ABOUTME: Runtime detection logic for the local system.
// ABOUTME: Checks for Podman sockets first, then Docker, unless explicitly configured.

use std::path::Path;

use super::types::{DOCKER_SOCKET, ROOTFUL_PODMAN_SOCKET, RuntimeSocket, RuntimeType, SocketOverride};

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked Podman and Docker sockets)")]
    NoRuntimeFound,
}

/// Detect container runtime on the local system.
///
/// Detection order:
/// 1. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 2. Rootful Podman socket (`/run/podman/podman.sock`)
/// 3. Docker socket (`/var/run/docker.sock`)
pub fn detect_local() -> Result<RuntimeSocket, DetectionError> {
    if let Some(uid) = get_uid() {
        let rootless_socket = format!("/run/user/{}/podman/podman.sock", uid);
        if Path::new(&rootless_socket).exists() {
            return Ok(RuntimeSocket {
                runtime_type: RuntimeType::Podman,
                path: rootless_socket,
            });
        }
    }

    if Path::new(ROOTFUL_PODMAN_SOCKET).exists() {
        return Ok(RuntimeSocket {
            runtime_type: RuntimeType::Podman,
            path: ROOTFUL_PODMAN_SOCKET.to_string(),
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(RuntimeSocket {
            runtime_type: RuntimeType::Docker,
            path: DOCKER_SOCKET.to_string(),
        });
    }

    Err(DetectionError::NoRuntimeFound)
}

/// Resolve the runtime for a socket connection.
///
/// Explicit config wins; a socket without a runtime type is classified by
/// its path; otherwise the local system is probed.
pub fn resolve_runtime(config: &SocketOverride) -> Result<RuntimeSocket, DetectionError> {
    match (config.runtime, config.socket.as_deref()) {
        (Some(runtime_type), socket) => Ok(RuntimeSocket {
            runtime_type,
            path: socket.unwrap_or(runtime_type.default_socket()).to_string(),
        }),
        (None, Some(socket)) => Ok(RuntimeSocket {
            runtime_type: RuntimeType::from_socket_path(socket),
            path: socket.to_string(),
        }),
        (None, None) => detect_local(),
    }
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        // Fall back to reading /proc/self/status
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}
