// ABOUTME: Runtime error types with SNAFU pattern.
// ABOUTME: Unifies detection and connection errors for programmatic handling.

use snafu::Snafu;

use super::detection::DetectionError;
use super::traits::RuntimeInfoError;

/// Unified runtime error for detection and connection failures.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuntimeError {
    #[snafu(display("runtime detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("runtime connection failed: {source}"))]
    Connection { source: RuntimeInfoError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// No container runtime found on the system.
    NoRuntimeFound,
    /// Endpoint could not be parsed or is unsupported.
    InvalidEndpoint,
    /// Failed to connect to runtime socket.
    ConnectionFailed,
    /// Runtime operation error.
    RuntimeOperation,
}

impl RuntimeError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::Detection { source } => match source {
                DetectionError::NoRuntimeFound => RuntimeErrorKind::NoRuntimeFound,
            },
            RuntimeError::Connection { source } => match source {
                RuntimeInfoError::InvalidEndpoint(_) => RuntimeErrorKind::InvalidEndpoint,
                RuntimeInfoError::ConnectionFailed(_) => RuntimeErrorKind::ConnectionFailed,
                RuntimeInfoError::Runtime(_) => RuntimeErrorKind::RuntimeOperation,
            },
        }
    }

}

impl RuntimeErrorKind {
    /// What to check in the config for this kind of failure.
    pub fn hint(self) -> &'static str {
        match self {
            RuntimeErrorKind::NoRuntimeFound => {
                "no Podman or Docker socket found; set dockerConfig.endpoint"
            }
            RuntimeErrorKind::InvalidEndpoint => {
                "dockerConfig.endpoint must start with unix://, tcp://, http:// or https://"
            }
            RuntimeErrorKind::ConnectionFailed => {
                "is the container daemon running and reachable at dockerConfig.endpoint?"
            }
            RuntimeErrorKind::RuntimeOperation => "the container daemon rejected the request",
        }
    }
}

impl From<DetectionError> for RuntimeError {
    fn from(source: DetectionError) -> Self {
        RuntimeError::Detection { source }
    }
}

impl From<RuntimeInfoError> for RuntimeError {
    fn from(source: RuntimeInfoError) -> Self {
        RuntimeError::Connection { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_each_source() {
        let err = RuntimeError::from(DetectionError::NoRuntimeFound);
        assert_eq!(err.kind(), RuntimeErrorKind::NoRuntimeFound);

        let err = RuntimeError::from(RuntimeInfoError::InvalidEndpoint("ftp://x".to_string()));
        assert_eq!(err.kind(), RuntimeErrorKind::InvalidEndpoint);
        assert!(err.kind().hint().contains("unix://"));

        let err = RuntimeError::from(RuntimeInfoError::ConnectionFailed("refused".to_string()));
        assert_eq!(err.kind(), RuntimeErrorKind::ConnectionFailed);
    }
}
