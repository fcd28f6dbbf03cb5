// ABOUTME: Container runtime access for Docker and Podman.
// ABOUTME: Detection, connection, and the image transfer capability used by the worker.

mod bollard_runtime;
mod detection;
mod error;
pub mod traits;
mod types;

pub use bollard_runtime::BollardRuntime;
pub use detection::{DetectionError, detect_local, resolve_runtime};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::{
    ImageError, ImageOps, RegistryAccess, RegistryAuth, RuntimeInfo as RuntimeInfoOps,
    RuntimeInfoError, RuntimeMetadata,
};
pub use types::{RuntimeSocket, RuntimeType, SocketOverride};
