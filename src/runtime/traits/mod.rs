// ABOUTME: Composable capability traits for container runtimes.
// ABOUTME: Defines ImageOps (pull, tag, push) and RuntimeInfo.

mod image;
mod runtime_info;
pub(crate) mod sealed;
mod shared_types;

pub use image::{ImageError, ImageOps};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;
