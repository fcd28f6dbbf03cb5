// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: Image repository names with namespace qualification.

mod image_ref;

pub use image_ref::{DEFAULT_NAMESPACE, ImageRef, ParseImageRefError};
