// ABOUTME: Sealed trait pattern for capability traits.
// ABOUTME: Prevents external implementations, allowing non-breaking evolution.

/// Sealed trait to prevent external implementations.
///
/// Only types inside this crate (the bollard runtime, the oci-client tag
/// lister, and test fakes) can implement the capability traits.
pub trait Sealed {}
