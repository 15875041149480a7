//! Common utilities shared across the container layers.

// Submodule declarations
pub mod binary;

// Re-exports for convenience
pub use binary::{BinaryError, BinaryResult};
