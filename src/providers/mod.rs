//! Provider adapters

pub mod custom;

// Re-export for convenience
pub use custom::CustomApiProvider;
