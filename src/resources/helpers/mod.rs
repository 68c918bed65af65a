//! Helpers shared by the reconcilers.
pub mod fs;
