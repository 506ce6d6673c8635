//! Storage module for attachment binaries
//!
//! Provides the local-disk storage engine that validates uploaded review
//! images and persists them under a configured content root.

mod disk;

pub use disk::{DiskStorage, StoredFile};
