// src/change/mod.rs

//! Incremental change detection.
//!
//! The detector walks the project tree, fingerprints every candidate file and
//! compares the result with the persisted [`FileHashCache`]. Files whose
//! fingerprint differs (or that could not be read) form the change set.

pub mod cache;
pub mod detector;
pub mod hash;
pub mod path_utils;
pub mod walk;

pub use cache::FileHashCache;
pub use detector::{ChangeDetector, ChangeSet};
pub use hash::{compute_file_hash, fingerprint};
pub use walk::{ScanFilter, collect_files};
