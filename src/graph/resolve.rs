// src/graph/resolve.rs

use std::path::Path;

/// Decides whether an import identifier refers to a known file.
pub trait ImportResolver: Send + Sync {
    fn resolves_to(&self, import: &str, target_path: &str) -> bool;
}

/// Case-insensitive match of the target's file stem anywhere in the import
/// identifier. Imprecise by nature: a stem of `io` matches `std::io` and
/// `asyncio` alike.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringResolver;

/// Lowercased file stem of a relative path (`src/Graph.rs` -> `graph`).
pub fn base_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

impl ImportResolver for SubstringResolver {
    fn resolves_to(&self, import: &str, target_path: &str) -> bool {
        let stem = base_name(target_path);
        !stem.is_empty() && import.to_lowercase().contains(&stem)
    }
}
