//! Utility functions for cross-platform path handling

use std::path::Path;

/// Convert a path to slash form (always forward slashes)
///
/// Git reports paths with forward slashes, even on Windows, and import paths use
/// them too. Everything we compare goes through this first.
pub fn path_to_slash(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

/// Normalize a root-relative path string
///
/// Strips `./` prefixes, duplicate and trailing slashes. The root itself
/// normalizes to the empty string.
pub fn normalize_rel_path(path: &str) -> String {
  path
    .split(['/', '\\'])
    .filter(|seg| !seg.is_empty() && *seg != ".")
    .collect::<Vec<_>>()
    .join("/")
}

/// Parent directory of a root-relative file path (empty for files at the root)
pub fn parent_dir(file: &str) -> String {
  let normalized = normalize_rel_path(file);
  match normalized.rsplit_once('/') {
    Some((dir, _)) => dir.to_string(),
    None => String::new(),
  }
}

/// File name component of a slash-separated path
pub fn file_name(path: &str) -> &str {
  path.rsplit(['/', '\\']).next().unwrap_or(path)
}
