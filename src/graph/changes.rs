//! Changed directories between two revisions
//!
//! A change set is the set of root-relative directories holding at least one
//! changed file. The root itself never appears: a change to a top-level file
//! (go.mod, README) belongs to no package.

use crate::core::error::TaintResult;
use crate::utils::{file_name, normalize_rel_path, parent_dir};
use glob::Pattern;
use std::collections::BTreeSet;

/// Default test-file convention (Go)
pub const DEFAULT_TEST_PATTERNS: &[&str] = &["*_test.go"];

/// Decides which changed files are test-only
#[derive(Debug, Clone)]
pub struct TestFileFilter {
  patterns: Vec<Pattern>,
}

impl TestFileFilter {
  /// Build from glob patterns matched against file names
  pub fn new(patterns: &[impl AsRef<str>]) -> TaintResult<Self> {
    let patterns = patterns
      .iter()
      .map(|p| Pattern::new(p.as_ref()))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self { patterns })
  }

  /// Is this (slash-separated) file path a test file?
  pub fn is_test_file(&self, path: &str) -> bool {
    let name = file_name(path);
    self.patterns.iter().any(|p| p.matches(name))
  }
}

impl Default for TestFileFilter {
  fn default() -> Self {
    Self {
      patterns: DEFAULT_TEST_PATTERNS
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect(),
    }
  }
}

/// Set of changed directories (normalized, root-relative)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
  dirs: BTreeSet<String>,
}

impl ChangeSet {
  /// Derive changed directories from changed file paths.
  ///
  /// Test files are dropped unless `include_tests` is set; files at the root
  /// contribute nothing.
  pub fn from_files<I, S>(files: I, include_tests: bool, filter: &TestFileFilter) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let dirs = files
      .into_iter()
      .filter(|f| include_tests || !filter.is_test_file(f.as_ref()))
      .map(|f| parent_dir(f.as_ref()))
      .filter(|d| !d.is_empty())
      .collect();
    Self { dirs }
  }

  /// Build directly from directory paths
  pub fn from_dirs<I, S>(dirs: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let dirs = dirs
      .into_iter()
      .map(|d| normalize_rel_path(d.as_ref()))
      .filter(|d| !d.is_empty())
      .collect();
    Self { dirs }
  }

  /// Exact membership test on a normalized directory
  pub fn contains(&self, dir: &str) -> bool {
    self.dirs.contains(dir)
  }

  pub fn is_empty(&self) -> bool {
    self.dirs.is_empty()
  }

  pub fn len(&self) -> usize {
    self.dirs.len()
  }

  /// Directories in sorted order
  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.dirs.iter().map(String::as_str)
  }
}
