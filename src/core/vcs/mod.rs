//! Version control: where change sets come from

pub mod system_git;

pub use system_git::SystemGit;

use crate::core::error::TaintResult;
use crate::graph::{ChangeSet, TestFileFilter};

/// Yields the files that differ between two revisions
pub trait ChangeSetProvider {
  /// Changed files, root-relative and `/`-separated, in either direction
  fn changed_files(&self, from: &str, to: &str) -> TaintResult<Vec<String>>;

  /// Directories holding at least one changed file (the root excluded)
  fn changed_directories(
    &self,
    from: &str,
    to: &str,
    include_tests: bool,
    filter: &TestFileFilter,
  ) -> TaintResult<ChangeSet> {
    let files = self.changed_files(from, to)?;
    Ok(ChangeSet::from_files(files, include_tests, filter))
  }
}
