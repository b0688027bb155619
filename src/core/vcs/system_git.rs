//! System git backend
//!
//! Uses git plumbing commands only. Every command runs from the analysis root
//! with an isolated environment, so user configuration cannot change the output
//! format we parse.

use super::ChangeSetProvider;
use crate::core::error::{ChangeSetError, TaintError, TaintResult};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Directory git commands run from (the analysis root)
  pub(crate) repo_path: PathBuf,
}

impl SystemGit {
  /// Open the git repository containing `path`
  ///
  /// This performs ONE subprocess call to get the repository metadata.
  pub fn open(path: &Path) -> TaintResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .map_err(|e| spawn_error("git rev-parse --show-toplevel", e))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") || !path.is_dir() {
        return Err(TaintError::ChangeSet(ChangeSetError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(TaintError::ChangeSet(ChangeSetError::CommandFailed {
        command: "git rev-parse --show-toplevel".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();
    debug!(work_tree, "opened repository");

    Ok(Self {
      repo_path: path.to_path_buf(),
    })
  }

  /// Fail with `UnknownRevision` unless `rev` names a commit
  pub fn verify_revision(&self, rev: &str) -> TaintResult<()> {
    let spec = format!("{}^{{commit}}", rev);
    let output = self.run(&["rev-parse", "--verify", "--quiet", &spec])?;

    if !output.status.success() {
      return Err(TaintError::ChangeSet(ChangeSetError::UnknownRevision {
        rev: rev.to_string(),
      }));
    }
    Ok(())
  }

  fn run(&self, args: &[&str]) -> TaintResult<Output> {
    self
      .git_cmd()
      .args(args)
      .output()
      .map_err(|e| spawn_error(&format!("git {}", args.join(" ")), e))
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    // Force stable output (override user config)
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    cmd
  }
}

impl ChangeSetProvider for SystemGit {
  fn changed_files(&self, from: &str, to: &str) -> TaintResult<Vec<String>> {
    self.verify_revision(from)?;
    self.verify_revision(to)?;

    let output = self.run(&["diff", "--name-only", "--relative", "--no-renames", "-z", from, to])?;
    if !output.status.success() {
      return Err(TaintError::ChangeSet(ChangeSetError::CommandFailed {
        command: format!("git diff --name-only {} {}", from, to),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    let files = parse_name_list(&output.stdout);
    debug!(from, to, files = files.len(), "changed files");
    Ok(files)
  }
}

/// Parse NUL-separated `git diff -z --name-only` output
fn parse_name_list(stdout: &[u8]) -> Vec<String> {
  stdout
    .split(|b| *b == 0)
    .filter(|entry| !entry.is_empty())
    .map(|entry| String::from_utf8_lossy(entry).to_string())
    .collect()
}

fn spawn_error(command: &str, err: io::Error) -> TaintError {
  let stderr = match err.kind() {
    io::ErrorKind::NotFound => "git was not found on PATH".to_string(),
    _ => err.to_string(),
  };
  TaintError::ChangeSet(ChangeSetError::CommandFailed {
    command: command.to_string(),
    stderr,
  })
}
