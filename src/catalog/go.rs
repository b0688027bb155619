//! Go toolchain catalog - `go list` as the source of truth
//!
//! One subprocess per package lookup. That is slow in isolation, which is exactly
//! why the resolver memoizes every answer for the rest of the run.
//!
//! Every lookup runs from the analysis root. In module mode the working directory
//! picks the main module, and with it the build list every import resolves
//! against; a dependency's directory in the module cache has a different one.

use super::{PackageCatalog, PackageMeta};
use crate::core::error::CatalogError;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Catalog backed by the `go` binary
#[derive(Debug, Clone)]
pub struct GoCatalog {
  /// Directory every `go` command runs from (the analysis root)
  root: PathBuf,

  /// Go binary (default: `go` from PATH)
  go_bin: String,

  /// Build tags passed to every `go list`
  tags: Vec<String>,
}

/// Subset of `go list -json` output we care about
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListPackage {
  import_path: String,
  #[serde(default)]
  dir: Option<PathBuf>,
  #[serde(default)]
  standard: bool,
  #[serde(default)]
  imports: Vec<String>,
  #[serde(default)]
  error: Option<GoListError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListError {
  err: String,
}

/// Subset of `go list -m -json` output
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoModule {
  path: String,
  #[serde(default)]
  dir: Option<PathBuf>,
}

impl GoCatalog {
  pub fn new(root: impl Into<PathBuf>, go_bin: impl Into<String>, tags: Vec<String>) -> Self {
    Self {
      root: root.into(),
      go_bin: go_bin.into(),
      tags,
    }
  }

  /// Import path of the root: the module path plus the root's location inside the module.
  ///
  /// Stripping this prefix from an import path yields a root-relative directory,
  /// the same shape git reports changed files in.
  pub fn module_prefix(&self) -> Result<String, CatalogError> {
    let output = self.run(&self.root, &["list", "-m", "-json"], false)?;
    parse_module_prefix(&self.root, &output.stdout)
  }

  /// Build a `go` command running in `dir`
  fn go_cmd(&self, dir: &Path) -> Command {
    let mut cmd = Command::new(&self.go_bin);
    cmd.current_dir(dir);
    cmd
  }

  fn tags_arg(&self) -> Option<String> {
    if self.tags.is_empty() {
      None
    } else {
      Some(format!("-tags={}", self.tags.join(",")))
    }
  }

  /// Run `go <args>` in `dir`; build tags go right after the subcommand
  fn run(&self, dir: &Path, args: &[&str], tagged: bool) -> Result<Output, CatalogError> {
    let mut cmd = self.go_cmd(dir);
    if let Some((subcommand, rest)) = args.split_first() {
      cmd.arg(subcommand);
      if tagged && let Some(tags) = self.tags_arg() {
        cmd.arg(tags);
      }
      cmd.args(rest);
    }

    let output = cmd.output().map_err(|e| self.spawn_error(e))?;
    if !output.status.success() {
      return Err(CatalogError::CommandFailed {
        command: format!("{} {}", self.go_bin, args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }
    Ok(output)
  }

  fn spawn_error(&self, err: io::Error) -> CatalogError {
    if err.kind() == io::ErrorKind::NotFound {
      CatalogError::ToolMissing {
        tool: self.go_bin.clone(),
      }
    } else {
      CatalogError::CommandFailed {
        command: format!("{} list", self.go_bin),
        stderr: err.to_string(),
      }
    }
  }
}

impl PackageCatalog for GoCatalog {
  fn list_packages(&self, root: &Path) -> Result<Vec<String>, CatalogError> {
    let output = self.run(root, &["list", "./..."], true)?;
    Ok(parse_package_list(&String::from_utf8_lossy(&output.stdout)))
  }

  /// The importer's `dir` is ignored: module resolution depends on the main module only
  fn direct_imports(&self, import_path: &str, _dir: &Path) -> Result<PackageMeta, CatalogError> {
    // -e keeps go list alive for broken packages; the failure comes back in .Error
    let output = self.run(&self.root, &["list", "-e", "-json", import_path], true)?;
    parse_package_json(import_path, &output.stdout)
  }
}

/// Parse `go list` line output, dropping blanks
fn parse_package_list(stdout: &str) -> Vec<String> {
  stdout
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .map(String::from)
    .collect()
}

/// Pick the module containing `root` from a `go list -m -json` stream
fn parse_module_prefix(root: &Path, stdout: &[u8]) -> Result<String, CatalogError> {
  let malformed = |reason: String| CatalogError::Malformed {
    import_path: root.display().to_string(),
    reason,
  };

  let modules = serde_json::Deserializer::from_slice(stdout)
    .into_iter::<GoModule>()
    .collect::<Result<Vec<_>, _>>()
    .map_err(|e| malformed(e.to_string()))?;

  // go.work setups list several modules; the deepest one containing root wins
  let best = modules
    .iter()
    .filter_map(|m| {
      let dir = m.dir.as_ref()?;
      let rel = root.strip_prefix(dir).ok()?;
      Some((dir.components().count(), m, rel))
    })
    .max_by_key(|(depth, _, _)| *depth);

  match best {
    Some((_, module, rel)) if rel.as_os_str().is_empty() => Ok(module.path.clone()),
    Some((_, module, rel)) => Ok(format!(
      "{}/{}",
      module.path,
      crate::utils::path_to_slash(rel).trim_end_matches('/')
    )),
    None => Err(malformed("no module contains this directory".to_string())),
  }
}

/// Parse one `go list -e -json` object into catalog metadata
fn parse_package_json(import_path: &str, stdout: &[u8]) -> Result<PackageMeta, CatalogError> {
  let pkg: GoListPackage = serde_json::from_slice(stdout).map_err(|e| CatalogError::Malformed {
    import_path: import_path.to_string(),
    reason: e.to_string(),
  })?;

  if let Some(error) = pkg.error {
    return Err(CatalogError::Package {
      import_path: import_path.to_string(),
      message: error.err,
    });
  }

  Ok(PackageMeta {
    import_path: pkg.import_path,
    dir: pkg.dir.filter(|d| !d.as_os_str().is_empty()),
    standard: pkg.standard,
    imports: pkg.imports,
  })
}
