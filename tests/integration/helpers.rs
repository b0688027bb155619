//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// A package in the test repository: import path plus direct imports
pub struct Pkg<'a> {
  pub import_path: &'a str,
  pub imports: &'a [&'a str],
}

pub const fn pkg<'a>(import_path: &'a str, imports: &'a [&'a str]) -> Pkg<'a> {
  Pkg { import_path, imports }
}

/// A git repository laid out like a small Go module, with a dependency manifest
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestRepo {
  /// Create a new repository with one initial commit
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;

    std::fs::write(path.join("go.mod"), "module example.com/repo\n\ngo 1.22\n")?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial module"])?;

    Ok(Self { _root: root, path })
  }

  /// Repository with `cmd/app -> lib/a -> lib/b`, `cmd/tool -> lib/c`, committed
  pub fn with_app_graph() -> Result<Self> {
    let repo = Self::new()?;
    repo.add_packages(&[
      pkg("cmd/app", &["lib/a", "fmt"]),
      pkg("cmd/tool", &["lib/c", "os"]),
      pkg("lib/a", &["lib/b"]),
      pkg("lib/b", &["fmt"]),
      pkg("lib/c", &[]),
    ])?;
    repo.commit("Add packages")?;
    Ok(repo)
  }

  /// Write a source file per package and the matching deps.json manifest.
  ///
  /// Imports without a `/` are declared as standard-library packages.
  pub fn add_packages(&self, packages: &[Pkg]) -> Result<()> {
    let mut manifest = Vec::new();
    let mut standard: std::collections::BTreeSet<&str> = std::collections::BTreeSet::new();

    for p in packages {
      let name = p.import_path.rsplit('/').next().unwrap_or(p.import_path);
      let imports: String = p.imports.iter().map(|i| format!("import \"{}\"\n", i)).collect();
      self.write_file(
        &format!("{}/{}.go", p.import_path, name),
        &format!("package {}\n\n{}", name, imports),
      )?;

      manifest.push(serde_json::json!({
        "import_path": p.import_path,
        "dir": p.import_path,
        "imports": p.imports,
      }));
      standard.extend(p.imports.iter().filter(|i| !i.contains('/')));
    }
    for s in standard {
      manifest.push(serde_json::json!({ "import_path": s, "standard": true }));
    }

    let content = serde_json::to_string_pretty(&serde_json::json!({ "packages": manifest }))?;
    std::fs::write(self.path.join("deps.json"), content)?;
    Ok(())
  }

  /// Write a file (creating parent directories)
  pub fn write_file(&self, rel: &str, content: &str) -> Result<()> {
    let file_path = self.path.join(rel);
    if let Some(parent) = file_path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
  }

  /// Append a line to a file, producing a change in its directory
  pub fn touch(&self, rel: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
      .append(true)
      .create(true)
      .open(self.path.join(rel))?;
    writeln!(file, "// touched")?;
    Ok(())
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "-A"])?;
    git(&self.path, &["commit", "--allow-empty", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the tainted binary, whatever its exit status
pub fn tainted(cwd: &Path, args: &[&str], stdin: Option<&str>) -> Result<Output> {
  let mut child = Command::new(env!("CARGO_BIN_EXE_tainted"))
    .current_dir(cwd)
    .args(args)
    .env_remove("TAINTED_LOG")
    .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .context("Failed to run tainted")?;

  if let Some(input) = stdin
    && let Some(mut pipe) = child.stdin.take()
  {
    pipe.write_all(input.as_bytes())?;
  }

  Ok(child.wait_with_output()?)
}

/// Run the tainted binary and require success
pub fn run_tainted(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = tainted(cwd, args, None)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "tainted command failed: tainted {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Non-empty stdout lines
pub fn lines(output: &Output) -> Vec<String> {
  String::from_utf8_lossy(&output.stdout)
    .lines()
    .filter(|l| !l.is_empty())
    .map(String::from)
    .collect()
}
