//! Integration tests for `tainted deps`

use crate::helpers::{TestRepo, lines, pkg, run_tainted, tainted};
use anyhow::Result;

#[test]
fn test_deps_closure() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;

  let output = run_tainted(&repo.path, &["deps", "cmd/app", "--manifest", "deps.json"])?;
  assert_eq!(lines(&output), vec!["lib/a", "lib/b"]);

  let output = run_tainted(&repo.path, &["deps", "lib/c", "--manifest", "deps.json"])?;
  assert!(lines(&output).is_empty());

  Ok(())
}

#[test]
fn test_deps_cycle() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_packages(&[pkg("lib/a", &["lib/b"]), pkg("lib/b", &["lib/a", "strings"])])?;

  let output = run_tainted(&repo.path, &["deps", "lib/a", "--manifest", "deps.json"])?;
  assert_eq!(lines(&output), vec!["lib/b"]);

  Ok(())
}

#[test]
fn test_deps_json_with_prefix() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;

  let output = run_tainted(
    &repo.path,
    &["deps", "cmd/app", "--manifest", "deps.json", "--import-prefix", "lib", "--json"],
  )?;
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(report["package"], "cmd/app");
  assert_eq!(report["dependencies"][0]["import_path"], "lib/a");
  assert_eq!(report["dependencies"][0]["dir"], "a");
  assert_eq!(report["dependencies"][1]["dir"], "b");

  Ok(())
}

#[test]
fn test_deps_unknown_package() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;

  let output = tainted(&repo.path, &["deps", "lib/zzz", "--manifest", "deps.json"], None)?;
  assert_eq!(output.status.code(), Some(3));
  assert!(output.stdout.is_empty());
  assert!(String::from_utf8_lossy(&output.stderr).contains("lib/zzz"));

  Ok(())
}
