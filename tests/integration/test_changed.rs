//! Integration tests for `tainted changed` and `tainted packages`

use crate::helpers::{TestRepo, git, lines, run_tainted, tainted};
use anyhow::Result;

#[test]
fn test_changed_directories() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.touch("lib/b/b.go")?;
  repo.write_file("lib/a/a_test.go", "package a\n")?;
  repo.write_file("NOTES.md", "notes\n")?;
  repo.commit("Mixed change")?;

  // changed does not need a catalog at all
  let output = run_tainted(&repo.path, &["changed"])?;
  assert_eq!(lines(&output), vec!["lib/b"]);

  let output = run_tainted(&repo.path, &["changed", "--test"])?;
  assert_eq!(lines(&output), vec!["lib/a", "lib/b"]);

  Ok(())
}

#[test]
fn test_changed_moves_count_on_both_sides() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  std::fs::create_dir_all(repo.path.join("lib/d"))?;
  git(&repo.path, &["mv", "lib/c/c.go", "lib/d/c.go"])?;
  repo.commit("Move c")?;

  let output = run_tainted(&repo.path, &["changed"])?;
  assert_eq!(lines(&output), vec!["lib/c", "lib/d"]);

  Ok(())
}

#[test]
fn test_changed_from_subdirectory_root() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.touch("lib/a/a.go")?;
  repo.touch("cmd/app/app.go")?;
  repo.commit("Change a and app")?;

  let output = run_tainted(&repo.path, &["changed", "--dir", "lib"])?;
  assert_eq!(lines(&output), vec!["a"]);

  Ok(())
}

#[test]
fn test_changed_json() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.touch("lib/c/c.go")?;
  repo.commit("Change lib/c")?;

  let output = run_tainted(&repo.path, &["changed", "--json"])?;
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(report["from"], "HEAD~1");
  assert_eq!(report["to"], "HEAD");
  assert_eq!(report["changed_directories"], serde_json::json!(["lib/c"]));

  Ok(())
}

#[test]
fn test_packages_listing() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;

  let output = run_tainted(&repo.path, &["packages", "--manifest", "deps.json"])?;
  assert_eq!(lines(&output), vec!["cmd/app", "cmd/tool", "lib/a", "lib/b", "lib/c"]);

  let output = run_tainted(&repo.path, &["packages", "--manifest", "deps.json", "--entrypoints", "cmd/*"])?;
  assert_eq!(lines(&output), vec!["cmd/app", "cmd/tool"]);

  Ok(())
}

#[test]
fn test_invalid_config_is_a_user_error() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.write_file("tainted.toml", "[analysis]\njobs = 0\n")?;

  let output = tainted(&repo.path, &["changed"], None)?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("analysis.jobs"));

  Ok(())
}
