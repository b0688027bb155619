//! Integration tests for `tainted affected`

use crate::helpers::{TestRepo, lines, pkg, run_tainted, tainted};
use anyhow::Result;

const MANIFEST: &[&str] = &["affected", "--manifest", "deps.json"];

fn args<'a>(extra: &[&'a str]) -> Vec<&'a str> {
  MANIFEST.iter().copied().chain(extra.iter().copied()).collect()
}

#[test]
fn test_affected_entrypoints_only() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.touch("lib/b/b.go")?;
  repo.commit("Change lib/b")?;

  let output = run_tainted(&repo.path, &args(&["--entrypoints", "cmd/*"]))?;
  assert_eq!(lines(&output), vec!["cmd/app"]);

  Ok(())
}

#[test]
fn test_affected_root_entrypoint_selects_everything() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.touch("lib/b/b.go")?;
  repo.commit("Change lib/b")?;

  for pattern in ["./...", "."] {
    let output = run_tainted(&repo.path, &args(&["--entrypoints", pattern]))?;
    assert_eq!(lines(&output), vec!["cmd/app", "lib/a"], "{pattern}");
  }

  Ok(())
}

#[test]
fn test_affected_without_filter_reports_internal_packages() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.touch("lib/b/b.go")?;
  repo.commit("Change lib/b")?;

  let output = run_tainted(&repo.path, &args(&[]))?;
  // lib/b itself is only reported with --include-self
  assert_eq!(lines(&output), vec!["cmd/app", "lib/a"]);

  let output = run_tainted(&repo.path, &args(&["--include-self"]))?;
  assert_eq!(lines(&output), vec!["cmd/app", "lib/a", "lib/b"]);

  Ok(())
}

#[test]
fn test_affected_no_changes_prints_nothing() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.commit("Empty")?;

  let output = run_tainted(&repo.path, &args(&[]))?;
  assert!(output.stdout.is_empty(), "expected empty output");

  Ok(())
}

#[test]
fn test_affected_root_files_are_not_packages() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.write_file("README.md", "# repo\n")?;
  repo.commit("Docs")?;

  let output = run_tainted(&repo.path, &args(&[]))?;
  assert!(lines(&output).is_empty());

  Ok(())
}

#[test]
fn test_affected_test_files_need_flag() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.write_file("lib/c/c_test.go", "package c\n")?;
  repo.commit("Test lib/c")?;

  let output = run_tainted(&repo.path, &args(&[]))?;
  assert!(lines(&output).is_empty(), "test-only change is ignored by default");

  let output = run_tainted(&repo.path, &args(&["--test"]))?;
  assert_eq!(lines(&output), vec!["cmd/tool"]);

  Ok(())
}

#[test]
fn test_affected_explicit_range() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  let base = repo.commit("Base")?;
  repo.touch("lib/c/c.go")?;
  repo.commit("Change lib/c")?;
  repo.touch("lib/a/a.go")?;
  repo.commit("Change lib/a")?;

  let output = run_tainted(&repo.path, &args(&["--from", &base, "--entrypoints", "cmd"]))?;
  assert_eq!(lines(&output), vec!["cmd/app", "cmd/tool"]);

  let output = run_tainted(&repo.path, &args(&["--from", &base, "--to", "HEAD~1"]))?;
  assert_eq!(lines(&output), vec!["cmd/tool"]);

  Ok(())
}

#[test]
fn test_affected_candidates_from_stdin() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.touch("lib/c/c.go")?;
  repo.commit("Change lib/c")?;

  let output = tainted(&repo.path, &args(&["--stdin"]), Some("cmd/tool\n\ncmd/app\ncmd/tool\n"))?;
  assert!(output.status.success());
  assert_eq!(lines(&output), vec!["cmd/tool"]);

  let output = tainted(&repo.path, &args(&["--stdin"]), Some("lib/a\n"))?;
  assert!(output.status.success());
  assert!(lines(&output).is_empty());

  // Repeats count once
  let output = tainted(
    &repo.path,
    &args(&["--stdin", "--format", "json"]),
    Some("cmd/tool\ncmd/app\ncmd/tool\n"),
  )?;
  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(report["summary"]["candidates"], 2);
  assert_eq!(report["summary"]["resolved"], 2);

  Ok(())
}

#[test]
fn test_affected_unresolvable_import_fails() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_packages(&[
    pkg("cmd/app", &["lib/a"]),
    pkg("cmd/broken", &["lib/missing"]),
    pkg("lib/a", &[]),
  ])?;
  repo.commit("Add packages")?;
  repo.touch("lib/a/a.go")?;
  repo.commit("Change lib/a")?;

  let output = tainted(&repo.path, &args(&[]), None)?;
  assert_eq!(output.status.code(), Some(3));
  assert!(output.stdout.is_empty(), "no partial output on failure");

  let stderr = String::from_utf8_lossy(&output.stderr);
  let diagnostics: Vec<_> = stderr.lines().filter(|l| l.starts_with("error:")).collect();
  assert_eq!(diagnostics.len(), 1, "stderr: {}", stderr);
  assert!(diagnostics[0].contains("lib/missing"));

  Ok(())
}

#[test]
fn test_affected_keep_going_selects_failures() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_packages(&[
    pkg("cmd/app", &["lib/a"]),
    pkg("cmd/broken", &["lib/missing"]),
    pkg("cmd/quiet", &[]),
    pkg("lib/a", &[]),
  ])?;
  repo.commit("Add packages")?;
  repo.touch("lib/a/a.go")?;
  repo.commit("Change lib/a")?;

  let output = run_tainted(&repo.path, &args(&["--keep-going"]))?;
  assert_eq!(lines(&output), vec!["cmd/app", "cmd/broken"]);

  Ok(())
}

#[test]
fn test_affected_json_report() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.touch("lib/b/b.go")?;
  repo.commit("Change lib/b")?;

  let output = run_tainted(&repo.path, &args(&["--entrypoints", "cmd", "--format", "json", "-j", "2"]))?;
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(report["affected"], serde_json::json!(["cmd/app"]));
  assert_eq!(report["changed_directories"], serde_json::json!(["lib/b"]));
  assert_eq!(report["triggers"]["cmd/app"], serde_json::json!(["lib/b"]));
  assert_eq!(report["failed"], serde_json::json!({}));
  assert_eq!(report["summary"]["candidates"], 5);
  assert_eq!(report["summary"]["resolved"], 5);

  Ok(())
}

#[test]
fn test_affected_reads_config_file() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.write_file(
    "tainted.toml",
    "[analysis]\nentrypoints = [\"cmd/*\"]\n\n[catalog]\nkind = \"manifest\"\nmanifest = \"deps.json\"\n",
  )?;
  repo.commit("Configure")?;
  repo.touch("lib/c/c.go")?;
  repo.commit("Change lib/c")?;

  let output = run_tainted(&repo.path, &["affected"])?;
  assert_eq!(lines(&output), vec!["cmd/tool"]);

  Ok(())
}

#[test]
fn test_affected_unknown_revision() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;

  let output = tainted(&repo.path, &args(&["--from", "does-not-exist"]), None)?;
  assert_eq!(output.status.code(), Some(2));
  assert!(output.stdout.is_empty());
  assert!(String::from_utf8_lossy(&output.stderr).contains("does-not-exist"));

  Ok(())
}

#[test]
fn test_affected_outside_repository() -> Result<()> {
  let dir = tempfile::tempdir()?;
  std::fs::write(dir.path().join("deps.json"), r#"{ "packages": [] }"#)?;

  let output = tainted(dir.path(), &args(&[]), None)?;
  assert_eq!(output.status.code(), Some(2));

  Ok(())
}

#[test]
fn test_affected_cli_turns_off_config_flags() -> Result<()> {
  let repo = TestRepo::with_app_graph()?;
  repo.write_file(
    "tainted.toml",
    "[analysis]\ninclude_tests = true\ninclude_self = true\n\n[catalog]\nkind = \"manifest\"\n",
  )?;
  repo.commit("Configure")?;
  repo.write_file("lib/c/c_test.go", "package c\n")?;
  repo.touch("lib/b/b.go")?;
  repo.commit("Change lib/b, test lib/c")?;

  // The manifest path comes from the command line only
  let output = run_tainted(&repo.path, &["affected", "--manifest", "deps.json"])?;
  assert_eq!(lines(&output), vec!["cmd/app", "cmd/tool", "lib/a", "lib/b", "lib/c"]);

  let output = run_tainted(
    &repo.path,
    &["affected", "--manifest", "deps.json", "--no-test", "--no-include-self"],
  )?;
  assert_eq!(lines(&output), vec!["cmd/app", "lib/a"]);

  Ok(())
}
