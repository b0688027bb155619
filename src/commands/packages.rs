//! `tainted packages` - Packages known to the catalog
//!
//! Honors the entrypoint filter, so it doubles as a dry run of `--entrypoints`.

use crate::core::context::AnalysisContext;
use crate::core::error::TaintResult;
use serde_json::json;
use std::io::{self, Write};

/// Run the packages command
pub fn run_packages(ctx: &AnalysisContext, json: bool) -> TaintResult<()> {
  let catalog = ctx.catalog()?;
  let entrypoints = ctx.entrypoints()?;

  let mut packages = catalog.list_packages(&ctx.root)?;
  if !entrypoints.matches_all() {
    let normalizer = ctx.normalizer()?;
    packages.retain(|pkg| normalizer.normalize(pkg).is_some_and(|dir| entrypoints.matches(dir)));
  }

  let stdout = io::stdout();
  let mut out = stdout.lock();
  if json {
    let output = json!({ "packages": packages, "count": packages.len() });
    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
  } else {
    for pkg in &packages {
      writeln!(out, "{}", pkg)?;
    }
  }
  out.flush()?;
  Ok(())
}
