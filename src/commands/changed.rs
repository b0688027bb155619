//! `tainted changed` - Changed directories for the revision range

use crate::core::context::AnalysisContext;
use crate::core::error::TaintResult;
use crate::core::vcs::{ChangeSetProvider, SystemGit};
use serde_json::json;
use std::io::{self, Write};

/// Run the changed command
pub fn run_changed(ctx: &AnalysisContext, json: bool) -> TaintResult<()> {
  let analysis = &ctx.config.analysis;
  let git = SystemGit::open(&ctx.root)?;
  let changes = git.changed_directories(&analysis.from, &analysis.to, analysis.include_tests, &ctx.test_filter()?)?;

  let stdout = io::stdout();
  let mut out = stdout.lock();
  if json {
    let output = json!({
        "from": analysis.from,
        "to": analysis.to,
        "include_tests": analysis.include_tests,
        "changed_directories": changes.iter().collect::<Vec<_>>(),
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
  } else {
    for dir in changes.iter() {
      writeln!(out, "{}", dir)?;
    }
  }
  out.flush()?;
  Ok(())
}
