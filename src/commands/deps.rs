//! `tainted deps` - Dependency closure of one package

use crate::core::context::AnalysisContext;
use crate::core::error::TaintResult;
use crate::graph::{ImportResolver, MetadataCache};
use serde_json::json;
use std::io::{self, Write};

/// Run the deps command
///
/// With `json`, each dependency also carries its root-relative directory, or
/// null when it lives outside the root.
pub fn run_deps(ctx: &AnalysisContext, import_path: &str, json: bool) -> TaintResult<()> {
  let catalog = ctx.catalog()?;
  let cache = MetadataCache::new();
  let closure = ImportResolver::new(catalog.as_ref(), &cache).resolve(import_path, &ctx.root)?;

  let stdout = io::stdout();
  let mut out = stdout.lock();
  if json {
    let normalizer = ctx.normalizer()?;
    let dependencies: Vec<_> = closure
      .iter()
      .map(|dep| json!({ "import_path": dep, "dir": normalizer.normalize(dep) }))
      .collect();
    let output = json!({
        "package": import_path,
        "dependencies": dependencies,
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
  } else {
    for dep in &closure {
      writeln!(out, "{}", dep)?;
    }
  }
  out.flush()?;
  Ok(())
}
