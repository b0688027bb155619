//! `tainted affected` - Which candidates are tainted by the revision range
//!
//! 1. Changed directories between `from` and `to` (git)
//! 2. Candidates from stdin, or every package the catalog knows
//! 3. Parallel closure resolution and exact matching
//!
//! Nothing is printed until the whole selection has succeeded.

use crate::core::context::AnalysisContext;
use crate::core::error::{ResultExt, TaintResult};
use crate::core::vcs::{ChangeSetProvider, SystemGit};
use crate::graph::{
  CacheStats, ChangeSet, FailurePolicy, ImpactSelector, ImportResolver, MetadataCache, SelectOptions, Selection,
  SelectionObserver,
};
use crate::ui::progress::ResolveProgress;
use serde_json::json;
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

/// Output format for affected command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
  /// One affected import path per line
  #[default]
  Names,
  /// Machine-readable report
  Json,
  /// Human-readable report
  Text,
}

/// Presentation and input switches for the affected command
#[derive(Debug, Clone, Copy, Default)]
pub struct AffectedOptions {
  /// Read newline-delimited candidates from stdin instead of enumerating
  pub stdin: bool,
  pub format: OutputFormat,
  /// Draw a progress bar on stderr
  pub progress: bool,
  pub keep_going: bool,
}

/// Everything the renderers need
struct AffectedReport {
  changes: ChangeSet,
  candidates: usize,
  selection: Selection,
  cache: CacheStats,
}

/// Run the affected command
pub fn run_affected(ctx: &AnalysisContext, options: AffectedOptions) -> TaintResult<()> {
  let analysis = &ctx.config.analysis;

  let git = SystemGit::open(&ctx.root)?;
  let changes = git.changed_directories(&analysis.from, &analysis.to, analysis.include_tests, &ctx.test_filter()?)?;
  info!(from = %analysis.from, to = %analysis.to, changed = changes.len(), "change set");
  if changes.is_empty() {
    debug!("no changed directories");
  }

  let catalog = ctx.catalog()?;
  let candidates = unique_candidates(if options.stdin {
    read_candidates(io::stdin().lock()).context("Failed to read candidates from stdin")?
  } else {
    catalog.list_packages(&ctx.root)?
  });

  let select_options = SelectOptions {
    normalizer: ctx.normalizer()?,
    entrypoints: ctx.entrypoints()?,
    policy: if options.keep_going {
      FailurePolicy::KeepGoing
    } else {
      FailurePolicy::FailFast
    },
    include_self: analysis.include_self,
    jobs: ctx.jobs(),
  };

  let cache = MetadataCache::new();
  let resolver = ImportResolver::new(catalog.as_ref(), &cache);
  let progress =
    (options.progress && !candidates.is_empty()).then(|| ResolveProgress::new(candidates.len(), "Resolving"));
  let mut selector = ImpactSelector::new(resolver, &ctx.root, select_options);
  if let Some(progress) = &progress {
    selector = selector.with_observer(progress as &dyn SelectionObserver);
  }

  let selection = selector.select(&candidates, &changes)?;
  info!(
    candidates = candidates.len(),
    affected = selection.affected.len(),
    failed = selection.failed.len(),
    "selection complete"
  );

  let report = AffectedReport {
    changes,
    candidates: candidates.len(),
    selection,
    cache: cache.stats(),
  };

  let stdout = io::stdout();
  let mut out = stdout.lock();
  render(&report, options.format, &mut out)?;
  out.flush()?;
  Ok(())
}

/// Newline-delimited candidates; blank lines are ignored
fn read_candidates(input: impl BufRead) -> io::Result<Vec<String>> {
  let mut candidates = Vec::new();
  for line in input.lines() {
    let line = line?;
    let candidate = line.trim();
    if !candidate.is_empty() {
      candidates.push(candidate.to_string());
    }
  }
  Ok(candidates)
}

/// Sorted, without repeats: one resolution and one progress tick per candidate
fn unique_candidates(mut candidates: Vec<String>) -> Vec<String> {
  candidates.sort();
  candidates.dedup();
  candidates
}

fn render(report: &AffectedReport, format: OutputFormat, out: &mut impl Write) -> TaintResult<()> {
  match format {
    OutputFormat::Names => render_names(report, out),
    OutputFormat::Json => render_json(report, out),
    OutputFormat::Text => render_text(report, out),
  }
}

/// Affected paths only; an empty stream when nothing is affected
fn render_names(report: &AffectedReport, out: &mut impl Write) -> TaintResult<()> {
  for name in &report.selection.affected {
    writeln!(out, "{}", name)?;
  }
  Ok(())
}

fn render_json(report: &AffectedReport, out: &mut impl Write) -> TaintResult<()> {
  let selection = &report.selection;
  let output = json!({
      "affected": selection.affected,
      "changed_directories": report.changes.iter().collect::<Vec<_>>(),
      "triggers": selection.triggers,
      "failed": selection.failed,
      "summary": {
          "candidates": report.candidates,
          "resolved": selection.resolved,
          "affected": selection.affected.len(),
          "failed": selection.failed.len(),
          "changed_directories": report.changes.len(),
          "packages_fetched": report.cache.fetches,
          "cache_hits": report.cache.hits
      }
  });

  writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
  Ok(())
}

fn render_text(report: &AffectedReport, out: &mut impl Write) -> TaintResult<()> {
  let selection = &report.selection;

  writeln!(out, "Changed directories: {}", report.changes.len())?;
  for dir in report.changes.iter() {
    writeln!(out, "  {}", dir)?;
  }
  writeln!(out)?;

  writeln!(
    out,
    "Affected: {} of {} candidates",
    selection.affected.len(),
    report.candidates
  )?;
  for name in &selection.affected {
    match selection.triggers.get(name) {
      Some(triggers) => writeln!(out, "  {} (via {})", name, triggers.join(", "))?,
      None => writeln!(out, "  {} (resolution failed)", name)?,
    }
  }

  if !selection.failed.is_empty() {
    writeln!(out)?;
    writeln!(out, "Failed: {}", selection.failed.len())?;
    for (name, reason) in &selection.failed {
      writeln!(out, "  {}: {}", name, reason)?;
    }
  }

  Ok(())
}
