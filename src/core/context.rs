//! Unified analysis context - build once, pass everywhere
//!
//! ```text
//! main.rs:
//!   AnalysisContext::build(dir, overrides) -> &AnalysisContext
//!   |
//!   v
//! commands/affected.rs, changed.rs, etc:
//!   fn run_*(ctx: &AnalysisContext, ...)
//! ```
//!
//! Building the context is cheap and never touches git or the Go tool. The
//! catalog and the import prefix are produced on demand, so `tainted changed`
//! works in repositories without a Go toolchain.

use crate::catalog::{CatalogKind, GoCatalog, ManifestCatalog, PackageCatalog};
use crate::core::config::TaintConfig;
use crate::core::error::{TaintError, TaintResult};
use crate::graph::{EntrypointFilter, ImportPathNormalizer, TestFileFilter};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Command-line values that take precedence over `tainted.toml`
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
  pub catalog: Option<CatalogKind>,
  pub manifest: Option<PathBuf>,
  pub import_prefix: Option<String>,
  pub tags: Vec<String>,
  pub from: Option<String>,
  pub to: Option<String>,
  pub include_tests: Option<bool>,
  pub entrypoints: Vec<String>,
  pub include_self: Option<bool>,
  pub jobs: Option<usize>,
}

impl ConfigOverrides {
  /// Merge into `config`; every value set here wins over the file
  pub fn apply(self, config: &mut TaintConfig) -> TaintResult<()> {
    let analysis = &mut config.analysis;
    if let Some(from) = self.from {
      analysis.from = from;
    }
    if let Some(to) = self.to {
      analysis.to = to;
    }
    if let Some(include_tests) = self.include_tests {
      analysis.include_tests = include_tests;
    }
    if let Some(include_self) = self.include_self {
      analysis.include_self = include_self;
    }
    if !self.entrypoints.is_empty() {
      analysis.entrypoints = self.entrypoints;
    }
    if self.import_prefix.is_some() {
      analysis.import_prefix = self.import_prefix;
    }
    if self.jobs.is_some() {
      analysis.jobs = self.jobs;
    }

    let catalog = &mut config.catalog;
    if let Some(kind) = self.catalog {
      catalog.kind = kind;
    }
    if let Some(manifest) = self.manifest {
      // Relative to the invocation directory, unlike paths in the config file
      catalog.manifest = Some(std::path::absolute(&manifest)?);
      if self.catalog.is_none() {
        catalog.kind = CatalogKind::Manifest;
      }
    }
    if !self.tags.is_empty() {
      catalog.tags = self.tags;
    }
    Ok(())
  }
}

/// Everything a command needs to know about the run
pub struct AnalysisContext {
  /// Analysis root (canonical, absolute)
  pub root: PathBuf,

  /// Effective configuration (file values, then CLI overrides)
  pub config: TaintConfig,
}

impl AnalysisContext {
  /// Build the context for `dir`: load tainted.toml from it and apply overrides.
  pub fn build(dir: &Path, overrides: ConfigOverrides) -> TaintResult<Self> {
    let root = fs::canonicalize(dir).map_err(|e| {
      TaintError::with_help(
        format!("Cannot open analysis root {}: {}", dir.display(), e),
        "Pass an existing directory with --dir.",
      )
    })?;

    let mut config = TaintConfig::load(&root)?;
    overrides.apply(&mut config)?;
    config.validate()?;

    debug!(root = %root.display(), catalog = ?config.catalog.kind, "analysis context");
    Ok(Self { root, config })
  }

  /// Instantiate the configured package catalog
  pub fn catalog(&self) -> TaintResult<Box<dyn PackageCatalog>> {
    match self.config.catalog.kind {
      CatalogKind::Go => Ok(Box::new(self.go_catalog())),
      CatalogKind::Manifest => {
        let manifest = self.manifest_path().ok_or_else(|| {
          TaintError::with_help(
            "The manifest catalog needs a dependency manifest",
            "Pass --manifest <file> or set catalog.manifest in tainted.toml.",
          )
        })?;
        Ok(Box::new(ManifestCatalog::load(&manifest)?))
      }
    }
  }

  /// Manifest path, config-file paths taken relative to the root
  pub fn manifest_path(&self) -> Option<PathBuf> {
    self.config.catalog.manifest.as_ref().map(|p| self.root.join(p))
  }

  /// Normalizer for the configured (or discovered) import prefix.
  ///
  /// Without an explicit prefix the Go catalog asks `go list -m`; the manifest
  /// catalog uses import paths as root-relative directories.
  pub fn normalizer(&self) -> TaintResult<ImportPathNormalizer> {
    let prefix = match (&self.config.analysis.import_prefix, self.config.catalog.kind) {
      (Some(prefix), _) => Some(prefix.clone()),
      (None, CatalogKind::Go) => Some(self.go_catalog().module_prefix()?),
      (None, CatalogKind::Manifest) => None,
    };
    debug!(prefix = prefix.as_deref().unwrap_or(""), "import prefix");
    Ok(ImportPathNormalizer::new(prefix.as_deref()))
  }

  pub fn test_filter(&self) -> TaintResult<TestFileFilter> {
    TestFileFilter::new(&self.config.analysis.test_patterns)
  }

  pub fn entrypoints(&self) -> TaintResult<EntrypointFilter> {
    EntrypointFilter::new(&self.config.analysis.entrypoints)
  }

  pub fn jobs(&self) -> Option<NonZeroUsize> {
    self.config.analysis.jobs.and_then(NonZeroUsize::new)
  }

  fn go_catalog(&self) -> GoCatalog {
    GoCatalog::new(
      self.root.clone(),
      self.config.catalog.go_bin.clone(),
      self.config.catalog.tags.clone(),
    )
  }
}
