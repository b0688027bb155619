use crate::catalog::CatalogKind;
use crate::core::error::{ConfigError, TaintError, TaintResult};
use crate::graph::DEFAULT_TEST_PATTERNS;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for tainted
/// Searched in order: tainted.toml, .tainted.toml, .config/tainted.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaintConfig {
  #[serde(default)]
  pub analysis: AnalysisConfig,
  #[serde(default)]
  pub catalog: CatalogConfig,
}

/// Revision range, matching and selection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
  /// Base revision (default: "HEAD~1")
  #[serde(default = "default_from")]
  pub from: String,

  /// Target revision (default: "HEAD")
  #[serde(default = "default_to")]
  pub to: String,

  /// Count changes to test files (default: false)
  #[serde(default)]
  pub include_tests: bool,

  /// File-name globs identifying test files (default: ["*_test.go"])
  #[serde(default = "default_test_patterns")]
  pub test_patterns: Vec<String>,

  /// Only these candidates are reported (globs over root-relative dirs)
  #[serde(default)]
  pub entrypoints: Vec<String>,

  /// Import path of the analysis root
  /// Unset: asked from the Go tool, or none for manifest catalogs
  #[serde(default)]
  pub import_prefix: Option<String>,

  /// Treat a candidate's own directory as part of its impact set
  #[serde(default)]
  pub include_self: bool,

  /// Worker threads (default: available parallelism)
  #[serde(default)]
  pub jobs: Option<usize>,
}

fn default_from() -> String {
  "HEAD~1".to_string()
}

fn default_to() -> String {
  "HEAD".to_string()
}

fn default_test_patterns() -> Vec<String> {
  DEFAULT_TEST_PATTERNS.iter().map(|p| p.to_string()).collect()
}

impl Default for AnalysisConfig {
  fn default() -> Self {
    Self {
      from: default_from(),
      to: default_to(),
      include_tests: false,
      test_patterns: default_test_patterns(),
      entrypoints: Vec::new(),
      import_prefix: None,
      include_self: false,
      jobs: None,
    }
  }
}

/// Package catalog backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
  #[serde(default)]
  pub kind: CatalogKind,

  /// Dependency manifest (required for kind = "manifest"), relative to the root
  #[serde(default)]
  pub manifest: Option<PathBuf>,

  /// Go binary (default: "go")
  #[serde(default = "default_go_bin")]
  pub go_bin: String,

  /// Build tags passed to `go list`
  #[serde(default)]
  pub tags: Vec<String>,
}

fn default_go_bin() -> String {
  "go".to_string()
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      kind: CatalogKind::default(),
      manifest: None,
      go_bin: default_go_bin(),
      tags: Vec::new(),
    }
  }
}

impl TaintConfig {
  /// Find config file in search order: tainted.toml, .tainted.toml, .config/tainted.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("tainted.toml"),
      path.join(".tainted.toml"),
      path.join(".config").join("tainted.toml"),
    ];

    candidates.into_iter().find(|p| p.is_file())
  }

  /// Load config from the root, falling back to defaults when no file exists
  pub fn load(path: &Path) -> TaintResult<Self> {
    match Self::find_config_path(path) {
      Some(config_path) => Self::load_file(&config_path),
      None => Ok(Self::default()),
    }
  }

  /// Parse a specific config file
  ///
  /// Not validated here: command-line overrides may still fill in or replace
  /// values, so callers validate the merged result.
  pub fn load_file(config_path: &Path) -> TaintResult<Self> {
    let unreadable = |reason: String| {
      TaintError::Config(ConfigError::Unreadable {
        path: config_path.to_path_buf(),
        reason,
      })
    };

    let content = fs::read_to_string(config_path).map_err(|e| unreadable(e.to_string()))?;
    let config: TaintConfig = toml_edit::de::from_str(&content).map_err(|e| unreadable(e.to_string()))?;
    Ok(config)
  }

  /// Reject values no run could work with
  pub fn validate(&self) -> TaintResult<()> {
    if self.analysis.jobs == Some(0) {
      return Err(invalid("analysis.jobs", "must be at least 1"));
    }

    for (field, patterns) in [
      ("analysis.test_patterns", &self.analysis.test_patterns),
      ("analysis.entrypoints", &self.analysis.entrypoints),
    ] {
      for pattern in patterns {
        if let Err(e) = Pattern::new(pattern) {
          return Err(invalid(field, &format!("'{}': {}", pattern, e)));
        }
      }
    }

    if self.catalog.kind == CatalogKind::Manifest && self.catalog.manifest.is_none() {
      return Err(invalid("catalog.manifest", "required when catalog.kind = \"manifest\""));
    }

    if self.catalog.go_bin.trim().is_empty() {
      return Err(invalid("catalog.go_bin", "must not be empty"));
    }

    Ok(())
  }
}

fn invalid(field: &str, reason: &str) -> TaintError {
  TaintError::Config(ConfigError::Invalid {
    field: field.to_string(),
    reason: reason.to_string(),
  })
}
