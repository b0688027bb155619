//! Package catalogs: where packages and their direct imports come from
//!
//! - **go**: the Go toolchain (`go list`)
//! - **manifest**: a JSON dependency manifest (pre-computed or non-Go graphs)
//!
//! The resolver only ever talks to the [`PackageCatalog`] trait.

pub mod go;
pub mod manifest;

pub use go::GoCatalog;
pub use manifest::ManifestCatalog;

use crate::core::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Import that marks native code inclusion; a leaf with no edges.
pub const FOREIGN_IMPORT: &str = "C";

/// Metadata for one package, as reported by a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMeta {
  /// Canonical import path (may differ from the requested one, e.g. vendored packages)
  pub import_path: String,

  /// Directory holding the package sources, when the catalog knows it
  #[serde(default)]
  pub dir: Option<PathBuf>,

  /// Part of the standard library: never changes, never descended into
  #[serde(default)]
  pub standard: bool,

  /// Direct imports in declaration order
  #[serde(default)]
  pub imports: Vec<String>,
}

impl PackageMeta {
  /// Metadata for a standard-library leaf
  pub fn standard(import_path: impl Into<String>) -> Self {
    Self {
      import_path: import_path.into(),
      dir: None,
      standard: true,
      imports: Vec::new(),
    }
  }

  /// Metadata for a local package
  pub fn local(import_path: impl Into<String>, imports: Vec<String>) -> Self {
    Self {
      import_path: import_path.into(),
      dir: None,
      standard: false,
      imports,
    }
  }
}

/// Source of packages and their direct import edges.
///
/// Implementations are shared by all resolver workers, hence `Send + Sync`.
pub trait PackageCatalog: Send + Sync {
  /// Enumerate all packages rooted under `root`, in a deterministic order.
  fn list_packages(&self, root: &Path) -> Result<Vec<String>, CatalogError>;

  /// Look up one package. `dir` is the directory of the importing package
  /// (or the analysis root); catalogs that resolve against a single build
  /// list, like the Go catalog, ignore it.
  fn direct_imports(&self, import_path: &str, dir: &Path) -> Result<PackageMeta, CatalogError>;
}

/// Which catalog backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
  #[default]
  Go,
  Manifest,
}
