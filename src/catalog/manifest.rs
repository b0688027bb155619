//! JSON dependency manifest catalog
//!
//! For graphs that are not Go, graphs exported by another tool, and tests:
//!
//! ```json
//! { "packages": [
//!     { "import_path": "cmd/app", "dir": "cmd/app", "imports": ["lib/a", "fmt"] },
//!     { "import_path": "fmt", "standard": true } ] }
//! ```

use super::{PackageCatalog, PackageMeta};
use crate::core::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// On-disk manifest layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
  #[serde(default)]
  pub packages: Vec<PackageMeta>,
}

/// Catalog answering from an in-memory package table
#[derive(Debug, Clone, Default)]
pub struct ManifestCatalog {
  /// Declaration order, used for enumeration
  order: Vec<String>,
  packages: HashMap<String, PackageMeta>,
}

impl ManifestCatalog {
  /// Load a manifest file
  pub fn load(path: &Path) -> Result<Self, CatalogError> {
    let manifest_error = |reason: String| CatalogError::Manifest {
      path: path.to_path_buf(),
      reason,
    };

    let content = fs::read_to_string(path).map_err(|e| manifest_error(e.to_string()))?;
    let manifest: Manifest = serde_json::from_str(&content).map_err(|e| manifest_error(e.to_string()))?;
    Self::from_packages(manifest.packages).map_err(manifest_error)
  }

  /// Build a catalog from package metadata; import paths must be unique
  pub fn from_packages(packages: impl IntoIterator<Item = PackageMeta>) -> Result<Self, String> {
    let mut catalog = Self::default();
    for meta in packages {
      if catalog.packages.contains_key(&meta.import_path) {
        return Err(format!("package '{}' is declared twice", meta.import_path));
      }
      catalog.order.push(meta.import_path.clone());
      catalog.packages.insert(meta.import_path.clone(), meta);
    }
    Ok(catalog)
  }
}

impl PackageCatalog for ManifestCatalog {
  fn list_packages(&self, _root: &Path) -> Result<Vec<String>, CatalogError> {
    Ok(
      self
        .order
        .iter()
        .filter(|name| !self.packages[*name].standard)
        .cloned()
        .collect(),
    )
  }

  fn direct_imports(&self, import_path: &str, _dir: &Path) -> Result<PackageMeta, CatalogError> {
    self
      .packages
      .get(import_path)
      .cloned()
      .ok_or_else(|| CatalogError::UnknownPackage {
        import_path: import_path.to_string(),
      })
  }
}
