//! Transitive import closure
//!
//! Given one package, walk its imports depth-first and collect every local
//! package reachable from it.
//!
//! ## Traversal rules
//!
//! - **Visited set**: per `resolve()` call. A path is entered at most once, which
//!   makes cycles and diamonds free.
//! - **Standard library**: entered (so it is marked visited and fetched only once)
//!   but never descended into, and never reported.
//! - **`C`**: the native-code marker. A leaf, never fetched, never reported.
//! - **Self**: the package being resolved is never part of its own closure.
//!
//! ## Metadata cache
//!
//! Catalog lookups are subprocess calls, and candidates share most of their
//! dependencies. [`MetadataCache`] holds every answer for the whole run and is
//! shared by reference between all workers. Entries are never evicted or
//! replaced; each package is fetched at most once.

use crate::catalog::{FOREIGN_IMPORT, PackageCatalog, PackageMeta};
use crate::core::error::{CatalogError, ResolutionError};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

type Slot = Arc<Mutex<Option<Arc<PackageMeta>>>>;

/// Run-scoped package metadata cache.
///
/// Two-level locking: the map lock is held only long enough to find or create a
/// key's slot; the slot lock is held across the catalog fetch, so concurrent
/// requests for the same package wait for one fetch instead of repeating it.
#[derive(Default)]
pub struct MetadataCache {
  slots: RwLock<HashMap<String, Slot>>,
  hits: AtomicUsize,
  fetches: AtomicUsize,
}

/// Cache counters for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
  pub entries: usize,
  pub hits: usize,
  pub fetches: usize,
}

impl MetadataCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Return cached metadata for `import_path`, fetching it from `catalog` on first use.
  pub fn get_or_fetch(
    &self,
    import_path: &str,
    dir: &Path,
    catalog: &dyn PackageCatalog,
  ) -> Result<Arc<PackageMeta>, CatalogError> {
    let slot = self.slot(import_path);
    let mut entry = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(meta) = entry.as_ref() {
      self.hits.fetch_add(1, Ordering::Relaxed);
      return Ok(Arc::clone(meta));
    }

    let meta = Arc::new(catalog.direct_imports(import_path, dir)?);
    self.fetches.fetch_add(1, Ordering::Relaxed);
    *entry = Some(Arc::clone(&meta));
    Ok(meta)
  }

  pub fn stats(&self) -> CacheStats {
    let slots = self.slots.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    let entries = slots
      .values()
      .filter(|slot| slot.lock().map(|e| e.is_some()).unwrap_or(true))
      .count();
    CacheStats {
      entries,
      hits: self.hits.load(Ordering::Relaxed),
      fetches: self.fetches.load(Ordering::Relaxed),
    }
  }

  /// Find or create the slot for a key
  fn slot(&self, import_path: &str) -> Slot {
    {
      let slots = self.slots.read().unwrap_or_else(|poisoned| poisoned.into_inner());
      if let Some(slot) = slots.get(import_path) {
        return Arc::clone(slot);
      }
    }

    let mut slots = self.slots.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(slots.entry(import_path.to_string()).or_default())
  }
}

/// Computes dependency closures against a catalog, memoizing through a shared cache.
pub struct ImportResolver<'a> {
  catalog: &'a dyn PackageCatalog,
  cache: &'a MetadataCache,
}

/// Pending visit: import path, directory to resolve it from, importer
struct Visit {
  import_path: String,
  dir: PathBuf,
  importer: Option<String>,
}

impl<'a> ImportResolver<'a> {
  pub fn new(catalog: &'a dyn PackageCatalog, cache: &'a MetadataCache) -> Self {
    Self { catalog, cache }
  }

  pub fn cache(&self) -> &MetadataCache {
    self.cache
  }

  /// Transitive closure of `name`, resolved from `dir`.
  ///
  /// Returns every local import path reachable through one or more import edges,
  /// excluding `name` itself and all standard-library packages.
  pub fn resolve(&self, name: &str, dir: &Path) -> Result<BTreeSet<String>, ResolutionError> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut closure: BTreeSet<String> = BTreeSet::new();
    let mut root_canonical: Option<String> = None;

    let mut stack = vec![Visit {
      import_path: name.to_string(),
      dir: dir.to_path_buf(),
      importer: None,
    }];

    while let Some(visit) = stack.pop() {
      if visit.import_path == FOREIGN_IMPORT {
        continue;
      }
      if !visited.insert(visit.import_path.clone()) {
        continue;
      }

      let meta = self
        .cache
        .get_or_fetch(&visit.import_path, &visit.dir, self.catalog)
        .map_err(|cause| ResolutionError {
          root: name.to_string(),
          import_path: visit.import_path.clone(),
          importer: visit.importer.clone(),
          cause,
        })?;

      if visit.importer.is_none() {
        root_canonical = Some(meta.import_path.clone());
      }

      if meta.standard {
        continue;
      }

      closure.insert(meta.import_path.clone());

      // Children resolve from this package's directory when the catalog knows it
      let child_dir = meta.dir.clone().unwrap_or_else(|| visit.dir.clone());

      // Reverse so the first declared import is explored first
      for import in meta.imports.iter().rev() {
        if !visited.contains(import) {
          stack.push(Visit {
            import_path: import.clone(),
            dir: child_dir.clone(),
            importer: Some(meta.import_path.clone()),
          });
        }
      }
    }

    closure.remove(name);
    if let Some(canonical) = root_canonical {
      closure.remove(&canonical);
    }
    Ok(closure)
  }
}
