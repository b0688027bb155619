//! Impact selection: which candidates are tainted by a change set
//!
//! Algorithm:
//! 1. Resolve every candidate's closure on a bounded rayon pool (one task each)
//! 2. Normalize each closure member to a root-relative directory
//! 3. Exact membership test against the changed directories
//! 4. Join, then emit the reportable matches sorted and deduplicated
//!
//! Candidates outside the entrypoint filter are still resolved: they are graph
//! nodes that warm the shared cache, and a broken one must still fail the run.

use super::changes::ChangeSet;
use super::resolver::ImportResolver;
use crate::core::error::{ResolutionError, TaintResult};
use crate::utils::normalize_rel_path;
use glob::Pattern;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Maps import paths to root-relative directories.
///
/// With prefix `github.com/acme/repo`, `github.com/acme/repo/lib/a` becomes
/// `lib/a`; import paths outside the prefix are external and map to nothing.
/// Without a prefix, import paths already are root-relative directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPathNormalizer {
  prefix: Option<String>,
}

impl ImportPathNormalizer {
  pub fn new(prefix: Option<&str>) -> Self {
    let prefix = prefix.map(|p| p.trim_end_matches('/').to_string()).filter(|p| !p.is_empty());
    Self { prefix }
  }

  /// Root-relative directory for `import_path`, if it lives under the root
  pub fn normalize<'p>(&self, import_path: &'p str) -> Option<&'p str> {
    match &self.prefix {
      None => Some(import_path),
      Some(prefix) if import_path == prefix => Some(""),
      Some(prefix) => import_path.strip_prefix(prefix.as_str())?.strip_prefix('/'),
    }
  }
}

/// Restricts which candidates may be reported
///
/// Patterns are globs over the candidate's root-relative directory. A plain path
/// (`cmd`) or Go-style subtree (`cmd/...`) means that directory and everything
/// below it. The root itself (`.`, `./...`, `...`) and no patterns at all both
/// mean every candidate is reportable.
#[derive(Debug, Clone, Default)]
pub struct EntrypointFilter {
  patterns: Vec<Pattern>,
  match_all: bool,
}

impl EntrypointFilter {
  pub fn new(patterns: &[impl AsRef<str>]) -> TaintResult<Self> {
    let mut compiled = Vec::new();
    let mut match_all = false;
    for raw in patterns {
      let raw = raw.as_ref().trim();
      let subtree = match raw {
        "..." => "",
        _ => raw.strip_suffix("/...").unwrap_or(raw),
      };
      let normalized = normalize_rel_path(subtree);

      if normalized.is_empty() {
        match_all = true;
      } else if normalized.contains(['*', '?', '[']) {
        compiled.push(Pattern::new(&normalized)?);
      } else {
        let escaped = Pattern::escape(&normalized);
        compiled.push(Pattern::new(&escaped)?);
        compiled.push(Pattern::new(&format!("{}/*", escaped))?);
      }
    }
    Ok(Self {
      patterns: compiled,
      match_all,
    })
  }

  /// True when no candidate can be filtered out
  pub fn matches_all(&self) -> bool {
    self.match_all || self.patterns.is_empty()
  }

  pub fn matches(&self, rel_dir: &str) -> bool {
    self.matches_all() || self.patterns.iter().any(|p| p.matches(rel_dir))
  }
}

/// What to do when a candidate's closure cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
  /// Abort the whole run on the first failure
  #[default]
  FailFast,
  /// Keep going; failed reportable candidates are selected (uncertain means rebuild)
  KeepGoing,
}

/// Per-candidate task lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
  Pending,
  Resolving,
  Matched,
  Unmatched,
  Failed,
}

impl TaskState {
  pub fn is_terminal(self) -> bool {
    matches!(self, TaskState::Matched | TaskState::Unmatched | TaskState::Failed)
  }
}

/// Receives task transitions; called concurrently from pool threads.
pub trait SelectionObserver: Sync {
  fn on_transition(&self, candidate: &str, state: TaskState);
}

impl SelectionObserver for () {
  fn on_transition(&self, _candidate: &str, _state: TaskState) {}
}

/// Selection knobs
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
  pub normalizer: ImportPathNormalizer,
  pub entrypoints: EntrypointFilter,
  pub policy: FailurePolicy,
  /// Count the candidate's own directory as part of its impact set
  pub include_self: bool,
  /// Worker threads (default: available parallelism)
  pub jobs: Option<NonZeroUsize>,
}

/// Result of a selection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
  /// Affected reportable candidates, sorted and deduplicated
  pub affected: Vec<String>,

  /// For each matched candidate, the changed packages that tainted it
  pub triggers: BTreeMap<String, Vec<String>>,

  /// Reportable candidates whose resolution failed (keep-going only)
  pub failed: BTreeMap<String, String>,

  /// Number of distinct candidates resolved
  pub resolved: usize,
}

#[derive(Default)]
struct Aggregate {
  triggers: BTreeMap<String, Vec<String>>,
  failed: BTreeMap<String, String>,
}

/// Drives the resolver over many candidates and matches closures against changes.
pub struct ImpactSelector<'a> {
  resolver: ImportResolver<'a>,
  root: &'a Path,
  options: SelectOptions,
  observer: &'a dyn SelectionObserver,
}

impl<'a> ImpactSelector<'a> {
  /// `root` is the directory candidates are resolved from.
  pub fn new(resolver: ImportResolver<'a>, root: &'a Path, options: SelectOptions) -> Self {
    Self {
      resolver,
      root,
      options,
      observer: &(),
    }
  }

  pub fn with_observer(mut self, observer: &'a dyn SelectionObserver) -> Self {
    self.observer = observer;
    self
  }

  /// Number of worker threads this selector runs with
  pub fn jobs(&self) -> usize {
    self
      .options
      .jobs
      .or_else(|| std::thread::available_parallelism().ok())
      .map(NonZeroUsize::get)
      .unwrap_or(1)
  }

  /// Select the candidates whose closure intersects `changes`.
  ///
  /// Fails with the first `ResolutionError` under [`FailurePolicy::FailFast`].
  pub fn select(&self, candidates: &[String], changes: &ChangeSet) -> TaintResult<Selection> {
    let unique: BTreeSet<&str> = candidates.iter().map(String::as_str).collect();
    let unique: Vec<&str> = unique.into_iter().collect();

    for candidate in &unique {
      self.observer.on_transition(candidate, TaskState::Pending);
    }

    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(self.jobs())
      .thread_name(|i| format!("tainted-worker-{}", i))
      .build()?;

    let aggregate = Mutex::new(Aggregate::default());
    let resolved = AtomicUsize::new(0);

    info!(
      candidates = unique.len(),
      changed = changes.len(),
      jobs = self.jobs(),
      "selecting affected packages"
    );

    pool.install(|| {
      unique
        .par_iter()
        .try_for_each(|candidate| self.run_task(candidate, changes, &aggregate, &resolved))
    })?;

    let aggregate = aggregate.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    let stats = self.resolver.cache().stats();
    debug!(
      entries = stats.entries,
      hits = stats.hits,
      fetches = stats.fetches,
      "metadata cache"
    );

    let affected: BTreeSet<String> = aggregate
      .triggers
      .keys()
      .chain(aggregate.failed.keys())
      .cloned()
      .collect();

    Ok(Selection {
      affected: affected.into_iter().collect(),
      triggers: aggregate.triggers,
      failed: aggregate.failed,
      resolved: resolved.into_inner(),
    })
  }

  /// One candidate: resolve, match, record
  fn run_task(
    &self,
    candidate: &str,
    changes: &ChangeSet,
    aggregate: &Mutex<Aggregate>,
    resolved: &AtomicUsize,
  ) -> Result<(), ResolutionError> {
    self.observer.on_transition(candidate, TaskState::Resolving);
    let reportable = self.is_reportable(candidate);

    let closure = match self.resolver.resolve(candidate, self.root) {
      Ok(closure) => closure,
      Err(err) => {
        self.observer.on_transition(candidate, TaskState::Failed);
        return match self.options.policy {
          FailurePolicy::FailFast => Err(err),
          FailurePolicy::KeepGoing => {
            warn!(candidate, error = %err, "resolution failed, selecting conservatively");
            if reportable {
              lock(aggregate).failed.insert(candidate.to_string(), err.to_string());
            }
            Ok(())
          }
        };
      }
    };
    resolved.fetch_add(1, Ordering::Relaxed);

    let mut triggers: Vec<String> = closure
      .iter()
      .filter(|dep| self.is_changed(dep, changes))
      .cloned()
      .collect();
    if self.options.include_self && self.is_changed(candidate, changes) {
      triggers.push(candidate.to_string());
      triggers.sort();
    }

    let state = if triggers.is_empty() {
      TaskState::Unmatched
    } else {
      TaskState::Matched
    };
    debug!(candidate, deps = closure.len(), triggers = triggers.len(), reportable, "resolved");

    if state == TaskState::Matched && reportable {
      lock(aggregate).triggers.insert(candidate.to_string(), triggers);
    }
    self.observer.on_transition(candidate, state);
    Ok(())
  }

  fn is_changed(&self, import_path: &str, changes: &ChangeSet) -> bool {
    self
      .options
      .normalizer
      .normalize(import_path)
      .is_some_and(|dir| changes.contains(dir))
  }

  fn is_reportable(&self, candidate: &str) -> bool {
    if self.options.entrypoints.matches_all() {
      return true;
    }
    self
      .options
      .normalizer
      .normalize(candidate)
      .is_some_and(|dir| self.options.entrypoints.matches(dir))
  }
}

fn lock(aggregate: &Mutex<Aggregate>) -> std::sync::MutexGuard<'_, Aggregate> {
  aggregate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
