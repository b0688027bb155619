//! Progress indicators for long-running selections
//!
//! Uses `linya`, which draws to stderr and is cheap to update from many threads.
//! stdout stays reserved for results.

use crate::graph::{SelectionObserver, TaskState};
use linya::{Bar, Progress};
use std::sync::Mutex;

/// One bar advanced as candidates finish resolving
pub struct ResolveProgress {
  progress: Mutex<Progress>,
  bar: Bar,
}

impl ResolveProgress {
  /// Create a bar over `total` candidates
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      progress: Mutex::new(progress),
      bar,
    }
  }

  /// Increment progress by 1 (thread-safe)
  pub fn inc(&self) {
    let mut progress = self.progress.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    progress.inc_and_draw(&self.bar, 1);
  }
}

impl SelectionObserver for ResolveProgress {
  fn on_transition(&self, _candidate: &str, state: TaskState) {
    if state.is_terminal() {
      self.inc();
    }
  }
}
