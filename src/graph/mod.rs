//! Dependency-aware impact analysis
//!
//! - **changes**: changed directories between two revisions
//! - **resolver**: transitive import closures over a shared metadata cache
//! - **selector**: parallel candidate matching against a change set

pub mod changes;
pub mod resolver;
pub mod selector;

pub use changes::{ChangeSet, DEFAULT_TEST_PATTERNS, TestFileFilter};
pub use resolver::{CacheStats, ImportResolver, MetadataCache};
pub use selector::{
  EntrypointFilter, FailurePolicy, ImpactSelector, ImportPathNormalizer, SelectOptions, Selection, SelectionObserver,
  TaskState,
};
