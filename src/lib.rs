//! tainted - change-impact analysis over a package import graph
//!
//! Given a revision range and a set of candidate packages, report the candidates
//! whose transitive dependency closure contains a changed directory.
//!
//! ```text
//! git diff ──> ChangeSet ─────────────────┐
//!                                         v
//! PackageCatalog ──> ImportResolver ──> ImpactSelector ──> sorted affected list
//!                      (MetadataCache)     (rayon pool)
//! ```

pub mod catalog;
pub mod commands;
pub mod core;
pub mod graph;
pub mod ui;
pub mod utils;
