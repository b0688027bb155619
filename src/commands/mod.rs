//! CLI commands for tainted
//!
//! - **affected**: candidates whose closure intersects the change set
//! - **changed**: changed directories for a revision range
//! - **deps**: dependency closure of a single package
//! - **packages**: packages known to the catalog
//!
//! All commands accept `&AnalysisContext` and write results to stdout only.

pub mod affected;
pub mod changed;
pub mod deps;
pub mod packages;

pub use affected::{AffectedOptions, OutputFormat, run_affected};
pub use changed::run_changed;
pub use deps::run_deps;
pub use packages::run_packages;
