//! Core plumbing shared by every command
//!
//! - **config**: tainted.toml parsing and validation
//! - **context**: effective configuration and on-demand catalog construction
//! - **error**: error categories with exit codes and help messages
//! - **vcs**: change sets from version control (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
