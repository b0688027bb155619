//! Terminal UI helpers (stderr only)

pub mod progress;
