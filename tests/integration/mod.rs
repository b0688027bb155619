//! Integration tests: the built binary against temporary git repositories

mod helpers;
mod test_affected;
mod test_changed;
mod test_deps;
