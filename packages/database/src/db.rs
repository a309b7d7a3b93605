//! Database location from the environment.

use std::path::PathBuf;

use crate::DEFAULT_DB_PATH;

/// Returns the database file path from the `DATABASE_PATH` environment
/// variable, falling back to [`DEFAULT_DB_PATH`].
#[must_use]
pub fn path_from_env() -> PathBuf {
    std::env::var("DATABASE_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from)
}
