#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `SQLite` storage for the route safety service.
//!
//! Uses `switchy_database` for all database operations. The schema is
//! created on open (`CREATE TABLE IF NOT EXISTS`), so a fresh file is
//! usable immediately. Timestamps are written as RFC 3339 UTC text with
//! second precision. Window queries compare `julianday()` instants, so rows
//! in the older `YYYY-MM-DD HH:MM:SS` form are windowed correctly too.

pub mod db;
pub mod queries;
pub mod seed;
pub mod store;

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;

pub use store::DatabaseStore;

/// Default location of the database file.
pub const DEFAULT_DB_PATH: &str = "data/waysure.db";

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// The database file could not be opened.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// An I/O operation failed (e.g., creating the data directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Opens (or creates) the database at `path` and ensures all tables
/// exist.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be created or the schema DDL
/// fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Connection(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Creates all tables if they don't already exist.
///
/// # Errors
///
/// Returns [`DbError`] if any DDL statement fails.
pub async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS routes (
            route_id INTEGER PRIMARY KEY,
            route_number TEXT NOT NULL,
            route_name TEXT NOT NULL,
            start_location TEXT NOT NULL,
            end_location TEXT NOT NULL,
            distance_km REAL NOT NULL,
            avg_duration_mins INTEGER NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS incidents (
            incident_id INTEGER PRIMARY KEY,
            route_id INTEGER NOT NULL,
            incident_type TEXT NOT NULL,
            severity TEXT NOT NULL,
            description TEXT,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            reported_at TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_incidents_route_reported
         ON incidents (route_id, reported_at)",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT,
            phone_number TEXT
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS panic_alerts (
            alert_id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            alert_time TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active'
        )",
    )
    .await?;

    log::debug!("Database schema ready");
    Ok(())
}
