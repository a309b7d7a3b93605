//! Guided startup: asks where the database lives and where to listen,
//! then serves.

use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input};

use crate::ServerConfig;

fn prompt_error(e: dialoguer::Error) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

/// Prompts for the database file and listener, then starts the server.
///
/// `db_path` and the environment-derived [`ServerConfig`] supply the
/// defaults shown at each prompt. Nothing is written back to the
/// environment; the answers go straight to [`crate::run_server_with`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if a prompt cannot be read from the
/// terminal or the server fails to start.
pub async fn run(db_path: &Path) -> std::io::Result<()> {
    let defaults = ServerConfig::from_env();

    println!("WaySure route safety server");
    println!();

    let db_path: String = Input::new()
        .with_prompt("SQLite database file")
        .default(db_path.display().to_string())
        .interact_text()
        .map_err(prompt_error)?;

    let bind_addr: String = Input::new()
        .with_prompt("Listen on address")
        .default(defaults.bind_addr.clone())
        .interact_text()
        .map_err(prompt_error)?;

    let port: u16 = Input::new()
        .with_prompt("Listen on port")
        .default(defaults.port)
        .interact_text()
        .map_err(prompt_error)?;

    let start = Confirm::new()
        .with_prompt(format!("Serve {db_path} on http://{bind_addr}:{port}?"))
        .default(true)
        .interact()
        .map_err(prompt_error)?;

    if !start {
        println!("Not starting.");
        return Ok(());
    }

    let config = ServerConfig {
        bind_addr,
        port,
        ..defaults
    };

    crate::run_server_with(&PathBuf::from(db_path), config).await
}
