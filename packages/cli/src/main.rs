#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the waysure route safety service.
//!
//! `serve` starts the API server, `setup-db` creates the schema and loads
//! the sample fleet, and `check-db` prints what the database holds.
//! Without a subcommand the user picks one interactively.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use dialoguer::Select;
use waysure_database::{db, open_db, queries, seed};
use waysure_server::ServerConfig;

#[derive(Parser)]
#[command(name = "waysure", about = "Route safety advisory service")]
struct Cli {
    /// Database file (overrides `DATABASE_PATH`)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Start the API server
    Serve {
        /// Prompt for bind address and port before starting
        #[arg(long)]
        interactive: bool,
    },
    /// Create tables and insert the sample routes, incidents, and demo user
    SetupDb,
    /// Print the routes and incident count stored in the database
    CheckDb,
}

impl Commands {
    const MENU: &[Self] = &[
        Self::Serve { interactive: true },
        Self::SetupDb,
        Self::CheckDb,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Serve { .. } => "Start server",
            Self::SetupDb => "Set up database",
            Self::CheckDb => "Check database",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();
    let db_path = cli.database.unwrap_or_else(db::path_from_env);

    let command = if let Some(command) = cli.command {
        command
    } else {
        println!("WaySure Toolchain");
        println!();
        let labels: Vec<&str> = Commands::MENU.iter().map(Commands::label).collect();
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;
        Commands::MENU[idx]
    };

    match command {
        Commands::Serve { interactive } => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(async move {
                    if interactive {
                        waysure_server::interactive::run(&db_path).await
                    } else {
                        waysure_server::run_server_with(&db_path, ServerConfig::from_env())
                            .await
                    }
                })
            })
            .await??;
        }
        Commands::SetupDb => setup_db(&db_path).await?,
        Commands::CheckDb => check_db(&db_path).await?,
    }

    Ok(())
}

async fn setup_db(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Creating database at {}", path.display());
    let conn = open_db(path).await?;

    let summary = seed::seed_sample_data(conn.as_ref(), chrono::Utc::now()).await?;

    println!("Database ready: {}", path.display());
    println!("  - {} routes added", summary.routes);
    println!("  - {} incidents added", summary.incidents);
    println!("  - {} demo user added", summary.users);
    Ok(())
}

async fn check_db(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(path).await?;

    println!("ROUTES IN DATABASE:");
    for route in queries::list_routes(conn.as_ref()).await? {
        println!("   {} - {}", route.number, route.name);
    }

    let count = queries::count_incidents(conn.as_ref()).await?;
    println!();
    println!("TOTAL INCIDENTS: {count}");
    Ok(())
}
