// ABOUTME: Entry point for the imagesync CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use imagesync::config::{self, SyncConfig};
use imagesync::daemon::System;
use imagesync::error::{Error, Result};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        if let Error::Runtime(err) = &e {
            eprintln!("hint: {}", err.kind().hint());
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let home = config::resolve_home(cli.home.as_deref())?;

    match cli.command {
        Commands::Run => System::bootstrap(&home).await?.run().await,
        Commands::Sync => sync(&home).await,
        Commands::Init { force } => {
            let path = config::init_config(&home, force)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Commands::Status => status(&home),
    }
}

/// Run one pass and print what happened.
async fn sync(home: &Path) -> Result<()> {
    let system = System::bootstrap(home).await?;
    let report = system.sync_once().await;

    for transfer in &report.transfers {
        println!(
            "  ✓ {}:{} from {} -> {}",
            transfer.image, transfer.tag, transfer.source, transfer.destination
        );
    }
    for failure in report.diagnostics.failures() {
        println!("  ✗ {}", failure);
    }
    println!(
        "{} needed, {} transferred, {} failed",
        report.needed,
        report.transfers.len(),
        report.diagnostics.failures().len()
    );
    Ok(())
}

/// Print the configuration without contacting any registry.
fn status(home: &Path) -> Result<()> {
    let path = config::config_path(home);
    if !path.exists() {
        return Err(Error::InvalidConfig(format!(
            "no config at {}; run `imagesync init` first",
            path.display()
        )));
    }
    let config = SyncConfig::load(&path)?;

    println!("Config: {}", path.display());
    println!("Daemon: {}", config.docker_config.endpoint);
    println!("Local repository: {}", config.repo.url);
    println!("Remote repositories: {}", config.remote_repos.len());
    for remote in &config.remote_repos {
        println!("  - {}", remote.url);
    }
    println!("Images: {}", config.images.len());
    for target in &config.images {
        println!("  - {} [{}]", target.image, target.versions.join(", "));
    }
    match config.resync_interval {
        Some(every) => println!("Resync every: {:?}", every),
        None => println!("Resync: disabled"),
    }
    Ok(())
}
