//! kitbuild CLI - build orchestrator for publishing component libraries.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "kitbuild")]
#[command(about = "Build, document and demo a component library")]
#[command(version)]
pub struct Cli {
    /// Rebuild both variants whenever the sources change
    #[arg(long, conflicts_with = "demo")]
    watch: bool,

    /// Stage and build the demo application instead of the library
    #[arg(long)]
    demo: bool,

    /// Install the demo's dependencies
    #[arg(long, requires = "demo")]
    install: bool,

    /// Serve the demo interactively instead of building it
    #[arg(long, requires = "demo")]
    run: bool,

    /// Path to kitbuild.toml config file
    #[arg(short, long, default_value = "kitbuild.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let root = std::env::current_dir().context("Failed to determine working directory")?;
    let project = config::load_config(&root.join(&cli.config))?.into_project(root);

    if cli.demo {
        commands::demo::run(project, cli.install, cli.run).await?;
    } else if cli.watch {
        commands::watch::run(project).await?;
    } else {
        commands::build::run(project).await?;
    }

    Ok(())
}
