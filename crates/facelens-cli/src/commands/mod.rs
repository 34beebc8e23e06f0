//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use facelens_core::Settings;
use std::path::PathBuf;

pub mod analyze;
pub mod serve;

/// FaceLens - ancestry, origin and emotion predictions from a face photo
#[derive(Parser)]
#[command(name = "facelens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to ./facelens.toml when present)
    #[arg(short, long, global = true, env = "FACELENS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the analysis web server
    Serve(serve::ServeArgs),

    /// Analyze a single image and print the predictions
    Analyze(analyze::AnalyzeArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load(self.config.as_deref())?;

        match self.command {
            Commands::Serve(args) => serve::execute(args, settings).await,
            Commands::Analyze(args) => analyze::execute(args, settings).await,
        }
    }
}
