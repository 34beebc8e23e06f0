//! Web server command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use facelens_core::Settings;
use std::path::PathBuf;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "FACELENS_PORT", default_value = "3000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "FACELENS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the sample gallery images
    #[arg(long)]
    pub samples_dir: Option<PathBuf>,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file path (defaults to ./facelens.log)
    #[arg(long, requires = "log")]
    pub log_file: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs, mut settings: Settings) -> Result<()> {
    if let Some(dir) = args.samples_dir {
        settings.samples_dir = Some(dir);
    }
    // The gallery is served by this process, so its relative URLs resolve here.
    settings.use_listen_address(&args.host, args.port);

    println!();
    println!("  {} {}", "FaceLens".cyan().bold(), "Analysis Server".bold());
    println!();
    println!(
        "  {}        http://{}:{}/api/analyze-face",
        "API".green(),
        args.host,
        args.port
    );
    println!(
        "  {}    http://{}:{}/api/samples",
        "Samples".green(),
        args.host,
        args.port
    );
    println!("  {}      {}", "Model".green(), settings.model);
    if settings.api_key.is_none() {
        println!(
            "  {}",
            "MISTRAL_API_KEY not set - analyses will fail until it is".yellow()
        );
    }
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    facelens_web::run_server(&settings, &args.host, args.port).await?;

    Ok(())
}
