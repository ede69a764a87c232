use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ringside_build::{BuildConfig, BuildPipeline, BuildRunSummary};

#[derive(Debug, Parser)]
#[command(name = "ringside")]
#[command(about = "Generate wrestling event picks and live-tracker pages from a CSV dataset")]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Args)]
struct PathArgs {
    /// Event dataset CSV
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Page template with $placeholders
    #[arg(long, global = true)]
    template: Option<PathBuf>,
    /// Output directory
    #[arg(long, global = true)]
    out: Option<PathBuf>,
    /// Root containing assets/logos
    #[arg(long, global = true)]
    assets: Option<PathBuf>,
    /// Directory of per-event leaderboard CSVs
    #[arg(long, global = true)]
    leaderboards: Option<PathBuf>,
    /// Site config YAML
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

impl PathArgs {
    fn apply(self, mut config: BuildConfig) -> BuildConfig {
        if let Some(path) = self.data {
            config.data_csv = path;
        }
        if let Some(path) = self.template {
            config.template = path;
        }
        if let Some(path) = self.out {
            config.out_dir = path;
        }
        if let Some(path) = self.assets {
            config.assets_dir = path;
        }
        if let Some(path) = self.leaderboards {
            config.leaderboard_dir = path;
        }
        if let Some(path) = self.config {
            config.config_path = path;
        }
        config
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render every event plus the index page
    Build,
    /// Render a single event, prompting for its EventID when omitted
    Event { event_id: Option<String> },
    /// Print the EventIDs found in the dataset
    List,
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.paths.apply(BuildConfig::from_env());
    let pipeline = BuildPipeline::new(config)?;

    match cli.command.unwrap_or(Commands::Build) {
        Commands::Build => {
            let summary = pipeline.run_all()?;
            report(&summary);
            if !summary.failed_events.is_empty() {
                let ids: Vec<_> = summary
                    .failed_events
                    .iter()
                    .map(|f| f.event_id.as_str())
                    .collect();
                bail!("failed to build events: {}", ids.join(", "));
            }
        }
        Commands::Event { event_id } => {
            let event_id = match event_id {
                Some(id) => id,
                None => prompt_event_id(&pipeline.list_event_ids()?)?,
            };
            let event = pipeline.event(&event_id)?;
            println!("Detected Match names:");
            for name in event.match_names() {
                println!(" - {name}");
            }
            report(&pipeline.run_event(&event_id)?);
        }
        Commands::List => {
            println!("{}", pipeline.list_event_ids()?.join(", "));
        }
    }

    Ok(())
}

fn prompt_event_id(available: &[String]) -> Result<String> {
    println!("Available EventIDs: {}", available.join(", "));
    print!("Enter EventID to generate (example: EC2026): ");
    io::stdout().flush().context("flushing prompt")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading EventID from stdin")?;
    Ok(line.trim().to_string())
}

fn report(summary: &BuildRunSummary) {
    for page in &summary.files_written {
        println!("Created '{}'", page.absolute_path.display());
    }
}
