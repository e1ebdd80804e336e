//! Landing Replay CLI - Run a scripted visitor session against the landing page
//!
//! Usage:
//!   cargo run --bin landing_replay -- --script demos/scroll_walkthrough.yaml
//!   cargo run --bin landing_replay -- --script demos/scroll_walkthrough.yaml --format json

use anyhow::Result;
use clap::{Parser, ValueEnum};
use landmine_landing::config::ConfigLoader;
use landmine_landing::replay::{self, ReplayScript, StepResult};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "landing_replay")]
#[command(about = "Replay a scroll/click script against the landing page controller")]
struct Cli {
    /// Replay script (YAML)
    #[arg(short, long)]
    script: PathBuf,

    /// Landing config (default: LANDING_CONFIG or config/landing.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: Format,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let loader = match &cli.config {
        Some(path) => ConfigLoader::new(path),
        None => ConfigLoader::from_env(),
    };
    let config = loader.load()?;
    let script = ReplayScript::load(&cli.script)?;

    let report = replay::run(&config, &script)?;

    match cli.format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Text => {
            println!("=== Landing Replay ===");
            println!();
            for (idx, step) in report.steps.iter().enumerate() {
                let line = match step {
                    StepResult::Mounted { observed, skipped } => {
                        format!("mount        observed={} skipped={}", observed, skipped)
                    }
                    StepResult::Unmounted => "unmount".to_string(),
                    StepResult::Sampled { revealed: Some(id) } => {
                        format!("sample       revealed {}", id)
                    }
                    StepResult::Sampled { revealed: None } => "sample       -".to_string(),
                    StepResult::Clicked { control, result } => {
                        format!("click        {:<16} {:?}", control.to_string(), result)
                    }
                };
                println!("{:>3}. {}", idx + 1, line);
            }

            println!();
            println!("Reveals:  {:?}", report.reveals);
            println!("Scrolls:  {:?}", report.scrolls);
            println!("Entries:  {}", report.entries);
            println!();
            for (id, revealed) in &report.revealed {
                println!("  {:<10} {}", id.as_str(), if *revealed { "revealed" } else { "hidden" });
            }
        }
    }

    Ok(())
}
