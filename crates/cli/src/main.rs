//! merkledrop: build and verify token-distribution claim documents.
//!
//! Each subcommand builds one allocation category (or all of them) from
//! the source documents under the data directory and writes the claim
//! artifact atomically; `verify` re-walks every proof in a written
//! artifact against its stored root.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use merkledrop_core::{hex_prefixed, Category};
use merkledrop_distribution::{
    verify_distribution, Distribution, DistributionConfig, DistributionService,
};
use merkledrop_settings::{write_json_atomic, Settings};

#[derive(Parser)]
#[command(name = "merkledrop", version, about = "Exact token-allocation distributions with Merkle claim proofs")]
struct Cli {
    /// Path to the settings file (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory from the settings file.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the team distribution.
    Team,
    /// Build the victims distribution.
    Victims,
    /// Build the penalty redemption distribution.
    Penalty,
    /// Build every category.
    All,
    /// Re-verify a written claim artifact.
    Verify {
        #[arg(long)]
        file: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: &Cli) -> Result<DistributionConfig> {
    let settings: Settings<DistributionConfig> =
        Settings::load_or_default("merkledrop", cli.config.as_deref())
            .context("failed to load settings")?;
    let mut config = settings.config;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    Ok(config)
}

fn write_artifact(
    config: &DistributionConfig,
    category: Category,
    distribution: &Distribution,
) -> Result<()> {
    let path = config.merkle_output_path(category);
    write_json_atomic(&path, distribution)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(
        category = %category,
        path = %path.display(),
        merkle_root = %hex_prefixed(&distribution.merkle_root),
        claims = distribution.claims.len(),
        "artifact written"
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Team => {
            let config = load_config(&cli)?;
            let service = DistributionService::new(config)?;
            let distribution = service.build_team()?;
            write_artifact(service.config(), Category::Team, &distribution)
        }
        Command::Victims => {
            let config = load_config(&cli)?;
            let service = DistributionService::new(config)?;
            let distribution = service.build_victims()?;
            write_artifact(service.config(), Category::Victims, &distribution)
        }
        Command::Penalty => {
            let config = load_config(&cli)?;
            let service = DistributionService::new(config)?;
            let distribution = service.build_penalty()?;
            write_artifact(service.config(), Category::Redemptions, &distribution)
        }
        Command::All => {
            let config = load_config(&cli)?;
            let service = DistributionService::new(config)?;
            // build everything before writing anything
            let results = service.build_all()?;
            for (category, distribution) in &results {
                write_artifact(service.config(), *category, distribution)?;
            }
            Ok(())
        }
        Command::Verify { file } => {
            let content = fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let distribution: Distribution = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", file.display()))?;
            verify_distribution(&distribution)?;
            info!(
                path = %file.display(),
                merkle_root = %hex_prefixed(&distribution.merkle_root),
                claims = distribution.claims.len(),
                "artifact verified"
            );
            Ok(())
        }
    }
}
