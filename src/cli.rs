use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::aggregator::{AggregationService, SortMode};
use crate::config::AppConfig;
use crate::errors::{ConfigError, Result};
use crate::fx::RateTable;
use crate::output::{self, OutputFormat};
use crate::sources::{SourceDescriptor, SourceError, SourceRegistry};

#[derive(Parser)]
#[command(
    name = "llm-balance",
    about = "Check account balances, token quotas and coding-plan usage across LLM platforms",
    version
)]
pub struct Cli {
    /// Path to the config file (default: ~/.llm-balance/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check account balances
    Cost(CheckArgs),
    /// Check token/package quotas
    Quota(CheckArgs),
    /// Check coding-plan usage windows
    Plan(CheckArgs),
    /// List known sources and their state
    List,
    /// Enable a source
    Enable { source: String },
    /// Disable a source
    Disable { source: String },
    /// Show the active currency conversion rates
    Rates,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Query a single source instead of fanning out to all enabled ones
    #[arg(long)]
    pub source: Option<String>,

    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Target currency for converted totals
    #[arg(long)]
    pub currency: Option<String>,

    #[arg(long, value_enum, default_value = "name")]
    pub sort: SortArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    /// Alphabetical by display name
    Name,
    /// Descending by converted value
    Value,
    /// Completion order
    Unordered,
}

impl SortArg {
    fn to_mode(self, target: &str) -> SortMode {
        match self {
            SortArg::Name => SortMode::ByName,
            SortArg::Value => SortMode::ByValue {
                target: target.to_string(),
            },
            SortArg::Unordered => SortMode::Unordered,
        }
    }
}

fn find_descriptor(descriptors: &[SourceDescriptor], id: &str) -> Result<SourceDescriptor> {
    descriptors
        .iter()
        .find(|descriptor| descriptor.id == id)
        .cloned()
        .ok_or_else(|| SourceError::UnknownSource(id.to_string()).into())
}

fn config_path(cli_path: Option<&PathBuf>) -> Result<PathBuf> {
    cli_path
        .cloned()
        .or_else(AppConfig::default_path)
        .ok_or_else(|| {
            ConfigError::Io("no home directory to resolve the config path".to_string()).into()
        })
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let registry = SourceRegistry::builtin();
    let rates = RateTable::from_env();

    match cli.command {
        Command::Cost(args) => {
            let target = args
                .currency
                .clone()
                .unwrap_or_else(|| config.currency.clone());
            let service = AggregationService::new(Arc::clone(&registry), rates);
            let descriptors = config.descriptors(&registry);
            let records = match &args.source {
                Some(id) => {
                    let descriptor = find_descriptor(&descriptors, id)?;
                    vec![service.check_balance(&descriptor).await?]
                }
                None => {
                    service
                        .check_all_balances(&descriptors, &args.sort.to_mode(&target))
                        .await?
                }
            };
            print!(
                "{}",
                output::render_balances(&records, service.normalizer(), &target, args.format)
            );
        }
        Command::Quota(args) => {
            let target = args
                .currency
                .clone()
                .unwrap_or_else(|| config.currency.clone());
            let service = AggregationService::new(Arc::clone(&registry), rates);
            let descriptors = config.descriptors(&registry);
            let reports = match &args.source {
                Some(id) => {
                    let descriptor = find_descriptor(&descriptors, id)?;
                    vec![service.check_quota(&descriptor).await?]
                }
                None => {
                    service
                        .check_all_quotas(&descriptors, &args.sort.to_mode(&target))
                        .await?
                }
            };
            print!("{}", output::render_quotas(&reports, args.format));
        }
        Command::Plan(args) => {
            let target = args
                .currency
                .clone()
                .unwrap_or_else(|| config.currency.clone());
            let service = AggregationService::new(Arc::clone(&registry), rates);
            let descriptors = config.descriptors(&registry);
            let reports = match &args.source {
                Some(id) => {
                    let descriptor = find_descriptor(&descriptors, id)?;
                    vec![service.check_plan(&descriptor).await?]
                }
                None => {
                    service
                        .check_all_plans(&descriptors, &args.sort.to_mode(&target))
                        .await?
                }
            };
            print!("{}", output::render_plans(&reports, args.format));
        }
        Command::List => {
            for descriptor in config.descriptors(&registry) {
                let state = if descriptor.enabled { "enabled" } else { "disabled" };
                let credential = descriptor.env_var.as_deref().unwrap_or("-");
                println!(
                    "{:<14} {:<14} {:<9} {}",
                    descriptor.id, descriptor.display_name, state, credential
                );
            }
        }
        Command::Enable { source } => {
            registry.resolve(&source)?;
            let path = config_path(cli.config.as_ref())?;
            let mut config = config;
            config.set_enabled(&source, true);
            config.save(&path)?;
            println!("{} enabled", source);
        }
        Command::Disable { source } => {
            registry.resolve(&source)?;
            let path = config_path(cli.config.as_ref())?;
            let mut config = config;
            config.set_enabled(&source, false);
            config.save(&path)?;
            println!("{} disabled", source);
        }
        Command::Rates => {
            println!("Rates relative to CNY (1 unit = N CNY):");
            for (code, rate) in rates.entries() {
                println!("  {:<8} {}", code, rate);
            }
        }
    }
    Ok(())
}
