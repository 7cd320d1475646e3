//! Command-line front end: list indicators, print the recent-periods table,
//! or export chart data.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use macro_de_lib::report::{ChartData, RecentTable, RECENT_PERIODS};
use macro_de_lib::{AppConfig, Registry, Resolver};

#[derive(Parser)]
#[command(name = "macro-de")]
#[command(about = "German macroeconomic indicators from OECD, Destatis, Eurostat, ECB and Bundesbank")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List every configured indicator
    List,

    /// Print the most recent periods as a table
    Show {
        /// Indicator names (default: all)
        names: Vec<String>,

        /// Number of periods to show
        #[arg(long, default_value_t = RECENT_PERIODS)]
        periods: usize,
    },

    /// Write chart data (one line per indicator) as JSON
    Chart {
        /// Indicator names (default: all)
        names: Vec<String>,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("macro_de_lib={0},macro_de={0}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let registry = Arc::new(Registry::builtin());

    for problem in registry.validate(config.max_derivation_depth) {
        tracing::warn!("registry: {}", problem);
    }

    match cli.command {
        Commands::List => {
            println!("{:<26} | {:<10} | {:<6} | {:<44} | {}", "Name", "Source", "Unit", "Origin", "Title");
            println!("{}", "-".repeat(120));
            for spec in registry.all() {
                println!(
                    "{:<26} | {:<10} | {:<6} | {:<44} | {}",
                    spec.name,
                    spec.source_kind().to_string(),
                    spec.unit.to_string(),
                    spec.source.to_string(),
                    spec.title
                );
            }
        }
        Commands::Show { names, periods } => {
            let names = selection(&registry, names)?;
            let resolver = Resolver::from_config(registry.clone(), &config);
            let resolved = resolver.resolve_many(&names).await;

            let table = RecentTable::build(&registry, &resolved, periods);
            if table.is_empty() {
                println!("No data available for the selected indicators.");
            } else {
                print!("{}", table.render());
            }
        }
        Commands::Chart { names, output } => {
            let names = selection(&registry, names)?;
            let resolver = Resolver::from_config(registry.clone(), &config);
            let resolved = resolver.resolve_many(&names).await;

            let json = ChartData::build(&registry, &resolved).to_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!("chart data written to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

/// Empty selection means every indicator; unknown names are rejected up front.
fn selection(registry: &Registry, names: Vec<String>) -> anyhow::Result<Vec<String>> {
    if names.is_empty() {
        return Ok(registry.names().into_iter().map(String::from).collect());
    }

    let unknown: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|n| registry.get(n).is_none())
        .collect();
    if !unknown.is_empty() {
        bail!("unknown indicator(s): {} (see `macro-de list`)", unknown.join(", "));
    }

    Ok(names)
}
