#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the GDELT Pulse toolchain.
//!
//! ```text
//! gdelt_pulse serve
//! gdelt_pulse fetch [--time 24H] [--categories conflict,protest]
//! gdelt_pulse watch [--endpoint URL] [--share URL] [--config poller.toml] [filters]
//! gdelt_pulse export [--endpoint URL] [--out DIR] [filters]
//! gdelt_pulse share --base URL [filters]
//! ```
//!
//! Filters are `--category`, `--time`, and `--search`.

mod render;
mod watch;

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use gdelt_pulse_aggregator::{Aggregator, AggregatorConfig};
use gdelt_pulse_event_models::{Category, CategoryFilter, TimeWindow, category_counts};
use gdelt_pulse_poller::{HttpEventsSource, PollerConfig, fetch_with_retry};
use gdelt_pulse_server::{ServerConfig, run_server};
use gdelt_pulse_store::{FilterState, filter_events, parse_share_url, share_url, write_export};

#[derive(Parser)]
#[command(name = "gdelt_pulse", about = "Global event monitoring over the GDELT GEO API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server (configured from the environment)
    Serve,
    /// Query GDELT once, in-process, and print a per-category summary
    Fetch {
        /// Lookback window
        #[arg(long, default_value = "24H")]
        time: TimeWindow,
        /// Comma-separated categories (default: all)
        #[arg(long, value_delimiter = ',')]
        categories: Vec<Category>,
    },
    /// Live dashboard fed by a running server
    Watch {
        /// Base URL of the API server
        #[arg(long)]
        endpoint: Option<String>,
        /// Start from the filters encoded in a share URL
        #[arg(long)]
        share: Option<String>,
        /// TOML poller config
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Fetch once from a running server and write the filtered events as JSON
    Export {
        /// Base URL of the API server
        #[arg(long)]
        endpoint: Option<String>,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print a share URL for a filter selection
    Share {
        /// Origin and path the query is appended to
        #[arg(long)]
        base: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Category, or "all"
    #[arg(long)]
    category: Option<CategoryFilter>,
    /// Lookback window (1H, 6H, 12H, 24H, 3D, 7D)
    #[arg(long)]
    time: Option<TimeWindow>,
    /// Case-insensitive text search
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    /// Overrides the parts of `base` that were given on the command line.
    fn apply(self, mut base: FilterState) -> FilterState {
        if let Some(category) = self.category {
            base.category = category;
        }
        if let Some(time) = self.time {
            base.time_window = time;
        }
        if let Some(search) = self.search {
            base.search = search;
        }
        base
    }
}

fn poller_config(
    path: Option<&Path>,
    endpoint: Option<String>,
) -> Result<PollerConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => PollerConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => PollerConfig::default(),
    };
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }
    Ok(config)
}

async fn fetch(time: TimeWindow, categories: Vec<Category>) -> Result<(), Box<dyn std::error::Error>> {
    let categories = if categories.is_empty() {
        Category::all().to_vec()
    } else {
        categories
    };

    let aggregator = Aggregator::new(&AggregatorConfig::from_env())?;
    let aggregation = aggregator.aggregate(&categories, time).await;

    println!("GDELT events, last {}", time.label());
    println!("{}", "-".repeat(40));
    for (category, count) in category_counts(&aggregation.events) {
        if !categories.contains(&category) {
            continue;
        }
        let status = if aggregation.failed.contains(&category) {
            "  (failed)"
        } else {
            ""
        };
        println!("{} {:<10} {count:>6}{status}", category.icon(), category.display_name());
    }
    println!("{}", "-".repeat(40));
    println!("{} events", aggregation.events.len());

    if aggregation.has_errors {
        eprintln!("Some categories could not be fetched; see the log for details.");
    }
    Ok(())
}

async fn export(
    endpoint: Option<String>,
    out: &Path,
    filter: FilterState,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = poller_config(None, endpoint)?;
    let source = HttpEventsSource::from_config(&config)?;
    let response =
        fetch_with_retry(&source, filter.time_window, config.retry_count, config.retry_interval).await?;

    let events = filter_events(&response.events, &filter);
    let path = write_export(out, &events, Utc::now().date_naive())?;
    println!("Wrote {} of {} events to {}", events.len(), response.total_count, path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(run_server(ServerConfig::from_env()))
            })
            .await??;
        }
        Commands::Fetch { time, categories } => fetch(time, categories).await?,
        Commands::Watch {
            endpoint,
            share,
            config,
            filter,
        } => {
            let base = match share {
                Some(url) => parse_share_url(&url)?,
                None => FilterState::default(),
            };
            let config = poller_config(config.as_deref(), endpoint)?;
            watch::run(config, filter.apply(base)).await?;
        }
        Commands::Export {
            endpoint,
            out,
            filter,
        } => export(endpoint, &out, filter.apply(FilterState::default())).await?,
        Commands::Share { base, filter } => {
            println!("{}", share_url(&base, &filter.apply(FilterState::default())));
        }
    }

    Ok(())
}
