use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

mod config;
mod dataset;
mod error;
mod models;
mod query;
mod report;

use config::{Config, DATA_DIR_ENV};
use dataset::Dataset;
use error::ExplorerError;
use models::{GenderFilter, StateFilter, YearRange};
use query::{TrendQuery, MAX_TREND_NAMES};
use report::OutputFormat;

#[derive(Parser)]
#[command(name = "babynames-explorer", version)]
#[command(about = "Explore historical baby name popularity by year, state and gender", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/babynames-explorer/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the name tables
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,
    /// Write output to a file instead of stdout
    #[arg(long, global = true)]
    out: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Yearly popularity of up to three names
    Trend {
        #[arg(long = "name")]
        names: Vec<String>,
        /// YEAR or START-END
        #[arg(long)]
        years: Option<YearRange>,
        /// Two-letter state code, or "All"
        #[arg(long)]
        state: Option<StateFilter>,
        #[arg(long, value_enum)]
        gender: Option<GenderFilter>,
    },
    /// Total count of one name per state
    Map {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        years: Option<YearRange>,
        #[arg(long, value_enum)]
        gender: Option<GenderFilter>,
    },
    /// Top 50 male and female names for a year
    Top {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        state: Option<String>,
    },
    /// Precomputed unisex name rankings for a year
    Unisex {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        state: Option<String>,
    },
    /// Years, states and row counts available in the data directory
    Catalog,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_result = config::load_config(cli.config.as_deref());
    if let Some(warning) = &config_result.warning {
        eprintln!("warning: {warning}");
    }
    let config = config_result.config;

    let env_dir = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
    let paths = config.data.paths(cli.data_dir.as_deref(), env_dir);
    let dataset = Dataset::load(&paths).context("failed to load the name tables")?;

    let output = run(&dataset, &config, cli.command, cli.format)?;
    write_output(&output, cli.out.as_deref())
}

fn run(
    dataset: &Dataset,
    config: &Config,
    command: Commands,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let defaults = &config.defaults;
    let default_years = || YearRange::new(defaults.year_start, defaults.year_end);

    let output = match command {
        Commands::Trend {
            names,
            years,
            state,
            gender,
        } => {
            let names = selected_names(if names.is_empty() {
                defaults.names.clone()
            } else {
                names
            })?;
            let state = match state {
                Some(state) => state,
                None => defaults
                    .state
                    .parse::<StateFilter>()
                    .map_err(anyhow::Error::msg)
                    .context("invalid default state in config")?,
            };
            let query = TrendQuery {
                names,
                years: years.map_or_else(default_years, Ok)?,
                state,
                gender: gender.unwrap_or(defaults.gender),
            };
            let points = query::name_trend(dataset, &query);
            report::render_trend(&points, &query, format)?
        }
        Commands::Map {
            name,
            years,
            gender,
        } => {
            let name = match name.or_else(|| defaults.names.first().cloned()) {
                Some(name) => name,
                None => anyhow::bail!("--name is required when no default names are configured"),
            };
            let years = years.map_or_else(default_years, Ok)?;
            let gender = gender.unwrap_or(defaults.gender);
            let totals = query::state_totals(dataset, &name, years, gender);
            report::render_state_totals(&totals, &name, years, gender, format)?
        }
        Commands::Top { year, state } => {
            let catalog = dataset.catalog();
            let table = match state {
                Some(state) => {
                    let state = state.to_ascii_uppercase();
                    let year = match year.or_else(|| catalog.state_year_span.map(|span| span.end)) {
                        Some(year) => year,
                        None => return Err(ExplorerError::EmptyTable("state name").into()),
                    };
                    query::top_names_in_state(dataset, year, &state)
                }
                None => {
                    let year = match year.or_else(|| catalog.national_years.first().copied()) {
                        Some(year) => year,
                        None => return Err(ExplorerError::EmptyTable("national name").into()),
                    };
                    query::top_names_national(dataset, year)
                }
            };
            report::render_ranking(&table, format)?
        }
        Commands::Unisex { year, state } => {
            let year = match year.or_else(|| dataset.catalog().unisex_years.first().copied()) {
                Some(year) => year,
                None => return Err(ExplorerError::EmptyTable("unisex").into()),
            };
            match state.map(|state| state.to_ascii_uppercase()) {
                Some(state) => {
                    let entries = query::unisex_in_state(dataset, year, &state);
                    report::render_unisex(&entries, year, Some(&state), format)?
                }
                None => {
                    let entries = query::unisex_national(dataset, year);
                    report::render_unisex(&entries, year, None, format)?
                }
            }
        }
        Commands::Catalog => report::render_catalog(&dataset.catalog(), format)?,
    };

    Ok(output)
}

/// Drops duplicates (keeping first occurrence) and enforces the name cap.
fn selected_names(names: Vec<String>) -> Result<Vec<String>, ExplorerError> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_string();
        if !name.is_empty() && !unique.contains(&name) {
            unique.push(name);
        }
    }

    if unique.len() > MAX_TREND_NAMES {
        return Err(ExplorerError::TooManyNames {
            max: MAX_TREND_NAMES,
            got: unique.len(),
        });
    }
    Ok(unique)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn write_output(output: &str, out: Option<&Path>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Output written to {}.", path.display());
        }
        None => print!("{output}"),
    }
    Ok(())
}
