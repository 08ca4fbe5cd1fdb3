// Crop advisor command-line entry point
//
// Loads the artifacts once, runs a single operation and prints JSON to stdout.
// Usage: cargo run --release --bin crop_advisor -- recommend --state Punjab ...

use clap::{Parser, Subcommand};
use crop_advisor::{AdvisorConfig, AdvisorContext, PriceQuery, RecommendRequest, SoilReading};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use anyhow::{Context, Result};

#[derive(Parser)]
#[command(name = "crop_advisor")]
#[command(version, about = "Crop recommendation, price forecast and weather summary", long_about = None)]
struct Cli {
    /// Directory holding the trained artifacts
    #[arg(long, env = "MODELS_DIR", global = true)]
    models_dir: Option<PathBuf>,

    /// JSON file overriding tuning parameters
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the most suitable crops for a soil reading
    Recommend {
        #[arg(short = 'N', long)]
        nitrogen: f64,

        #[arg(short = 'P', long)]
        phosphorus: f64,

        #[arg(short = 'K', long)]
        potassium: f64,

        #[arg(short, long)]
        temperature: f64,

        #[arg(long)]
        ph: f64,

        #[arg(short, long)]
        moisture: f64,

        #[arg(short, long)]
        state: String,

        /// Defaults to Loamy
        #[arg(long)]
        soil_type: Option<String>,
    },

    /// Forecast market prices over the next four 15-day phases
    Forecast {
        #[arg(short, long)]
        crop: String,

        #[arg(short, long)]
        state: String,
    },

    /// Forecast many crop/state pairs from a JSON file of
    /// `[{"crop_name": ..., "state": ...}]`
    ForecastBatch {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Historical weather summary for a state and month
    Weather {
        #[arg(short, long)]
        state: String,

        /// 1-12
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },

    /// Which components loaded
    Status,

    /// Soil types accepted by the recommender
    SoilTypes,
}

#[derive(Serialize)]
struct BatchEntry {
    crop_name: String,
    state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    forecast: Option<crop_advisor::PriceForecast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // info for our crate, warn for dependencies
                    "crop_advisor=info,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AdvisorConfig::load(path)?,
        None => AdvisorConfig::from_env(),
    };
    if let Some(dir) = &cli.models_dir {
        config = config.with_models_dir(dir);
    }

    let ctx = AdvisorContext::load(&config);

    match cli.command {
        Commands::Recommend {
            nitrogen,
            phosphorus,
            potassium,
            temperature,
            ph,
            moisture,
            state,
            soil_type,
        } => {
            let request = RecommendRequest {
                reading: SoilReading {
                    nitrogen,
                    phosphorus,
                    potassium,
                    temperature,
                    ph,
                    moisture,
                },
                state,
                soil_type,
            };
            print_json(&ctx.recommend(&request)?, cli.pretty)?;
        }
        Commands::Forecast { crop, state } => {
            print_json(&ctx.forecast_price(&crop, &state)?, cli.pretty)?;
        }
        Commands::ForecastBatch { input } => {
            let contents = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read batch file: {:?}", input))?;
            let queries: Vec<PriceQuery> = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse batch file: {:?}", input))?;

            let results = ctx.forecast_prices(&queries)?;
            let entries: Vec<BatchEntry> = queries
                .into_iter()
                .zip(results)
                .map(|(q, result)| {
                    let (forecast, error) = match result {
                        Ok(f) => (Some(f), None),
                        Err(e) => (None, Some(e.to_string())),
                    };
                    BatchEntry {
                        crop_name: q.crop_name,
                        state: q.state,
                        forecast,
                        error,
                    }
                })
                .collect();
            print_json(&entries, cli.pretty)?;
        }
        Commands::Weather { state, month } => {
            print_json(&ctx.summarize_weather(&state, month)?, cli.pretty)?;
        }
        Commands::Status => {
            print_json(&ctx.status(), cli.pretty)?;
        }
        Commands::SoilTypes => {
            print_json(&ctx.soil_types(), cli.pretty)?;
        }
    }

    Ok(())
}
