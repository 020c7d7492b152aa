mod cli;

use chrono::{Local, NaiveDate};
use clap::Parser;
use cli::{Cli, Commands, LocationArgs};
use maxwater::config::Config;
use maxwater::datasources::ForecastClient;
use maxwater::error::Result;
use maxwater::logic::calculations::moisture_profile;
use maxwater::logic::costs::DateRange;
use maxwater::logic::pipeline::{self, CostInputs};
use maxwater::logic::simulation::simulate_rainfall;
use maxwater::logic::forecast_sync::forecast_for;
use maxwater::logic::ForecastSnapshot;
use maxwater::models::{MoistureCell, StageOutcome, StageStatus, WaterBalanceState};
use maxwater::tables::Upload;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct WaterBalanceReport {
    balance: WaterBalanceState,
    moisture_profile: Vec<MoistureCell>,
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init = cli.command {
        let (_, path) = Config::setup_interactive()?;
        println!("Config written to {}", path.display());
        return Ok(());
    }

    let config = load_config(cli.config.clone());

    match cli.command {
        Commands::Init => Ok(()),
        Commands::Check => check(&config).await,
        Commands::Forecast { location } => {
            let snapshot = forecast(&config, &location).await;
            let status = snapshot.status.clone();
            emit(&StageOutcome::new(snapshot, status))
        }
        Commands::Recommend {
            moisture,
            stage,
            ndvi,
            location,
        } => {
            let snapshot = forecast(&config, &location).await;
            emit(&pipeline::recommend_irrigation(
                moisture, &stage, ndvi, &snapshot, &config,
            ))
        }
        Commands::WaterBalance {
            sensors,
            stage,
            seed,
            location,
        } => {
            let today = Local::now().date_naive();
            let upload = read_upload(sensors.as_deref())?;
            let sensor_data = pipeline::load_sensor_data(upload.as_ref(), today, seed);

            let (rainfall, forecast_status) = if location.offline {
                (
                    simulate_rainfall(today, seed),
                    StageStatus::ok("Using simulated rainfall forecast."),
                )
            } else {
                let snapshot = forecast(&config, &location).await;
                (snapshot.daily_rainfall(), snapshot.status)
            };

            let balance = pipeline::water_balance_stage(&sensor_data.data, &rainfall, &stage, &config);
            let status =
                StageStatus::combine([sensor_data.status, forecast_status, balance.status]);
            let report = WaterBalanceReport {
                balance: balance.data,
                moisture_profile: moisture_profile(&sensor_data.data),
            };
            emit(&StageOutcome::new(report, status))
        }
        Commands::Costs {
            irrigation,
            fertilizer,
            planting,
            irrigation_price,
            fertilizer_price,
            start,
            end,
            hybrids,
        } => {
            let irrigation = read_upload(irrigation.as_deref())?;
            let fertilizer = read_upload(fertilizer.as_deref())?;
            let planting = read_upload(planting.as_deref())?;
            let range = match (start, end) {
                (None, None) => None,
                (start, end) => Some(DateRange::new(
                    start.unwrap_or(NaiveDate::MIN),
                    end.unwrap_or(NaiveDate::MAX),
                )?),
            };

            let inputs = CostInputs {
                irrigation: irrigation.as_ref(),
                fertilizer: fertilizer.as_ref(),
                planting: planting.as_ref(),
                range,
                irrigation_price,
                fertilizer_price,
                selected_hybrids: hybrids,
            };
            emit(&pipeline::cost_overview(&inputs))
        }
        Commands::Efficiency {
            usage,
            hybrids,
            seed,
        } => {
            let usage = read_upload(usage.as_deref())?;
            let hybrids = read_upload(hybrids.as_deref())?;
            emit(&pipeline::efficiency_overview(
                usage.as_ref(),
                hybrids.as_ref(),
                &config,
                seed,
            ))
        }
    }
}

/// A missing or broken config falls back to built-in defaults.
fn load_config(path: Option<PathBuf>) -> Config {
    if !Config::exists(path.as_ref()) {
        tracing::info!("No config file found; using defaults");
        return Config::default();
    }
    match Config::load(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("{}; using defaults", e);
            Config::default()
        }
    }
}

fn read_upload(path: Option<&Path>) -> Result<Option<Upload>> {
    path.map(Upload::from_path).transpose()
}

async fn forecast(config: &Config, location: &LocationArgs) -> ForecastSnapshot {
    if location.offline {
        return ForecastSnapshot::default();
    }
    forecast_for(&config.forecast, location.lat, location.lon).await
}

async fn check(config: &Config) -> Result<()> {
    println!("Forecast service: {}", config.forecast.base_url);
    println!("User-Agent:       {}", config.forecast.user_agent);

    let client = ForecastClient::new(config.forecast.clone())?;
    match client.test_connection().await {
        Ok(true) => println!("Connection:       OK"),
        Ok(false) => println!("Connection:       FAILED (unexpected status)"),
        Err(e) => println!("Connection:       FAILED ({})", e),
    }
    Ok(())
}

fn emit<T: Serialize>(outcome: &StageOutcome<T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome.data)?);
    eprintln!("{}", outcome.status);
    Ok(())
}
