use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use maxwater::logic::simulation::DEFAULT_SEED;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "maxwater",
    version,
    about = "Irrigation decisions, water balance and cost-efficiency metrics"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Args, Clone, Debug)]
pub struct LocationArgs {
    /// Field latitude (defaults to forecast.latitude in config)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Field longitude (defaults to forecast.longitude in config)
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Skip the forecast service
    #[arg(long)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Re-run interactive setup
    Init,
    /// Validate config and test the forecast service
    Check,
    /// Fetch the point forecast and precipitation for a location
    Forecast {
        #[command(flatten)]
        location: LocationArgs,
    },
    /// Decide whether to irrigate
    Recommend {
        /// Soil moisture, percent
        #[arg(long)]
        moisture: f64,

        /// Crop stage (germination, vegetative, flowering, maturation)
        #[arg(long, default_value = "vegetative")]
        stage: String,

        /// Vegetation index, 0-1
        #[arg(long)]
        ndvi: Option<f64>,

        #[command(flatten)]
        location: LocationArgs,
    },
    /// Project available soil water over the forecast window
    WaterBalance {
        /// Sensor moisture file (csv/xlsx); simulated when omitted
        #[arg(long)]
        sensors: Option<PathBuf>,

        #[arg(long, default_value = "vegetative")]
        stage: String,

        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        #[command(flatten)]
        location: LocationArgs,
    },
    /// Normalize irrigation and fertilizer costs and roll them up by hybrid
    Costs {
        #[arg(long)]
        irrigation: Option<PathBuf>,

        #[arg(long)]
        fertilizer: Option<PathBuf>,

        #[arg(long)]
        planting: Option<PathBuf>,

        /// Price per unit of irrigation
        #[arg(long, default_value_t = 15.0)]
        irrigation_price: f64,

        /// Price per unit of fertilizer
        #[arg(long, default_value_t = 10.0)]
        fertilizer_price: f64,

        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Only include these hybrids (repeatable)
        #[arg(long = "hybrid")]
        hybrids: Vec<String>,
    },
    /// Water-use efficiency per sensor and per hybrid
    Efficiency {
        /// Usage/yield file; simulated when omitted
        #[arg(long)]
        usage: Option<PathBuf>,

        /// Sensor to hybrid assignments
        #[arg(long)]
        hybrids: Option<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
}
