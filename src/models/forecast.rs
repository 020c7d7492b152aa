use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// The forecast service's spatial cell for a lat/lon pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridReference {
    pub grid_x: i64,
    pub grid_y: i64,
    pub office: String,
    pub forecast_url: String,
    pub forecast_grid_url: String,
}

/// One named forecast period (typically day/night halves over 7 days).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPeriod {
    pub start_time: DateTime<FixedOffset>,
    pub temperature_f: f64,
    pub rain_likely: bool,
    pub detailed_text: String,
}

impl ForecastPeriod {
    pub fn new(start_time: DateTime<FixedOffset>, temperature_f: f64, detailed_text: String) -> Self {
        let rain_likely = mentions_rain(&detailed_text);
        Self {
            start_time,
            temperature_f,
            rain_likely,
            detailed_text,
        }
    }
}

pub fn mentions_rain(text: &str) -> bool {
    text.to_lowercase().contains("rain")
}

/// Quantitative precipitation forecast for one grid interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationSample {
    pub valid_time: DateTime<FixedOffset>,
    pub qpf_inches: Option<f64>,
}

/// Forecast rainfall summed per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRainfall {
    pub date: NaiveDate,
    pub rainfall_inches: f64,
}
