use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWaterBalance {
    pub date: NaiveDate,
    pub rainfall_inches: f64,
    pub cumulative_rainfall_inches: f64,
    pub total_available_water_inches: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WaterBalanceState {
    pub average_soil_moisture_inches: f64,
    pub soil_capacity_inches: f64,
    pub daily_forecast: Vec<DailyWaterBalance>,
    /// Deficit left after current moisture plus all forecast rain; never negative.
    pub irrigation_threshold_inches: f64,
}

impl WaterBalanceState {
    pub fn total_forecast_rain_inches(&self) -> f64 {
        self.daily_forecast
            .last()
            .map(|d| d.cumulative_rainfall_inches)
            .unwrap_or(0.0)
    }
}
