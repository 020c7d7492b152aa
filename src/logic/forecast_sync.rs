use super::calculations::{any_rain_likely, daily_rainfall, mean_qpf};
use crate::config::ForecastConfig;
use crate::datasources::ForecastClient;
use crate::models::{DailyRainfall, ForecastPeriod, GridReference, PrecipitationSample, StageStatus};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything one forecast refresh produced. Steps that failed leave their
/// fields empty and say so in `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSnapshot {
    pub grid: Option<GridReference>,
    pub periods: Vec<ForecastPeriod>,
    pub precipitation: Vec<PrecipitationSample>,
    /// False when the QPF grid could not be fetched.
    pub precipitation_available: bool,
    pub status: StageStatus,
}

impl Default for ForecastSnapshot {
    fn default() -> Self {
        Self {
            grid: None,
            periods: Vec::new(),
            precipitation: Vec::new(),
            precipitation_available: false,
            status: StageStatus::warning("No forecast requested"),
        }
    }
}

impl ForecastSnapshot {
    fn failed(message: String) -> Self {
        Self {
            status: StageStatus::error(message),
            ..Default::default()
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: StageStatus::warning(reason),
            ..Default::default()
        }
    }

    /// (rain forecast, mean QPF inches) for the rule engine. Without the
    /// precipitation grid both fall back to "no rain".
    pub fn rain_signal(&self) -> (bool, f64) {
        if !self.precipitation_available {
            return (false, 0.0);
        }
        (any_rain_likely(&self.periods), mean_qpf(&self.precipitation))
    }

    pub fn daily_rainfall(&self) -> Vec<DailyRainfall> {
        daily_rainfall(&self.precipitation)
    }
}

pub struct ForecastSync {
    client: ForecastClient,
    current: Arc<RwLock<Option<ForecastSnapshot>>>,
}

impl ForecastSync {
    pub fn new(client: ForecastClient) -> Self {
        Self {
            client,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Resolve the grid, then fetch periods, then QPF. Never fails: each
    /// step's error is logged and becomes the snapshot's status.
    pub async fn refresh(&self, lat: f64, lon: f64) -> ForecastSnapshot {
        let snapshot = self.fetch(lat, lon).await;
        let mut current = self.current.write().await;
        *current = Some(snapshot.clone());
        snapshot
    }

    async fn fetch(&self, lat: f64, lon: f64) -> ForecastSnapshot {
        let grid = match self.client.resolve_grid(lat, lon).await {
            Ok(grid) => grid,
            Err(e) => {
                tracing::warn!("Failed to resolve forecast grid: {}", e);
                return ForecastSnapshot::failed(format!("Forecast grid lookup failed: {}", e));
            }
        };

        let periods = match self.client.fetch_period_forecast(&grid).await {
            Ok(periods) => periods,
            Err(e) => {
                tracing::warn!("Failed to fetch period forecast: {}", e);
                return ForecastSnapshot {
                    grid: Some(grid),
                    ..ForecastSnapshot::failed(format!("Period forecast failed: {}", e))
                };
            }
        };

        match self.client.fetch_precipitation_grid(&grid).await {
            Ok(precipitation) => {
                tracing::debug!(
                    "Forecast updated: {} periods, {} QPF samples",
                    periods.len(),
                    precipitation.len()
                );
                let message = format!(
                    "Forecast for {} {},{}: {} periods, {} precipitation samples",
                    grid.office,
                    grid.grid_x,
                    grid.grid_y,
                    periods.len(),
                    precipitation.len()
                );
                ForecastSnapshot {
                    grid: Some(grid),
                    periods,
                    precipitation,
                    precipitation_available: true,
                    status: StageStatus::ok(message),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to fetch precipitation grid: {}", e);
                ForecastSnapshot {
                    grid: Some(grid),
                    periods,
                    precipitation: Vec::new(),
                    precipitation_available: false,
                    status: StageStatus::warning(format!("Precipitation grid failed: {}", e)),
                }
            }
        }
    }

    /// Last snapshot produced by `refresh`, if any.
    pub async fn latest(&self) -> Option<ForecastSnapshot> {
        self.current.read().await.clone()
    }

    pub async fn invalidate(&self) {
        self.client.clear_cache().await;
        *self.current.write().await = None;
    }
}

/// Forecast for the given location, falling back to the configured one.
/// Without any location the forecast is skipped and reads as "no rain".
pub async fn forecast_for(
    config: &ForecastConfig,
    lat: Option<f64>,
    lon: Option<f64>,
) -> ForecastSnapshot {
    let (Some(lat), Some(lon)) = (lat.or(config.latitude), lon.or(config.longitude)) else {
        tracing::warn!("No field location configured; skipping forecast");
        return ForecastSnapshot::skipped("No location; forecast skipped");
    };

    match ForecastClient::new(config.clone()) {
        Ok(client) => ForecastSync::new(client).refresh(lat, lon).await,
        Err(e) => {
            tracing::warn!("Failed to build forecast client: {}", e);
            ForecastSnapshot::failed(format!("Forecast client unavailable: {}", e))
        }
    }
}
