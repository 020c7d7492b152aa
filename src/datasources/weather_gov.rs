use crate::config::ForecastConfig;
use crate::error::NetworkError;
use crate::models::{mm_to_inches, ForecastPeriod, GridReference, PrecipitationSample};
use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

pub type NetResult<T> = std::result::Result<T, NetworkError>;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Client for the National Weather Service point-forecast API.
pub struct ForecastClient {
    client: reqwest::Client,
    config: ForecastConfig,
    cancel: CancellationToken,
    grid_cache: RwLock<HashMap<(i64, i64), GridReference>>,
}

// api.weather.gov response structures
#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointsProperties {
    grid_x: i64,
    grid_y: i64,
    grid_id: String,
    forecast: String,
    forecast_grid_data: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    periods: Vec<NwsPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NwsPeriod {
    start_time: String,
    temperature: f64,
    #[serde(default)]
    detailed_forecast: String,
}

#[derive(Debug, Deserialize)]
struct GridDataResponse {
    properties: GridDataProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridDataProperties {
    quantitative_precipitation: NwsGridLayer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NwsGridLayer {
    #[serde(default)]
    uom: Option<String>,
    values: Vec<NwsGridValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NwsGridValue {
    valid_time: String,
    value: Option<f64>,
}

impl ForecastClient {
    pub fn new(config: ForecastConfig) -> NetResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| NetworkError::Unreachable(format!("HTTP client setup: {}", e)))?;

        Ok(Self {
            client,
            config,
            cancel: CancellationToken::new(),
            grid_cache: RwLock::new(HashMap::new()),
        })
    }

    /// Abort in-flight and future requests when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Look up the grid cell for a coordinate. Results are cached per
    /// coordinate rounded to four decimals.
    pub async fn resolve_grid(&self, lat: f64, lon: f64) -> NetResult<GridReference> {
        let key = cache_key(lat, lon);
        if let Some(grid) = self.grid_cache.read().await.get(&key) {
            tracing::debug!("Grid cache hit for {:.4},{:.4}", lat, lon);
            return Ok(grid.clone());
        }

        let url = format!(
            "{}/points/{:.4},{:.4}",
            self.config.base_url.trim_end_matches('/'),
            lat,
            lon
        );
        let response: PointsResponse = self.get_json(&url).await?;
        let grid = convert_points(response);
        tracing::info!(
            "Resolved {:.4},{:.4} to grid {} {},{}",
            lat,
            lon,
            grid.office,
            grid.grid_x,
            grid.grid_y
        );

        self.grid_cache.write().await.insert(key, grid.clone());
        Ok(grid)
    }

    pub async fn fetch_period_forecast(&self, grid: &GridReference) -> NetResult<Vec<ForecastPeriod>> {
        let response: ForecastResponse = self.get_json(&grid.forecast_url).await?;
        convert_periods(response)
    }

    pub async fn fetch_precipitation_grid(
        &self,
        grid: &GridReference,
    ) -> NetResult<Vec<PrecipitationSample>> {
        let response: GridDataResponse = self.get_json(&grid.forecast_grid_url).await?;
        convert_grid_data(response)
    }

    pub async fn clear_cache(&self) {
        self.grid_cache.write().await.clear();
    }

    /// Test connection to the forecast service
    pub async fn test_connection(&self) -> NetResult<bool> {
        let response = self
            .client
            .get(self.config.base_url.as_str())
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> NetResult<T> {
        let mut attempt = 0;
        loop {
            match self.get_json_once(url).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        "Forecast request to {} failed ({}); retrying in {:?}",
                        url,
                        e,
                        delay
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(NetworkError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: &str) -> NetResult<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(NetworkError::Cancelled),
            result = self.request(url) => result,
        }
    }

    async fn request<T: DeserializeOwned>(&self, url: &str) -> NetResult<T> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/geo+json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NetworkError::BadResponse {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| NetworkError::Malformed(e.to_string()))
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.config.backoff_ms.saturating_mul(factor)).min(MAX_BACKOFF)
    }
}

fn cache_key(lat: f64, lon: f64) -> (i64, i64) {
    ((lat * 1e4).round() as i64, (lon * 1e4).round() as i64)
}

fn convert_points(response: PointsResponse) -> GridReference {
    let p = response.properties;
    GridReference {
        grid_x: p.grid_x,
        grid_y: p.grid_y,
        office: p.grid_id,
        forecast_url: p.forecast,
        forecast_grid_url: p.forecast_grid_data,
    }
}

fn convert_periods(response: ForecastResponse) -> NetResult<Vec<ForecastPeriod>> {
    response
        .properties
        .periods
        .into_iter()
        .map(|p| {
            let start = parse_timestamp(&p.start_time)?;
            Ok(ForecastPeriod::new(start, p.temperature, p.detailed_forecast))
        })
        .collect()
}

fn convert_grid_data(response: GridDataResponse) -> NetResult<Vec<PrecipitationSample>> {
    let layer = response.properties.quantitative_precipitation;
    let in_inches = layer
        .uom
        .as_deref()
        .map(|u| u.ends_with(":in"))
        .unwrap_or(false);

    layer
        .values
        .into_iter()
        .map(|v| {
            // validTime is "<start>/<ISO duration>"; only the start is used
            let start = v.valid_time.split('/').next().unwrap_or_default();
            Ok(PrecipitationSample {
                valid_time: parse_timestamp(start)?,
                qpf_inches: v
                    .value
                    .map(|q| if in_inches { q } else { mm_to_inches(q) }),
            })
        })
        .collect()
}

fn parse_timestamp(s: &str) -> NetResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| NetworkError::Malformed(format!("bad timestamp '{}': {}", s, e)))
}
