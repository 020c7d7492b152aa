use serde::{Deserialize, Serialize};

/// Output of the irrigation rule engine. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IrrigationDecision {
    pub needed: bool,
    pub depth_inches: f64,
    pub cost_usd: f64,
}

/// Inputs to a single irrigation recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConditions {
    pub soil_moisture_pct: f64,
    pub crop_stage: String,
    pub rain_forecast: bool,
    pub qpf_inches: f64,
    pub ndvi: Option<f64>,
}

impl FieldConditions {
    pub fn new(soil_moisture_pct: f64, crop_stage: impl Into<String>) -> Self {
        Self {
            soil_moisture_pct,
            crop_stage: crop_stage.into(),
            rain_forecast: false,
            qpf_inches: 0.0,
            ndvi: None,
        }
    }

    pub fn with_rain(mut self, rain_forecast: bool, qpf_inches: f64) -> Self {
        self.rain_forecast = rain_forecast;
        self.qpf_inches = qpf_inches;
        self
    }

    pub fn with_ndvi(mut self, ndvi: f64) -> Self {
        self.ndvi = Some(ndvi);
        self
    }
}
