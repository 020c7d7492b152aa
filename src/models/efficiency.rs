use serde::{Deserialize, Serialize};

/// Water usage and yield for one sensor, uploaded or simulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub sensor_id: i64,
    pub hybrid: Option<String>,
    pub field_location: Option<String>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub water_usage_gallons: f64,
    pub yield_units: f64,
    pub cost_per_gallon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRecord {
    pub sensor_id: i64,
    pub hybrid: Option<String>,
    pub water_usage_gallons: f64,
    pub yield_units: f64,
    pub cost_per_gallon: f64,
    pub total_water_cost_usd: f64,
    pub gross_revenue_usd: f64,
    /// Economic water use efficiency. Negative when water cost exceeds revenue.
    pub ewue: f64,
    /// Irrigation water use efficiency. Negative when yield is below baseline.
    pub iwue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridEfficiency {
    pub hybrid: String,
    pub sensor_count: usize,
    pub mean_ewue: f64,
    pub mean_iwue: f64,
    pub total_water_cost_usd: f64,
}
