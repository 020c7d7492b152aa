use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_SENSOR_TYPE: &str = "Unknown";

/// A soil moisture probe reading. Moisture levels are in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorMoistureRecord {
    pub sensor_id: i64,
    pub date: NaiveDate,
    pub depth_inches: f64,
    pub moisture_level: f64,
    pub sensor_type: String,
}

/// Mean moisture at one depth on one date, across sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoistureCell {
    pub date: NaiveDate,
    pub depth_inches: f64,
    pub moisture_level: f64,
    pub sample_count: usize,
}

/// Sensor → hybrid mapping from an uploaded hybrid table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridAssignment {
    pub sensor_id: i64,
    pub company_hybrid: String,
}
