use crate::error::MaxWaterError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostKind {
    Irrigation,
    Fertilizer,
}

impl CostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostKind::Irrigation => "irrigation",
            CostKind::Fertilizer => "fertilizer",
        }
    }
}

impl std::fmt::Display for CostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One farm's usage on one date, priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub farm_id: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub cost_usd: f64,
}

/// Per-farm total for one cost kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmCostTotal {
    pub farm_id: String,
    pub amount: f64,
    pub cost_usd: f64,
}

/// Irrigation + fertilizer cost for one farm on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmDateCost {
    pub farm_id: String,
    pub date: NaiveDate,
    pub irrigation_cost_usd: f64,
    pub fertilizer_cost_usd: f64,
    pub total_cost_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantingRecord {
    pub farm_id: String,
    pub planting_date: Option<NaiveDate>,
    pub company_hybrid: String,
    pub seeding_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridCostRollup {
    pub company_hybrid: String,
    pub total_cost_usd: f64,
}

/// Result of the hybrid rollup. Missing planting data is a state, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HybridRollup {
    Available { hybrids: Vec<HybridCostRollup> },
    NoData { reason: String },
}

impl Default for HybridRollup {
    fn default() -> Self {
        HybridRollup::NoData {
            reason: "No cost data".into(),
        }
    }
}

impl HybridRollup {
    /// `NoData` carrying a join failure's message.
    pub fn unavailable(err: &MaxWaterError) -> Self {
        let reason = match err {
            MaxWaterError::DataJoin(reason) => reason.clone(),
            other => other.to_string(),
        };
        HybridRollup::NoData { reason }
    }

    pub fn hybrids(&self) -> &[HybridCostRollup] {
        match self {
            HybridRollup::Available { hybrids } => hybrids,
            HybridRollup::NoData { .. } => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, HybridRollup::Available { .. })
    }
}
