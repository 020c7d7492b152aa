pub mod engine;
pub mod moisture_deficit;
pub mod rain_offset;
pub mod vegetation_stress;

pub use engine::{RuleEvaluation, RulesEngine};

use crate::models::{CropStageParameters, FieldConditions, IrrigationDecision};

/// Running state threaded through the rule chain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IrrigationPlan {
    pub needed: bool,
    pub depth_inches: f64,
}

/// Trait for irrigation rules. Rules run in a fixed order and each may
/// overwrite the plan produced by the ones before it.
pub trait IrrigationRule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Return the updated plan, or `None` when the rule's condition doesn't hold
    fn evaluate(
        &self,
        conditions: &FieldConditions,
        params: &CropStageParameters,
        plan: IrrigationPlan,
    ) -> Option<IrrigationPlan>;
}

/// Recommend irrigation with the built-in stage table.
pub fn recommend(
    soil_moisture_pct: f64,
    crop_stage: &str,
    rain_forecast: bool,
    qpf_inches: f64,
    ndvi: Option<f64>,
    cost_per_acre_inch: f64,
) -> IrrigationDecision {
    let mut conditions =
        FieldConditions::new(soil_moisture_pct, crop_stage).with_rain(rain_forecast, qpf_inches);
    conditions.ndvi = ndvi;

    RulesEngine::new()
        .evaluate(
            &conditions,
            &CropStageParameters::for_stage(crop_stage),
            cost_per_acre_inch,
        )
        .decision
}
