use super::{
    moisture_deficit::MoistureDeficitRule, rain_offset::RainOffsetRule,
    vegetation_stress::VegetationStressRule, IrrigationPlan, IrrigationRule,
};
use crate::config::Config;
use crate::models::{CropStageParameters, FieldConditions, IrrigationDecision};
use serde::Serialize;

/// Decision plus the ids of the rules that changed the plan, in firing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleEvaluation {
    pub decision: IrrigationDecision,
    pub fired: Vec<&'static str>,
}

pub struct RulesEngine {
    rules: Vec<Box<dyn IrrigationRule>>,
}

impl RulesEngine {
    pub fn new() -> Self {
        // Order matters: later rules overwrite earlier ones.
        let rules: Vec<Box<dyn IrrigationRule>> = vec![
            Box::new(MoistureDeficitRule),
            Box::new(RainOffsetRule),
            Box::new(VegetationStressRule),
        ];

        Self { rules }
    }

    pub fn evaluate(
        &self,
        conditions: &FieldConditions,
        params: &CropStageParameters,
        cost_per_acre_inch: f64,
    ) -> RuleEvaluation {
        let mut plan = IrrigationPlan::default();
        let mut fired = Vec::new();

        for rule in &self.rules {
            if let Some(next) = rule.evaluate(conditions, params, plan) {
                tracing::debug!("Rule {} fired: {:?} -> {:?}", rule.id(), plan, next);
                plan = next;
                fired.push(rule.id());
            }
        }

        RuleEvaluation {
            decision: IrrigationDecision {
                needed: plan.needed,
                depth_inches: plan.depth_inches,
                cost_usd: plan.depth_inches * cost_per_acre_inch,
            },
            fired,
        }
    }

    /// Evaluate with stage overrides and the per-acre-inch cost from config.
    pub fn evaluate_with_config(&self, conditions: &FieldConditions, config: &Config) -> RuleEvaluation {
        let params = config.stage_parameters(&conditions.crop_stage);
        self.evaluate(conditions, &params, config.economics.cost_per_acre_inch)
    }

    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        self.rules.iter().map(|r| (r.id(), r.name())).collect()
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}
