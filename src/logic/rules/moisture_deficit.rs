use super::{IrrigationPlan, IrrigationRule};
use crate::models::{CropStageParameters, FieldConditions};

/// Soil moisture (%) below which a dry field is irrigated.
pub const MOISTURE_DEFICIT_PCT: f64 = 30.0;

/// Dry soil with no rain coming: apply the stage's water requirement.
pub struct MoistureDeficitRule;

impl IrrigationRule for MoistureDeficitRule {
    fn id(&self) -> &'static str {
        "moisture_deficit"
    }

    fn name(&self) -> &'static str {
        "Moisture Deficit"
    }

    fn evaluate(
        &self,
        conditions: &FieldConditions,
        params: &CropStageParameters,
        _plan: IrrigationPlan,
    ) -> Option<IrrigationPlan> {
        if conditions.soil_moisture_pct < MOISTURE_DEFICIT_PCT && !conditions.rain_forecast {
            Some(IrrigationPlan {
                needed: true,
                depth_inches: params.water_requirement_inches,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_when_dry_and_no_rain() {
        let params = CropStageParameters::for_stage("vegetative");
        let rule = MoistureDeficitRule;
        let plan = IrrigationPlan::default();

        let dry = FieldConditions::new(20.0, "vegetative");
        let fired = rule.evaluate(&dry, &params, plan).unwrap();
        assert!(fired.needed);
        assert_eq!(fired.depth_inches, 0.3);

        assert!(rule.evaluate(&dry.clone().with_rain(true, 0.0), &params, plan).is_none());
        assert!(rule
            .evaluate(&FieldConditions::new(30.0, "vegetative"), &params, plan)
            .is_none());
    }
}
