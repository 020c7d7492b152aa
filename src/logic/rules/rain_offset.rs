use super::{IrrigationPlan, IrrigationRule};
use crate::models::{CropStageParameters, FieldConditions};

/// Forecast precipitation (inches) above which rain replaces irrigation.
pub const RAIN_OFFSET_QPF_INCHES: f64 = 0.2;

/// Enough rain is expected: clear the need flag. Depth is left as is.
pub struct RainOffsetRule;

impl IrrigationRule for RainOffsetRule {
    fn id(&self) -> &'static str {
        "rain_offset"
    }

    fn name(&self) -> &'static str {
        "Rain Offset"
    }

    fn evaluate(
        &self,
        conditions: &FieldConditions,
        _params: &CropStageParameters,
        plan: IrrigationPlan,
    ) -> Option<IrrigationPlan> {
        if conditions.rain_forecast && conditions.qpf_inches > RAIN_OFFSET_QPF_INCHES {
            Some(IrrigationPlan {
                needed: false,
                ..plan
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
    fn needs_both_rain_flag_and_qpf_above_threshold() {
        let params = CropStageParameters::default();
        let rule = RainOffsetRule;
        let plan = IrrigationPlan {
            needed: true,
            depth_inches: 0.3,
        };

        let wet = FieldConditions::new(50.0, "flowering").with_rain(true, 0.25);
        let fired = rule.evaluate(&wet, &params, plan).unwrap();
        assert!(!fired.needed);
        assert_eq!(fired.depth_inches, 0.3);

        let at_threshold = FieldConditions::new(50.0, "flowering").with_rain(true, 0.2);
        assert!(rule.evaluate(&at_threshold, &params, plan).is_none());

        let no_flag = FieldConditions::new(50.0, "flowering").with_rain(false, 1.0);
        assert!(rule.evaluate(&no_flag, &params, plan).is_none());
    }
}
