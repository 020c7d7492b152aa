use super::{IrrigationPlan, IrrigationRule};
use crate::models::{CropStageParameters, FieldConditions};

/// Low NDVI for the stage: irrigate at least the stage requirement.
///
/// Runs last, so it can re-enable irrigation that the rain offset cleared.
pub struct VegetationStressRule;

impl IrrigationRule for VegetationStressRule {
    fn id(&self) -> &'static str {
        "vegetation_stress"
    }

    fn name(&self) -> &'static str {
        "Vegetation Stress"
    }

    fn evaluate(
        &self,
        conditions: &FieldConditions,
        params: &CropStageParameters,
        plan: IrrigationPlan,
    ) -> Option<IrrigationPlan> {
        let ndvi = conditions.ndvi?;
        if ndvi < params.ndvi_threshold {
            Some(IrrigationPlan {
                needed: true,
                depth_inches: plan.depth_inches.max(params.water_requirement_inches),
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
    fn missing_ndvi_never_fires() {
        let params = CropStageParameters::for_stage("flowering");
        let conditions = FieldConditions::new(10.0, "flowering");
        assert!(VegetationStressRule
            .evaluate(&conditions, &params, IrrigationPlan::default())
            .is_none());
    }

    #[test]
    fn keeps_deeper_existing_depth() {
        let params = CropStageParameters::for_stage("germination");
        let conditions = FieldConditions::new(50.0, "germination").with_ndvi(0.1);
        let plan = IrrigationPlan {
            needed: false,
            depth_inches: 0.5,
        };
        let fired = VegetationStressRule.evaluate(&conditions, &params, plan).unwrap();
        assert!(fired.needed);
        assert_eq!(fired.depth_inches, 0.5);
    }

    #[test]
    fn threshold_is_strict() {
        let params = CropStageParameters::for_stage("vegetative");
        let conditions = FieldConditions::new(50.0, "vegetative").with_ndvi(0.5);
        assert!(VegetationStressRule
            .evaluate(&conditions, &params, IrrigationPlan::default())
            .is_none());
    }
}
