use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropStage {
    Germination,
    Vegetative,
    Flowering,
    Maturation,
}

impl CropStage {
    pub const ALL: [CropStage; 4] = [
        CropStage::Germination,
        CropStage::Vegetative,
        CropStage::Flowering,
        CropStage::Maturation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CropStage::Germination => "germination",
            CropStage::Vegetative => "vegetative",
            CropStage::Flowering => "flowering",
            CropStage::Maturation => "maturation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "germination" => Some(CropStage::Germination),
            "vegetative" => Some(CropStage::Vegetative),
            "flowering" => Some(CropStage::Flowering),
            "maturation" => Some(CropStage::Maturation),
            _ => None,
        }
    }

    pub fn parameters(&self) -> CropStageParameters {
        match self {
            // Capacities are 30/40/50/35 mm of usable soil water
            CropStage::Germination => CropStageParameters::new(0.2, 0.3, 1.18),
            CropStage::Vegetative => CropStageParameters::new(0.3, 0.5, 1.57),
            CropStage::Flowering => CropStageParameters::new(0.4, 0.5, 1.97),
            CropStage::Maturation => CropStageParameters::new(0.2, 0.3, 1.38),
        }
    }
}

impl std::fmt::Display for CropStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropStageParameters {
    pub water_requirement_inches: f64,
    pub ndvi_threshold: f64,
    pub soil_capacity_inches: f64,
}

impl CropStageParameters {
    pub const fn new(
        water_requirement_inches: f64,
        ndvi_threshold: f64,
        soil_capacity_inches: f64,
    ) -> Self {
        Self {
            water_requirement_inches,
            ndvi_threshold,
            soil_capacity_inches,
        }
    }

    /// Parameters for a free-text stage name. Unknown names get the defaults.
    pub fn for_stage(stage_name: &str) -> Self {
        CropStage::from_str(stage_name)
            .map(|s| s.parameters())
            .unwrap_or_default()
    }
}

impl Default for CropStageParameters {
    /// 0.3" requirement, 0.5 NDVI threshold, 20 mm capacity.
    fn default() -> Self {
        Self::new(0.3, 0.5, 0.79)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_stage_from_str_is_case_insensitive() {
        assert_eq!(CropStage::from_str("Vegetative"), Some(CropStage::Vegetative));
        assert_eq!(CropStage::from_str("FLOWERING"), Some(CropStage::Flowering));
        assert_eq!(CropStage::from_str(" maturation "), Some(CropStage::Maturation));
        assert_eq!(CropStage::from_str("tasseling"), None);
        assert_eq!(CropStage::from_str(""), None);
    }

    #[test]
    fn crop_stage_round_trip() {
        for stage in CropStage::ALL {
            assert_eq!(CropStage::from_str(stage.as_str()), Some(stage));
        }
    }

    #[test]
    fn unknown_stage_gets_defaults() {
        let params = CropStageParameters::for_stage("ripening");
        assert_eq!(params.water_requirement_inches, 0.3);
        assert_eq!(params.ndvi_threshold, 0.5);
        assert_eq!(params.soil_capacity_inches, 0.79);
    }

    #[test]
    fn stage_table_values() {
        let g = CropStage::Germination.parameters();
        assert_eq!((g.water_requirement_inches, g.ndvi_threshold), (0.2, 0.3));
        let f = CropStage::Flowering.parameters();
        assert_eq!(f.water_requirement_inches, 0.4);
        assert_eq!(f.soil_capacity_inches, 1.97);
    }
}
