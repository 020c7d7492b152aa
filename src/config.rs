use crate::error::{MaxWaterError, Result};
use crate::models::{CropStage, CropStageParameters};
use dialoguer::Input;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_FORECAST_BASE_URL: &str = "https://api.weather.gov";
pub const DEFAULT_USER_AGENT: &str = "maxwater (irrigation-advisor@example.com)";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub economics: EconomicsConfig,
    /// Per-stage overrides of the built-in crop table, keyed by stage name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub crop_stages: HashMap<String, CropStageParameters>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForecastConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

fn default_base_url() -> String {
    DEFAULT_FORECAST_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    500
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            latitude: None,
            longitude: None,
        }
    }
}

/// Economic constants used by the rule engine and efficiency metrics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EconomicsConfig {
    #[serde(default = "default_acre_inch_to_gallons")]
    pub acre_inch_to_gallons: f64,
    #[serde(default = "default_baseline_yield")]
    pub baseline_yield: f64,
    #[serde(default = "default_market_price")]
    pub market_price_per_unit: f64,
    #[serde(default = "default_cost_per_acre_inch")]
    pub cost_per_acre_inch: f64,
}

fn default_acre_inch_to_gallons() -> f64 {
    102_790.4
}

fn default_baseline_yield() -> f64 {
    2.0
}

fn default_market_price() -> f64 {
    2.0
}

fn default_cost_per_acre_inch() -> f64 {
    10.0
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            acre_inch_to_gallons: default_acre_inch_to_gallons(),
            baseline_yield: default_baseline_yield(),
            market_price_per_unit: default_market_price(),
            cost_per_acre_inch: default_cost_per_acre_inch(),
        }
    }
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(MaxWaterError::Config(format!(
                "Config file not found at {:?}. Run `maxwater init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| MaxWaterError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&config_str)
    }

    /// Parse YAML after substituting `${VAR}` references from the environment.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| MaxWaterError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.forecast.user_agent.trim().is_empty() {
            return Err(MaxWaterError::Config(
                "forecast.user_agent must identify the caller".into(),
            ));
        }
        if self.economics.cost_per_acre_inch < 0.0 {
            return Err(MaxWaterError::Config(
                "economics.cost_per_acre_inch must not be negative".into(),
            ));
        }
        for name in self.crop_stages.keys() {
            if CropStage::from_str(name).is_none() {
                return Err(MaxWaterError::Config(format!(
                    "unknown crop stage '{}' in crop_stages",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("maxwater").join("config.yaml");
            if xdg_config.exists() {
                return Ok(xdg_config);
            }
        }

        Self::default_config_path()
    }

    /// Returns true if a config file can be found in any standard location.
    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/maxwater/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MaxWaterError::Config("Cannot determine config directory".into()))?
            .join("maxwater");
        Ok(config_dir.join("config.yaml"))
    }

    /// Crop parameters for a stage name, honoring configured overrides.
    /// Unknown names resolve to the default parameters.
    pub fn stage_parameters(&self, stage_name: &str) -> CropStageParameters {
        match CropStage::from_str(stage_name) {
            Some(stage) => self
                .crop_stages
                .iter()
                .find(|(name, _)| CropStage::from_str(name) == Some(stage))
                .map(|(_, params)| *params)
                .unwrap_or_else(|| stage.parameters()),
            None => CropStageParameters::default(),
        }
    }

    /// Run interactive setup prompts and write config to disk.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up maxwater.");
        println!();

        println!("Forecast service");
        let user_agent: String = Input::new()
            .with_prompt("  User-Agent (app name and contact email)")
            .default(DEFAULT_USER_AGENT.into())
            .interact_text()
            .map_err(|e| MaxWaterError::Config(format!("Input error: {}", e)))?;

        let latitude: f64 = Input::new()
            .with_prompt("  Field latitude")
            .default(40.8136)
            .interact_text()
            .map_err(|e| MaxWaterError::Config(format!("Input error: {}", e)))?;

        let longitude: f64 = Input::new()
            .with_prompt("  Field longitude")
            .default(-96.7026)
            .interact_text()
            .map_err(|e| MaxWaterError::Config(format!("Input error: {}", e)))?;

        println!();
        println!("Economics");
        let cost_per_acre_inch: f64 = Input::new()
            .with_prompt("  Irrigation cost per acre-inch (USD)")
            .default(default_cost_per_acre_inch())
            .interact_text()
            .map_err(|e| MaxWaterError::Config(format!("Input error: {}", e)))?;

        let market_price_per_unit: f64 = Input::new()
            .with_prompt("  Market price per yield unit (USD)")
            .default(default_market_price())
            .interact_text()
            .map_err(|e| MaxWaterError::Config(format!("Input error: {}", e)))?;

        println!();

        let config = Config {
            forecast: ForecastConfig {
                user_agent,
                latitude: Some(latitude),
                longitude: Some(longitude),
                ..ForecastConfig::default()
            },
            economics: EconomicsConfig {
                cost_per_acre_inch,
                market_price_per_unit,
                ..EconomicsConfig::default()
            },
            crop_stages: HashMap::new(),
        };
        config.validate()?;

        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| MaxWaterError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# maxwater configuration\n# Generated by `maxwater init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        let Ok(re) = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") else {
            return result;
        };

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }
}
