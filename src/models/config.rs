use std::path::{Path, PathBuf};

use canvas_ops::DetectOptions;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AnalysisMode;
use crate::error::ConfigError;

/// Upper bound for `expansion_percentage`
pub const MAX_EXPANSION_PERCENTAGE: f64 = 50.0;

/// Upper bound for `scheduler.concurrency`
pub const MAX_CONCURRENCY: usize = 16;

/// Application configuration loaded from config.yaml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub processing: ProcessingSettings,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Options that gate which transforms run on each item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProcessingSettings {
    /// Apply the enhancement profile as the last step
    #[serde(default = "default_true", alias = "autoEnhance")]
    pub auto_enhance: bool,

    /// Pad the image before rotation and crop
    #[serde(default = "default_true", alias = "expandBeforeCrop")]
    pub expand_before_crop: bool,

    /// Canvas growth per dimension in percent, 0-50
    #[serde(default = "default_expansion", alias = "expansionPercentage")]
    pub expansion_percentage: f64,

    /// Editor overlay only, does not affect transforms
    #[serde(default, alias = "showGrid")]
    pub show_grid: bool,
}

fn default_true() -> bool {
    true
}

fn default_expansion() -> f64 {
    10.0
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            auto_enhance: true,
            expand_before_crop: true,
            expansion_percentage: default_expansion(),
            show_grid: false,
        }
    }
}

impl ProcessingSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.expansion_percentage;
        if !p.is_finite() || !(0.0..=MAX_EXPANSION_PERCENTAGE).contains(&p) {
            return Err(ConfigError::Invalid(format!(
                "expansion_percentage must be between 0 and {MAX_EXPANSION_PERCENTAGE}, got {p}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Items processed concurrently per chunk
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    3
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Hard item cap
    #[serde(default = "default_max_items", alias = "maxItems")]
    pub max_items: usize,
}

fn default_max_items() -> usize {
    100
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
        }
    }
}

/// Blob detector tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_threshold")]
    pub threshold: u8,

    #[serde(default = "default_grid_step", alias = "gridStep")]
    pub grid_step: u32,

    #[serde(default = "default_padding")]
    pub padding: u32,

    #[serde(default = "default_min_size", alias = "minSize")]
    pub min_size: u32,
}

fn default_threshold() -> u8 {
    200
}

fn default_grid_step() -> u32 {
    10
}

fn default_padding() -> u32 {
    10
}

fn default_min_size() -> u32 {
    20
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            grid_step: default_grid_step(),
            padding: default_padding(),
            min_size: default_min_size(),
        }
    }
}

impl DetectionConfig {
    pub fn options(&self) -> DetectOptions {
        DetectOptions::new()
            .threshold(self.threshold)
            .grid_step(self.grid_step)
            .padding(self.padding)
            .min_size(self.min_size)
    }
}

/// External analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Service URL. Analysis is disabled when unset.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable holding the bearer token
    #[serde(default = "default_api_key_env", alias = "apiKeyEnv")]
    pub api_key_env: String,

    #[serde(default)]
    pub mode: AnalysisMode,

    #[serde(default = "default_timeout_secs", alias = "timeoutSecs")]
    pub timeout_secs: u64,

    /// YAML file with stamp identification hints
    #[serde(default, alias = "knowledgeFile")]
    pub knowledge_file: Option<PathBuf>,
}

fn default_api_key_env() -> String {
    "IMGPRO_ANALYSIS_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key_env: default_api_key_env(),
            mode: AnalysisMode::default(),
            timeout_secs: default_timeout_secs(),
            knowledge_file: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`.
    ///
    /// No path, or a path that does not exist, yields the defaults. A file
    /// that exists but cannot be read, parsed or validated is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            tracing::info!("No config file given, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;

        tracing::info!(
            path = %path.display(),
            concurrency = config.scheduler.concurrency,
            max_items = config.batch.max_items,
            analysis = config.analysis.endpoint.is_some(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.processing.validate()?;

        let c = self.scheduler.concurrency;
        if !(1..=MAX_CONCURRENCY).contains(&c) {
            return Err(ConfigError::Invalid(format!(
                "scheduler.concurrency must be between 1 and {MAX_CONCURRENCY}, got {c}"
            )));
        }
        if self.batch.max_items == 0 {
            return Err(ConfigError::Invalid(
                "batch.max_items must be at least 1".to_string(),
            ));
        }
        if self.analysis.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "analysis.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
