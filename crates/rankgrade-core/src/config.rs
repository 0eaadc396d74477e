//! Pipeline configuration, loaded from YAML. Every field has a default so a
//! partial file (or none at all) is valid.

use crate::model::MAX_SAMPLE_CHARS;
use crate::providers::judge::openai::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub version: u32,
    pub judge: JudgeConfig,
    pub temperatures: StageTemperatures,
    pub timeouts: StageTimeouts,
    pub integrity: IntegrityMode,
    /// Reference texts longer than this are truncated (characters).
    pub max_sample_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            judge: JudgeConfig::default(),
            temperatures: StageTemperatures::default(),
            timeouts: StageTimeouts::default(),
            integrity: IntegrityMode::default(),
            max_sample_chars: MAX_SAMPLE_CHARS,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct JudgeConfig {
    /// "openai" or "fake"
    pub provider: String,
    pub model: String,
    pub base_url: String,
    /// Generation returns up to 100 essays in one completion, so this is generous.
    pub max_tokens: u32,
    pub json_mode: bool,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: 8192,
            json_mode: false,
        }
    }
}

/// Sampling temperature per remote stage. Generation wants spread, the two
/// judgement stages want consistency.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StageTemperatures {
    pub generation: f32,
    pub ranking: f32,
    pub insertion: f32,
}

impl Default for StageTemperatures {
    fn default() -> Self {
        Self {
            generation: 0.9,
            ranking: 0.2,
            insertion: 0.2,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StageTimeouts {
    pub generation_secs: u64,
    pub ranking_secs: u64,
    pub insertion_secs: u64,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            generation_secs: 180,
            ranking_secs: 120,
            insertion_secs: 90,
        }
    }
}

impl StageTimeouts {
    pub fn generation(&self) -> Duration {
        Duration::from_secs(self.generation_secs)
    }

    pub fn ranking(&self) -> Duration {
        Duration::from_secs(self.ranking_secs)
    }

    pub fn insertion(&self) -> Duration {
        Duration::from_secs(self.insertion_secs)
    }

    /// Same deadline for every stage; handy in tests.
    pub fn uniform(secs: u64) -> Self {
        Self {
            generation_secs: secs,
            ranking_secs: secs,
            insertion_secs: secs,
        }
    }
}

/// How ranking output that is not an exact permutation is handled.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityMode {
    /// Fail the ranking stage.
    #[default]
    Strict,
    /// Repair the ranking and record warnings.
    Permissive,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(ConfigError(format!(
                "unsupported config version {} (supported: {})",
                self.version, SUPPORTED_CONFIG_VERSION
            )));
        }
        if self.max_sample_chars == 0 {
            return Err(ConfigError("max_sample_chars must be positive".into()));
        }
        let t = &self.timeouts;
        if t.generation_secs == 0 || t.ranking_secs == 0 || t.insertion_secs == 0 {
            return Err(ConfigError("stage timeouts must be at least 1 second".into()));
        }
        let temps = &self.temperatures;
        for (name, value) in [
            ("generation", temps.generation),
            ("ranking", temps.ranking),
            ("insertion", temps.insertion),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError(format!(
                    "temperature for {} must be within [0, 2], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    let cfg: PipelineConfig = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    let yaml = serde_yaml::to_string(&PipelineConfig::default())
        .map_err(|e| ConfigError(format!("failed to render sample config: {}", e)))?;
    std::fs::write(path, yaml)
        .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}
