//! Configuration Management

use crate::analyzer::patterns::PatternConfig;
use crate::analyzer::segmenter::SegmenterConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Capture settings
    pub capture: CaptureConfig,
    /// Analysis settings
    pub analysis: AnalysisConfig,
    /// LLM settings
    pub llm: LlmConfig,
    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Seconds between screenshots
    pub screenshot_interval_secs: u64,
    /// Ring buffer size between the input hook and the collector
    pub ring_buffer_size: usize,
    /// Flush the event log after this many buffered events
    pub flush_every_events: usize,
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum repetitions of one action before it is flagged
    pub repeat_threshold: usize,
    /// Count label-less clicks by pointer position
    pub count_unlabeled_clicks: bool,
    /// Split key runs on idle gaps longer than this (ms, 0 = disabled)
    pub max_key_gap_ms: u64,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama server base URL
    pub base_url: String,
    /// Model to prompt
    pub model: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
    /// Retry attempts per request
    pub max_retries: u32,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data root override; `~/.deskflow/data` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            screenshot_interval_secs: 2,
            ring_buffer_size: 8192,
            flush_every_events: 50,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            repeat_threshold: 3,
            count_unlabeled_clicks: false,
            max_key_gap_ms: 0,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: crate::llm::DEFAULT_BASE_URL.to_string(),
            model: crate::llm::DEFAULT_MODEL.to_string(),
            timeout_secs: 300,
            max_retries: 3,
        }
    }
}

impl AnalysisConfig {
    /// Segmenter view of this config.
    pub fn segmenter(&self) -> SegmenterConfig {
        SegmenterConfig {
            max_key_gap_ms: (self.max_key_gap_ms > 0).then_some(self.max_key_gap_ms),
        }
    }

    /// Pattern miner view of this config.
    pub fn patterns(&self) -> PatternConfig {
        PatternConfig {
            repeat_threshold: self.repeat_threshold,
            count_unlabeled_clicks: self.count_unlabeled_clicks,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.capture.ring_buffer_size == 0
            || (self.capture.ring_buffer_size & (self.capture.ring_buffer_size - 1)) != 0
        {
            return Err(crate::Error::Config(format!(
                "ring_buffer_size must be a power of 2, got {}",
                self.capture.ring_buffer_size
            )));
        }
        if self.capture.screenshot_interval_secs == 0 {
            return Err(crate::Error::Config(
                "screenshot_interval_secs must be > 0".to_string(),
            ));
        }
        if self.capture.flush_every_events == 0 {
            return Err(crate::Error::Config(
                "flush_every_events must be > 0".to_string(),
            ));
        }
        if self.analysis.repeat_threshold == 0 {
            return Err(crate::Error::Config(
                "repeat_threshold must be >= 1".to_string(),
            ));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(crate::Error::Config("base_url must not be empty".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(crate::Error::Config("model must not be empty".to_string()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(crate::Error::Config("timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".deskflow").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Resolved data root.
    pub fn data_root(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(crate::store::DataStore::default_root)
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
