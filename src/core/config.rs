//! Configuration management for ideaflow.
//!
//! Handles loading and saving configuration from TOML files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::i18n::Language;
use super::retry::RetryConfig;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Generative API settings
    pub ai: AiConfig,

    /// Image pipeline settings
    pub pipeline: PipelineConfig,

    /// Persistence settings
    pub storage: StorageConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Workshop language
    pub language: Language,

    /// Default participant id for the CLI session
    pub user: Option<String>,
}

/// Generative API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Whether generation is enabled
    pub enabled: bool,

    /// Provider name (gemini)
    pub provider: String,

    /// Model for structured text generation
    pub text_model: String,

    /// Model for feedback analysis
    pub analysis_model: String,

    /// Model for image generation
    pub image_model: String,

    /// API base URL override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

/// Batch image pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Concurrent idea sketches per batch
    pub idea_batch_size: usize,

    /// Concurrent sketch-step images per batch
    pub sketch_batch_size: usize,

    /// Concurrent storyboard panels per batch
    pub storyboard_batch_size: usize,

    /// Total attempts per image
    pub max_attempts: u32,

    /// Delay between attempts, in milliseconds
    pub retry_delay_ms: u64,

    /// Backoff multiplier for further retries
    pub backoff_multiplier: f64,
}

/// Storage backend kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON documents and image files on disk
    #[default]
    File,
    /// Process-local, lost on exit
    Memory,
}

/// Persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend to use
    pub backend: StorageBackend,

    /// Data directory for the file backend (defaults to the platform data dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.ideaflow.toml` in current directory
    /// 2. `~/.config/ideaflow/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(".ideaflow.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = Self::config_dir() {
            let global_config = config_dir.join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the global config file.
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir().context("Could not determine config directory")?;
        std::fs::create_dir_all(&dir)?;

        let content = toml::to_string_pretty(self)?;
        std::fs::write(dir.join("config.toml"), content)?;

        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ideaflow"))
    }

    /// Get the data directory path (documents and images).
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage.data_dir.clone().or_else(|| dirs::data_dir().map(|d| d.join("ideaflow")))
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { language: Language::En, user: None }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "gemini".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            analysis_model: "gemini-2.5-pro".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            base_url: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            idea_batch_size: 4,
            sketch_batch_size: 2,
            storyboard_batch_size: 4,
            max_attempts: 2,
            retry_delay_ms: 1000,
            backoff_multiplier: 1.0,
        }
    }
}

impl PipelineConfig {
    /// Retry policy shared by every image pipeline.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::fixed(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
            .with_backoff(self.backoff_multiplier)
    }
}
