//! Configuration for the integration layer
//!
//! Provides centralized configuration for all components, loadable from a
//! TOML file. Every field has a default, so a partial file is fine.

use crate::gigs::DEFAULT_STORAGE_KEY;
use crate::messages::DEFAULT_HISTORY_LIMIT;
use crate::speech::{RecognitionConfig, SynthesisConfig};
use crate::ui::DisplayLimits;
use crate::{GigError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable pointing at a config file
pub const CONFIG_ENV_VAR: &str = "GIGVOICE_CONFIG";

const APP_DIR: &str = "gigvoice";

/// Where the gig listing is mirrored
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for stored documents; defaults to the platform data dir
    pub data_dir: Option<PathBuf>,

    /// Key holding the serialized gig array
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl StorageConfig {
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from(".").join(format!(".{}", APP_DIR)))
        })
    }
}

/// Chat log and listing view sizes
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Entries kept in the chat log
    pub history_limit: usize,

    /// Entries a chat view shows
    pub display_limit: usize,

    /// Gigs a listing view shows
    pub listing_display_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        let limits = DisplayLimits::default();
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            display_limit: limits.chat,
            listing_display_limit: limits.listings,
        }
    }
}

impl ChatConfig {
    pub fn display_limits(&self) -> DisplayLimits {
        DisplayLimits {
            chat: self.display_limit,
            listings: self.listing_display_limit,
        }
    }
}

/// Configuration for the complete application
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,

    pub recognition: RecognitionConfig,

    pub synthesis: SynthesisConfig,

    pub chat: ChatConfig,

    /// Whether to use speech recognition at all
    pub enable_voice_input: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            recognition: RecognitionConfig::default(),
            synthesis: SynthesisConfig::default(),
            chat: ChatConfig::default(),
            enable_voice_input: true,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| GigError::ConfigError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GigError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Load from `$GIGVOICE_CONFIG`, then the user config dir, else defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::new()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Store data in a specific directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = Some(dir.into());
        self
    }

    pub fn with_recognition(mut self, recognition: RecognitionConfig) -> Self {
        self.recognition = recognition;
        self
    }

    /// Disable speech recognition (text-only mode)
    pub fn without_voice_input(mut self) -> Self {
        self.enable_voice_input = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.key.trim().is_empty() {
            return Err(GigError::ConfigError("Storage key is required".into()));
        }
        if self.recognition.max_alternatives == 0 {
            return Err(GigError::ConfigError(
                "recognition.max_alternatives must be at least 1".into(),
            ));
        }
        if !(0.1..=10.0).contains(&self.synthesis.rate) {
            return Err(GigError::ConfigError(format!(
                "synthesis.rate {} is outside 0.1..=10",
                self.synthesis.rate
            )));
        }
        if !(0.0..=2.0).contains(&self.synthesis.pitch) {
            return Err(GigError::ConfigError(format!(
                "synthesis.pitch {} is outside 0..=2",
                self.synthesis.pitch
            )));
        }
        if !(0.0..=1.0).contains(&self.synthesis.volume) {
            return Err(GigError::ConfigError(format!(
                "synthesis.volume {} is outside 0..=1",
                self.synthesis.volume
            )));
        }
        if self.chat.history_limit == 0 {
            return Err(GigError::ConfigError(
                "chat.history_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
