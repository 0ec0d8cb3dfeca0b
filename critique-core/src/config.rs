//! Configuration management for critique
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (CRITIQUE_*)
//! 3. Config file (~/.config/critique/config.toml)
//! 4. Default values

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default chat-completions endpoint (Z.AI coding endpoint)
pub const DEFAULT_BASE_URL: &str = "https://api.z.ai/api/coding/paas/v4";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "GLM-4.7";

/// Default ceiling on model/tool round-trips per review
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Remote-model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the OpenAI-compatible chat endpoint
    pub base_url: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Maximum model/tool round-trips before a review is forcibly terminated
    pub max_iterations: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Remote-model configuration
    pub model: ModelConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/critique/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("critique").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - CRITIQUE_BASE_URL: Chat endpoint base URL
    /// - CRITIQUE_MODEL: Model identifier
    /// - CRITIQUE_MAX_ITERATIONS: Review round-trip ceiling
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var("CRITIQUE_BASE_URL") {
            self.model.base_url = base_url;
        }

        if let Ok(model) = std::env::var("CRITIQUE_MODEL") {
            self.model.model = model;
        }

        if let Ok(max) = std::env::var("CRITIQUE_MAX_ITERATIONS") {
            if let Ok(max) = max.parse() {
                self.model.max_iterations = max;
            }
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, base_url: Option<String>, model: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.model.base_url = url;
        }

        if let Some(m) = model {
            self.model.model = m;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(base_url: Option<String>, model: Option<String>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(base_url, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model.model, DEFAULT_MODEL);
        assert_eq!(config.model.max_iterations, DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_cli_overrides(
            Some("https://example.com/v1".to_string()),
            Some("custom-model".to_string()),
        );

        assert_eq!(config.model.base_url, "https://example.com/v1");
        assert_eq!(config.model.model, "custom-model");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[model]
base_url = "https://api.example.com/v4"
model = "GLM-4.7"
max_iterations = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.model.base_url, "https://api.example.com/v4");
        assert_eq!(config.model.model, "GLM-4.7");
        assert_eq!(config.model.max_iterations, 5);
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
[model]
model = "GLM-4-flash"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        // base_url should use default
        assert_eq!(config.model.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model.model, "GLM-4-flash");
        assert_eq!(config.model.max_iterations, DEFAULT_MAX_ITERATIONS);
    }
}
