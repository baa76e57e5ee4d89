//! Configuration for analyst model calls

use crate::error::{AnalystError, Result};
use analyst_llm::GenerationSettings;
use serde::{Deserialize, Serialize};

/// Model settings shared by analysts and the screener
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystConfig {
    /// Model identifier
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 2048,
            temperature: 0.3,
        }
    }
}

impl AnalystConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalystConfigBuilder {
        AnalystConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AnalystError::InvalidConfiguration(
                "model must not be empty".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(AnalystError::InvalidConfiguration(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AnalystError::InvalidConfiguration(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }

        Ok(())
    }

    /// Settings sent with every completion
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        }
    }
}

/// Builder for AnalystConfig
#[derive(Debug, Default)]
pub struct AnalystConfigBuilder {
    model: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
}

impl AnalystConfigBuilder {
    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Read the model from `OPENAI_MODEL` if set
    pub fn from_env_model(mut self) -> Self {
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            self.model = Some(model);
        }
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AnalystConfig> {
        let defaults = AnalystConfig::default();

        let config = AnalystConfig {
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
        };

        config.validate()?;
        Ok(config)
    }
}
