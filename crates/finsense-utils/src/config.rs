//! Configuration management utilities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    /// Parse an environment name, falling back to development for unknown values
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" => Self::Test,
            _ => Self::Development,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        };
        f.write_str(name)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: Environment,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "finsense".to_string(),
            environment: Environment::Development,
        }
    }
}

impl AppConfig {
    /// Build the configuration from `FINSENSE_ENV`
    pub fn from_env() -> Self {
        let environment = std::env::var("FINSENSE_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or_default();

        Self {
            environment,
            ..Self::default()
        }
    }

    /// Default log filter for this environment
    pub fn default_log_directive(&self) -> &'static str {
        match self.environment {
            Environment::Production => "warn,finsense_market=info",
            Environment::Development => "info",
            Environment::Test => "debug",
        }
    }
}
