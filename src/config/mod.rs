//! Configuration loading and management

use crate::core::error::{ConfigError, MarketError, MarketResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Environment variable selecting the runtime environment
pub const ENV_VAR: &str = "MARKET_ENV";

/// Environment variable overriding the database URL
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Runtime environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::InvalidValue {
                field: "environment".to_string(),
                value: other.to_string(),
                message: "expected development, test or production".to_string(),
            }),
        }
    }
}

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL outside the test environment
    pub url: String,

    /// Connection URL used when the environment is `test`
    pub test_url: String,

    /// Upper bound on pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql:///market".to_string(),
            test_url: "postgresql:///market_test".to_string(),
            max_connections: 5,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Recommendation pipeline settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Cap on ranked candidates returned; unlimited when absent
    pub max_candidates: Option<u32>,
}

/// Complete configuration
///
/// Every section is optional in YAML; missing values take their defaults.
///
/// ```yaml
/// environment: production
/// database:
///   url: postgresql://db.internal/market
///   max_connections: 10
/// logging:
///   filter: market=debug,info
/// recommendations:
///   max_candidates: 50
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub recommendations: RecommendationConfig,
}

impl MarketConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> MarketResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            MarketError::Config(ConfigError::Parse {
                file: Some(path.display().to_string()),
                message: e.to_string(),
            })
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> MarketResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    ///
    /// `MARKET_ENV` replaces the environment and `DATABASE_URL` replaces
    /// `database.url`. Empty values are ignored.
    pub fn apply_overrides<F>(mut self, lookup: F) -> MarketResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(env) = present(ENV_VAR) {
            self.environment = env.parse()?;
        }
        if let Some(url) = present(DATABASE_URL_VAR) {
            self.database.url = url;
        }

        Ok(self)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> MarketResult<Self> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Connection URL for the configured environment
    pub fn database_url(&self) -> &str {
        match self.environment {
            Environment::Test => &self.database.test_url,
            _ => &self.database.url,
        }
    }
}
