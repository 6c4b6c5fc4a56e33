use std::env;
use std::fmt;
use std::path::PathBuf;

const DEFAULT_DATA_PATH: &str = "dualfit_deals.json";

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let data_path = env::var("APP_DATA_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());
        let storage = StorageConfig::new(data_path)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            storage,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Location of the JSON deal store.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_path: PathBuf,
}

impl StorageConfig {
    pub fn new(raw: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ConfigError::EmptyDataPath);
        }
        Ok(Self {
            data_path: PathBuf::from(raw.trim()),
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyDataPath,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyDataPath => write!(f, "APP_DATA_PATH must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}
