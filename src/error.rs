use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::opportunity::{
    AssessmentError, DealServiceError, RepositoryError, SolutionMapError,
};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Repository(RepositoryError),
    Deal(DealServiceError),
    SolutionMap(SolutionMapError),
    Assessment(AssessmentError),
    /// Input rejected at the command boundary before reaching the engine.
    Input(String),
}

impl AppError {
    /// Taxonomy code for domain rejections, if the error carries one.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AppError::SolutionMap(err) => Some(err.code()),
            AppError::Assessment(err) => Some(err.code()),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Repository(err) => write!(f, "storage error: {}", err),
            AppError::Deal(err) => write!(f, "deal error: {}", err),
            AppError::SolutionMap(err) => write!(f, "[{}] {}", err.code(), err),
            AppError::Assessment(err) => write!(f, "[{}] {}", err.code(), err),
            AppError::Input(message) => write!(f, "invalid input: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Repository(err) => Some(err),
            AppError::Deal(err) => Some(err),
            AppError::SolutionMap(err) => Some(err),
            AppError::Assessment(err) => Some(err),
            AppError::Input(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Repository(value)
    }
}

impl From<DealServiceError> for AppError {
    fn from(value: DealServiceError) -> Self {
        Self::Deal(value)
    }
}

impl From<SolutionMapError> for AppError {
    fn from(value: SolutionMapError) -> Self {
        Self::SolutionMap(value)
    }
}

impl From<AssessmentError> for AppError {
    fn from(value: AssessmentError) -> Self {
        Self::Assessment(value)
    }
}
