use thiserror::Error;
use tripleflow_core::EngineError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Dataset error at line {line}: {message}")]
    Dataset { line: usize, message: String },

    #[error("Invalid query plan: {0}")]
    InvalidPlan(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub(crate) fn dataset(line: usize, message: impl Into<String>) -> Self {
        AppError::Dataset {
            line,
            message: message.into(),
        }
    }
}
