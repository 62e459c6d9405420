use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Unknown condition '{0}'")]
    UnknownCondition(String),

    #[error("Source unavailable for {product} on {date}: {message}")]
    SourceUnavailable {
        product: String,
        date: NaiveDate,
        message: String,
    },

    #[error("Decode failure: {0}")]
    Decode(String),

    #[error("Variable '{0}' not present in dataset")]
    MissingVariable(String),

    #[error("No usable value for '{variable}' at the selected cell")]
    MissingValue { variable: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
