use thiserror::Error;

#[derive(Error, Debug)]
pub enum CopilotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    #[error("opex_breakdown needs a month (month, period_end or period_start)")]
    MissingMonth,

    #[error("Table '{table}' is missing column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Invalid month: {0} (expected YYYY-MM)")]
    InvalidMonth(String),

    #[error("Invalid intent: {0}")]
    InvalidIntent(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CopilotError>;
