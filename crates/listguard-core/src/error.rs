//! Error types for listguard.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid rule set for {category}: {message}")]
    InvalidRules { category: String, message: String },

    #[error("Escalation error: {0}")]
    Escalation(String),

    #[error("Escalation timed out after {0}ms")]
    EscalationTimeout(u64),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
