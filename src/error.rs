use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChordError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Layout Validation Error: {0}")]
    Validation(String),

    #[error("Parse Error: {0}")]
    Parse(String),
}

pub type CfResult<T> = Result<T, ChordError>;
