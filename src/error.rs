use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimingError {
    #[error("Unknown timing tag: {0}")]
    UnknownTag(String),

    #[error("Invalid timing document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TimingError>;
