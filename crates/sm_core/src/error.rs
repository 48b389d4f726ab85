use thiserror::Error;

/// Programming-contract violations.
///
/// These are caller bugs (odd team count, unknown formation key, scheduling
/// past the seasonal cutoff) and are never caught or retried inside the core.
/// "Nothing to do" conditions are not errors; they surface as empty results.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
