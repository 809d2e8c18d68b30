use riemann_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Transport error: {0}")]
    Transport(#[from] ClientError),

    #[error("Invalid event: {0}")]
    Event(String),
}

pub type Result<T> = std::result::Result<T, OutputError>;
