use thiserror::Error;

/// Errors that can occur when talking to a Riemann collector
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode collector response: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Collector returned error: {0}")]
    Server(String),

    #[error("Message of {size} bytes exceeds the {limit} byte datagram limit")]
    MessageTooLarge { size: usize, limit: usize },

    #[error("Response frame of {0} bytes exceeds the maximum frame size")]
    ResponseTooLarge(u32),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
