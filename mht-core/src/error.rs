use thiserror::Error;

#[derive(Error, Debug)]
pub enum MhtError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Decode error in part {part}: {reason}")]
    Decode { part: usize, reason: String },

    #[error("Unsafe resource path: {0}")]
    UnsafePath(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, MhtError>;
