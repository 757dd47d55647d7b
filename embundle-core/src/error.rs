use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no bundle present: {0}")]
    NotABundle(String),

    #[error("corrupt container at offset {offset}: {reason}")]
    CorruptContainer { offset: u64, reason: String },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("no such entry: {0}")]
    NotFound(String),

    #[error("offset {offset} out of range for entry of {size} bytes")]
    OutOfRange { offset: i64, size: u64 },

    #[error("Format error: {0}")]
    Format(String),

    #[error("section injection failed: {0}")]
    Inject(String),
}

impl From<BundleError> for std::io::Error {
    fn from(e: BundleError) -> Self {
        match e {
            BundleError::Io(e) => e,
            BundleError::OutOfRange { .. } | BundleError::InvalidPath(_) => {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
            }
            BundleError::NotFound(_) => {
                std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string())
            }
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, BundleError>;
