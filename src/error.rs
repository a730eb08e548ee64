use thiserror::Error;

#[derive(Debug, Error)]
pub enum FvError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("message {value} is outside the encodable range (|m| < 2^{bits})")]
    EncodingRange { value: i64, bits: u32 },

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("malformed FHE object at line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("ciphertexts were produced under different parameters")]
    ParameterMismatch,

    #[error("operation cancelled")]
    Cancelled,

    #[error("worker pool error: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FvError {
    pub(crate) fn shape(expected: impl ToString, got: impl ToString) -> Self {
        FvError::DimensionMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FvError>;
