//! Error types for mindsteps-core operations.
//! Keep MindFfiError minimal and stable to avoid breaking FFI clients.

/// FFI-safe error type for use across language boundaries.
///
/// This simplified error type contains just an error message string,
/// making it compatible with UniFFI's error handling.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MindFfiError {
    #[error("{message}")]
    General { message: String },
}

impl From<String> for MindFfiError {
    fn from(message: String) -> Self {
        MindFfiError::General { message }
    }
}

impl From<MindError> for MindFfiError {
    fn from(err: MindError) -> Self {
        MindFfiError::General {
            message: err.to_string(),
        }
    }
}

/// All errors that can occur in mindsteps-core operations.
///
/// This is the rich error type used internally in Rust code.
/// For FFI boundaries, use `MindFfiError` instead. Backend and sensor
/// failures never surface here: the engine converts them into structured
/// result values at each operation boundary.
#[derive(Debug, thiserror::Error)]
pub enum MindError {
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using MindError.
pub type Result<T> = std::result::Result<T, MindError>;
