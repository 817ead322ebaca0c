use thiserror::Error;

/// Core error type for Carpet's record-to-Parquet conversion
///
/// Every unsupported-type, schema-incompatibility, recursive-type and
/// decimal-rescale failure described by the record-type conversion model
/// surfaces through this single enum.
#[derive(Error, Debug)]
pub enum CarpetError {
    /// IO errors from file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parquet format errors bubbled up from the `parquet` crate
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Schema-related errors: unsupported type, recursive record, missing
    /// component, field-id/name collisions
    #[error("Schema error: {0}")]
    Schema(String),

    /// A record type transitively contains itself
    #[error("Recursive record: {0}")]
    Recursive(String),

    /// Type conversion errors on the read or write path
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Invalid argument errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Data validation errors (null in a required field, decimal rescale
    /// overflow, null list element in 2-level mode, ...)
    #[error("Data validation error: {0}")]
    DataValidation(String),

    /// Unsupported operation errors (generic type variable without a
    /// reified argument, nested list in 1-level mode, map with non-scalar
    /// key, ...)
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Internal errors that shouldn't happen
    #[error("Internal error: {0}")]
    Internal(String),

    /// UTF-8 decoding errors
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Number parsing errors
    #[error("Parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// Float parsing errors
    #[error("Parse float error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),
}

/// Result type alias for Carpet operations
pub type Result<T> = std::result::Result<T, CarpetError>;

impl CarpetError {
    /// Create a new schema error
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        CarpetError::Schema(msg.into())
    }

    /// Create a new recursive-record error
    pub fn recursive<S: Into<String>>(msg: S) -> Self {
        CarpetError::Recursive(msg.into())
    }

    /// Create a new conversion error
    pub fn conversion<S: Into<String>>(msg: S) -> Self {
        CarpetError::Conversion(msg.into())
    }

    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        CarpetError::InvalidArgument(msg.into())
    }

    /// Create a new data validation error
    pub fn data_validation<S: Into<String>>(msg: S) -> Self {
        CarpetError::DataValidation(msg.into())
    }

    /// Create a new unsupported operation error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        CarpetError::Unsupported(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        CarpetError::Internal(msg.into())
    }
}

/// Extension trait to add context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, ctx: S) -> Result<T>;

    /// Add context with a closure that's only called on error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<CarpetError>,
{
    fn context<S: Into<String>>(self, ctx: S) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            CarpetError::Internal(format!("{}: {}", ctx.into(), base_error))
        })
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            CarpetError::Internal(format!("{}: {}", f().into(), base_error))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CarpetError::schema("Invalid schema");
        assert_eq!(err.to_string(), "Schema error: Invalid schema");

        let err = CarpetError::conversion("Cannot convert value");
        assert_eq!(err.to_string(), "Conversion error: Cannot convert value");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: CarpetError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_recursive_error() {
        let err = CarpetError::recursive("Order -> Order");
        assert!(err.to_string().contains("Recursive record"));
    }

    #[test]
    fn test_error_context() {
        fn failing_operation() -> Result<()> {
            Err(CarpetError::invalid_argument("bad input"))
        }

        let result = failing_operation().context("During file read");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("During file read"));
    }

    #[test]
    fn test_error_with_context() {
        fn failing_operation() -> Result<()> {
            Err(CarpetError::data_validation("Invalid data"))
        }

        let filename = "test.parquet";
        let result = failing_operation().with_context(|| format!("Processing file: {}", filename));

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Processing file: test.parquet"));
    }
}
