//! Error types for miidb

use thiserror::Error;

/// Result type alias for miidb operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Boxed error produced by a database client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for statement building, compilation and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// A builder method was called in an invalid sequence or with an invalid argument.
    ///
    /// Returned by the offending call itself, never deferred to compile time.
    #[error("Usage error: {0}")]
    Usage(String),

    /// The accumulated statement cannot be turned into SQL.
    #[error("Compile error: {0}")]
    Compile(String),

    /// Error raised by the database client, passed through as-is
    #[error("Execution error: {0}")]
    Execution(#[source] BoxError),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Create a compile error
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile(message.into())
    }

    /// Wrap a client-side error
    pub fn execution<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Execution(err.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a usage error
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// Check if this is a compile error
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Compile(_))
    }

    /// Check if this error came from the database client
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for OrmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
