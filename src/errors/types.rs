//! # Error Types
//!
//! Error taxonomy for the translation core using `thiserror`.

/// Custom result type for routeweave operations
pub type Result<T> = std::result::Result<T, TranslatorError>;

/// Main error type for the translation core
#[derive(thiserror::Error, Debug)]
pub enum TranslatorError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Settings failed field validation
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// The output route does not carry one entry per input destination
    #[error(
        "Route '{route}' has {expected} destination(s) but the translated route has {actual} weighted cluster(s)"
    )]
    CardinalityMismatch { route: String, expected: usize, actual: usize },

    /// A filter was configured twice on the same attachment point
    #[error("Filter config for '{filter_name}' already exists on {location}")]
    DuplicateFilterConfig { filter_name: String, location: String },

    /// Referenced resource is not present in the snapshot
    #[error("Resource not found: {resource_type} '{id}'")]
    NotFound { resource_type: String, id: String },

    /// A parameter template could not be parsed
    #[error(
        "{template} is not valid syntax. {{}} braces must be closed and variable names must satisfy regex ([\\.\\-_[:word:]]+)"
    )]
    MalformedTemplate { template: String },

    /// Content hash could not be computed for an artifact
    #[error("Hashing error: {message}")]
    Hashing { message: String },

    /// The external validator ran and rejected the configuration
    #[error("Configuration rejected by proxy validation: {message}")]
    Rejected { message: String },

    /// The external validator could not be run at all
    #[error("Failed to invoke validator: {message}")]
    ValidatorInvocation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The caller cancelled the operation
    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    /// Timeout errors
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        context: String,
    },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TranslatorError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a cardinality mismatch error
    pub fn cardinality_mismatch<R: Into<String>>(route: R, expected: usize, actual: usize) -> Self {
        Self::CardinalityMismatch { route: route.into(), expected, actual }
    }

    /// Create a duplicate filter config error
    pub fn duplicate_filter_config<F: Into<String>, L: Into<String>>(
        filter_name: F,
        location: L,
    ) -> Self {
        Self::DuplicateFilterConfig { filter_name: filter_name.into(), location: location.into() }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    /// Create a malformed template error
    pub fn malformed_template<S: Into<String>>(template: S) -> Self {
        Self::MalformedTemplate { template: template.into() }
    }

    /// Create a hashing error
    pub fn hashing<S: Into<String>>(message: S) -> Self {
        Self::Hashing { message: message.into() }
    }

    /// Create a rejection produced by the external validator
    pub fn rejected<S: Into<String>>(message: S) -> Self {
        Self::Rejected { message: message.into() }
    }

    /// Create a validator invocation error
    pub fn validator_invocation<S: Into<String>>(
        message: S,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ValidatorInvocation { message: message.into(), source }
    }

    /// Create a cancellation error
    pub fn cancelled<S: Into<String>>(operation: S) -> Self {
        Self::Cancelled { operation: operation.into() }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration_ms: u64) -> Self {
        Self::Timeout { operation: operation.into(), duration_ms }
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(source: std::io::Error, context: S) -> Self {
        Self::Io { source, context: context.into() }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Whether the error is a missing-resource lookup failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error should be retried on a later reconciliation pass
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslatorError::NotFound { .. } => true,
            TranslatorError::ValidatorInvocation { .. } => true,
            TranslatorError::Cancelled { .. } => true,
            TranslatorError::Timeout { .. } => true,
            TranslatorError::Io { .. } => true,
            _ => false,
        }
    }
}

impl From<std::io::Error> for TranslatorError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for TranslatorError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            source: Box::new(error),
            context: "JSON serialization failed".to_string(),
        }
    }
}

impl From<serde_yaml::Error> for TranslatorError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Serialization {
            source: Box::new(error),
            context: "YAML deserialization failed".to_string(),
        }
    }
}

impl From<config::ConfigError> for TranslatorError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for TranslatorError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
