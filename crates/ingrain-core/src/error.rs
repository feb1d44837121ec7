//! Error types for ingrain operations.
//!
//! Errors carry a structured [`ErrorCode`] so hosts can react programmatically,
//! plus an optional hint for resolving them. Session code never lets these
//! escape to the host; they are rendered inline instead.

use thiserror::Error;

/// Result type alias for ingrain operations.
pub type IngrainResult<T> = Result<T, IngrainError>;

/// Main error type for all ingrain operations.
#[derive(Error, Debug)]
pub enum IngrainError {
    /// No credential or provider configuration is available.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The text-generation provider failed or returned something unusable.
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reading a document from the host failed.
    #[error("Document error: {message}")]
    Document {
        message: String,
        code: ErrorCode,
        path: Option<String>,
    },

    /// Writing or reading persisted review data failed.
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration (CFG_xxx)
    CfgMissingCredentials,
    CfgInvalid,

    // Provider (LLM_xxx)
    LlmConnectionFailed,
    LlmGenerationFailed,
    LlmInvalidResponse,

    // Documents (DOC_xxx)
    DocNotFound,
    DocReadFailed,

    // Persistence (STORE_xxx)
    StoreWriteFailed,
    StoreReadFailed,

    // Parse (PARSE_xxx)
    ParseInvalidJson,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CfgMissingCredentials => "CFG_001",
            ErrorCode::CfgInvalid => "CFG_002",
            ErrorCode::LlmConnectionFailed => "LLM_001",
            ErrorCode::LlmGenerationFailed => "LLM_002",
            ErrorCode::LlmInvalidResponse => "LLM_003",
            ErrorCode::DocNotFound => "DOC_001",
            ErrorCode::DocReadFailed => "DOC_002",
            ErrorCode::StoreWriteFailed => "STORE_001",
            ErrorCode::StoreReadFailed => "STORE_002",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl IngrainError {
    /// Create a missing-configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create a provider error for a transport failure.
    pub fn provider_connection(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            code: ErrorCode::LlmConnectionFailed,
            source: None,
        }
    }

    /// Create a provider error for a reply that could not be used.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            code: ErrorCode::LlmInvalidResponse,
            source: None,
        }
    }

    /// Create a document read error.
    pub fn document(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Document {
            message: message.into(),
            code: ErrorCode::DocReadFailed,
            path: Some(path.into()),
        }
    }

    /// Create a document-not-found error.
    pub fn document_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::Document {
            message: format!("Document '{}' not found", path),
            code: ErrorCode::DocNotFound,
            path: Some(path),
        }
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            code: ErrorCode::StoreWriteFailed,
            source: None,
        }
    }

    /// Whether this error means the provider has not been configured.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::UnsupportedProvider { .. })
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration(_) => ErrorCode::CfgMissingCredentials,
            Self::UnsupportedProvider { .. } => ErrorCode::CfgInvalid,
            Self::Provider { code, .. } => *code,
            Self::Document { code, .. } => *code,
            Self::Persistence { code, .. } => *code,
            Self::Serialization(_) => ErrorCode::ParseInvalidJson,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Configuration(_) => {
                Some("Set an API key for your provider in the config file or environment")
            }
            Self::UnsupportedProvider { .. } => Some("Use one of: openai, anthropic, ollama"),
            Self::Provider { .. } => Some("Check your network connection and try again"),
            Self::Document { .. } => Some("Check that the note still exists"),
            _ => None,
        }
    }
}
