//! Error types for dsconf.
//!
//! The reducer itself is total and never produces these. They surface at the
//! boundaries: decoding persisted records, committing edited state, the
//! session registry and local storage.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for dsconf.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The persisted `extra` text is not a valid extra object.
    ///
    /// Only ever raised by the extra codec; the hydrate path catches it and
    /// substitutes defaults.
    #[error("Malformed extra: {message}")]
    ExtraDecode {
        /// Human-readable error message.
        message: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An editable extra field holds text that does not parse as JSON.
    #[error("Invalid JSON in extra field '{field}': {message}")]
    InvalidExtraField {
        /// Name of the offending field (e.g. "metadata_params").
        field: String,
        /// Human-readable error message.
        message: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// No editing session is registered under the given id.
    #[error("Session not found: {session_id}")]
    SessionNotFound {
        /// ID of the missing session.
        session_id: Uuid,
    },

    /// The session has no configuration to commit (never opened, or reset).
    #[error("No configuration to commit")]
    NoActiveState,

    /// Local SQLite storage error.
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error message.
        message: String,
        /// Actionable hint for the user.
        hint: Option<String>,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unexpected internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ConfigError {
    // ========== Constructors ==========

    /// Create a new extra decode error.
    pub fn extra_decode(source: serde_json::Error) -> Self {
        Self::ExtraDecode { message: source.to_string(), source }
    }

    /// Create a new invalid extra field error.
    pub fn invalid_extra_field(field: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidExtraField { field: field.into(), message: source.to_string(), source }
    }

    /// Create a session not found error.
    pub fn session_not_found(session_id: Uuid) -> Self {
        Self::SessionNotFound { session_id }
    }

    /// Create a new storage error.
    pub fn storage(message: impl Into<String>, hint: Option<&str>) -> Self {
        Self::Storage { message: message.into(), hint: hint.map(String::from), source: None }
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    // ========== Methods ==========

    /// Check if this error came from decoding persisted data.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::ExtraDecode { .. } | Self::InvalidExtraField { .. })
    }

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ExtraDecode { .. } => "Decode",
            Self::InvalidExtraField { .. } => "Decode",
            Self::SessionNotFound { .. } => "Session",
            Self::NoActiveState => "Session",
            Self::Storage { .. } => "Storage",
            Self::Internal { .. } => "Internal",
        }
    }

    /// Get actionable hint for the user.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::ExtraDecode { .. } => Some("The stored extra settings will be reset to defaults"),
            Self::InvalidExtraField { .. } => Some("Fix the JSON in the advanced settings editor"),
            Self::SessionNotFound { .. } => Some("The editing session may already be closed"),
            Self::NoActiveState => Some("Select an engine or load a record first"),
            Self::Storage { hint, .. } => hint.as_deref(),
            Self::Internal { .. } => Some("Please report this issue"),
        }
    }

    /// Get the extra field name (if applicable).
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidExtraField { field, .. } => Some(field),
            _ => None,
        }
    }
}

// ========== Error Conversions ==========

/// Convert from rusqlite::Error to ConfigError.
impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::Storage {
            message: err.to_string(),
            hint: Some("The local database may be corrupted".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Convert from std::io::Error to ConfigError.
impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Storage {
            message: err.to_string(),
            hint: Some("Check file permissions and disk space".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Convert from serde_json::Error to ConfigError.
impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Storage {
            message: format!("JSON error: {err}"),
            hint: Some("Data may be corrupted".to_string()),
            source: Some(Box::new(err)),
        }
    }
}
