//! Error types for salonbook.

use crate::model::EntityKind;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Form error: {0}")]
    Form(#[from] FormError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read settings file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse settings file {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Failures talking to the scheduling backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Backend answered with a non-success status. `message` is the text the
    /// backend put in its `erro` field, or the generic fallback.
    #[error("{message}")]
    Request { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

impl ApiError {
    /// Text shown to the user in a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Request { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Form/edit session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("No form is open")]
    NoActiveSession,

    #[error("{kind} {id} is not loaded")]
    UnknownEntity { kind: EntityKind, id: i64 },

    #[error("Field '{field}' does not belong to the open {kind} form")]
    FieldKindMismatch { field: &'static str, kind: EntityKind },

    #[error("Campo obrigatório: {field}")]
    MissingField { field: &'static str },

    #[error("Valor inválido para {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Command dispatch errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Action '{action}' is not available for {kind}")]
    Unsupported { kind: EntityKind, action: &'static str },

    #[error("Malformed command key '{0}'")]
    MalformedKey(String),

    #[error("Command '{0}' is not offered for the current data")]
    NotOffered(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
