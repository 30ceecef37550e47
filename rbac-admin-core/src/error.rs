//! Unified error handling system
//!
//! Every async boundary of the console converts transport and server failures
//! into a [`ConsoleError`] carrying a human-readable message and an
//! [`ErrorContext`] for tracing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the admin console
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// Bad credentials or missing/expired session
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    /// The account already has an active session elsewhere
    #[error("Active session conflict: {message}")]
    SessionConflict {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Server error: {message}")]
    Server {
        message: String,
        status: Option<u16>,
        context: ErrorContext,
    },

    /// A rights matrix operation arrived before the matrix finished loading
    #[error("Rights matrix is not ready: {message}")]
    MatrixNotReady {
        message: String,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConsoleError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ConsoleError::Authentication { context, .. } => Some(context),
            ConsoleError::SessionConflict { context, .. } => Some(context),
            ConsoleError::Validation { context, .. } => Some(context),
            ConsoleError::NotFound { context, .. } => Some(context),
            ConsoleError::Network { context, .. } => Some(context),
            ConsoleError::Server { context, .. } => Some(context),
            ConsoleError::MatrixNotReady { context, .. } => Some(context),
            ConsoleError::Storage { context, .. } => Some(context),
            ConsoleError::Config { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Check if the operation can be retried by re-submitting it
    pub fn is_recoverable(&self) -> bool {
        match self {
            ConsoleError::Network { .. } => true,
            ConsoleError::Server { .. } => true,
            ConsoleError::MatrixNotReady { .. } => true,
            ConsoleError::Authentication { .. } => false,
            ConsoleError::SessionConflict { .. } => false,
            ConsoleError::Validation { .. } => false,
            ConsoleError::Config { .. } => false,
            _ => false,
        }
    }

    /// The message meant for the person at the keyboard, without the kind prefix
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Authentication { message, .. }
            | ConsoleError::SessionConflict { message, .. }
            | ConsoleError::Validation { message, .. }
            | ConsoleError::Network { message, .. }
            | ConsoleError::Server { message, .. }
            | ConsoleError::MatrixNotReady { message, .. }
            | ConsoleError::Storage { message, .. }
            | ConsoleError::Config { message, .. } => message.clone(),
            ConsoleError::NotFound { resource, .. } => {
                if resource.to_lowercase().contains("not found") {
                    resource.clone()
                } else {
                    format!("{} not found", resource)
                }
            }
            other => other.to_string(),
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            ConsoleError::Config { .. } | ConsoleError::Storage { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or storage error"
                );
            }
            ConsoleError::Network { .. } | ConsoleError::Server { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Network or server error (may be recoverable)"
                );
            }
            ConsoleError::Authentication { .. }
            | ConsoleError::SessionConflict { .. }
            | ConsoleError::Validation { .. }
            | ConsoleError::MatrixNotReady { .. } => {
                debug!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "User-facing error"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! authentication_error {
    ($msg:expr, $component:expr) => {
        $crate::ConsoleError::Authentication {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Log in again with valid credentials"),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::ConsoleError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'rbac-admin config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::ConsoleError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::ConsoleError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check if the resource exists and was not deleted"),
        }
    };
}

#[macro_export]
macro_rules! matrix_not_ready_error {
    ($msg:expr, $component:expr) => {
        $crate::ConsoleError::MatrixNotReady {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Wait for the rights matrix to finish loading"),
        }
    };
}
