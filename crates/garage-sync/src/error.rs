//! # Sync Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Remote              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  Remote {table,status,  │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │          message}       │ │
//! │  │  ConfigLoad/Save│  │                 │  │  SerializationFailed    │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Cache        │  │    Internal     │                              │
//! │  │  (garage-db)    │  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed mutation returns one of these, with the backend's own message
//! when it sent one. The optimistic local change is kept either way.

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Everything that can go wrong between the working set and the remote
/// store.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Remote URL doesn't parse or isn't http(s).
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request never got a response (DNS, refused, TLS, reset).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The remote store answered with an error.
    ///
    /// ## When This Occurs
    /// - Row violates a column constraint (400/409)
    /// - Key lacks permission for the table (401/403)
    /// - Table missing (404)
    /// - Backend outage (5xx)
    #[error("Remote error on {table} ({status}): {message}")]
    Remote {
        table: String,
        status: u16,
        message: String,
    },

    /// A record couldn't be encoded, or a response couldn't be decoded.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Writing or reading the local cache failed.
    #[error("Local cache error: {0}")]
    Cache(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<garage_db::DbError> for SyncError {
    fn from(err: garage_db::DbError) -> Self {
        SyncError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout(err.to_string())
        } else if err.is_decode() {
            SyncError::SerializationFailed(err.to_string())
        } else {
            SyncError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if replaying the same write later may succeed.
    ///
    /// ## Retryable Errors
    /// - Connection failures and timeouts
    /// - Remote 5xx and 429
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - Remote 4xx (the row itself is rejected)
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ConnectionFailed(_) | SyncError::Timeout(_) => true,
            SyncError::Remote { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }

    /// The human-readable part, without the category prefix.
    pub fn message(&self) -> String {
        match self {
            SyncError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::ConnectionFailed("refused".into()).is_retryable());
        assert!(SyncError::Timeout("15s".into()).is_retryable());
        assert!(SyncError::Remote {
            table: "customers".into(),
            status: 503,
            message: "upstream unavailable".into(),
        }
        .is_retryable());

        assert!(!SyncError::Remote {
            table: "customers".into(),
            status: 400,
            message: "null value in column \"customerName\"".into(),
        }
        .is_retryable());
        assert!(!SyncError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::Remote {
            table: "inventory".into(),
            status: 409,
            message: "duplicate key value".into(),
        };
        assert_eq!(err.to_string(), "Remote error on inventory (409): duplicate key value");
        assert_eq!(err.message(), "duplicate key value");
    }

    #[test]
    fn test_config_errors() {
        assert!(SyncError::InvalidUrl("ftp://x".into()).is_config_error());
        assert!(!SyncError::Cache("disk full".into()).is_config_error());

        let from_db: SyncError = garage_db::DbError::Busy.into();
        assert!(matches!(from_db, SyncError::Cache(_)));
    }
}
