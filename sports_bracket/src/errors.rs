//! Error taxonomy shared by tournament and match operations.
//!
//! Storage failures are classified into [`ErrorKind`] where they occur, so
//! callers never inspect raw driver messages. `NotFound` is kept apart from
//! `Validation` so a transport layer can pick 404 vs 400 on its own.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::matches::models::{MatchId, MatchStatus};

/// Closed set of error classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input; the caller's fault, never retried
    Validation,
    /// Entity does not exist
    NotFound,
    /// Unique-constraint collision
    Duplicate,
    /// Foreign-key violation
    Constraint,
    /// Transient connectivity failure or timeout; safe to retry
    Connection,
    /// Begin/commit/rollback failure
    Transaction,
    /// Any other execution failure
    Query,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Duplicate => "duplicate",
            Self::Constraint => "constraint",
            Self::Connection => "connection",
            Self::Transaction => "transaction",
            Self::Query => "query",
        };
        write!(f, "{repr}")
    }
}

/// Domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// Field-level validation failure
    #[error("Validation error: {0}")]
    Validation(String),

    /// Submitted result is internally inconsistent
    #[error("Invalid match result: {0}")]
    InvalidMatchResult(String),

    /// Result submitted for a match that already has one
    #[error("Match {0} is already completed")]
    MatchAlreadyCompleted(MatchId),

    /// Status change not allowed by the match state machine
    #[error("Match status cannot change from {from} to {to}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique-constraint collision
    #[error("Duplicate: {message}")]
    Duplicate {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Foreign-key violation
    #[error("Constraint violated: {message}")]
    Constraint {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Connectivity failure or timeout
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Transaction begin/commit/rollback failure
    #[error("Transaction error: {message}")]
    Transaction {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Catch-all execution failure
    #[error("Query error: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate {
            message: message.into(),
            source: None,
        }
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint {
            message: message.into(),
            source: None,
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
            source: None,
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            source: None,
        }
    }

    /// Operation exceeded its deadline.
    pub fn timeout(duration: Duration) -> Self {
        Self::connection(format!("operation timed out after {duration:?}"))
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::InvalidMatchResult(_)
            | Self::MatchAlreadyCompleted(_)
            | Self::InvalidTransition { .. } => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Duplicate { .. } => ErrorKind::Duplicate,
            Self::Constraint { .. } => ErrorKind::Constraint,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Transaction { .. } => ErrorKind::Transaction,
            Self::Query { .. } => ErrorKind::Query,
        }
    }

    /// Only connection failures may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }

    /// Stable code a transport layer can hand to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::InvalidTransition { .. } => "VALIDATION_ERROR",
            Self::InvalidMatchResult(_) => "BUSINESS_INVALID_MATCH_RESULT",
            Self::MatchAlreadyCompleted(_) => "BUSINESS_MATCH_ALREADY_COMPLETED",
            Self::NotFound(_) => "RESOURCE_NOT_FOUND",
            Self::Duplicate { .. } => "RESOURCE_DUPLICATE",
            Self::Constraint { .. } => "CONSTRAINT_VIOLATION",
            Self::Connection { .. } => "DATABASE_CONNECTION_ERROR",
            Self::Transaction { .. } => "DATABASE_TRANSACTION_ERROR",
            Self::Query { .. } => "DATABASE_QUERY_ERROR",
        }
    }

    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            Self::Connection { .. } => "Service temporarily unavailable".to_string(),
            Self::Transaction { .. } | Self::Query { .. } => "Internal server error".to_string(),
            Self::Constraint { .. } => "Referenced resource does not exist".to_string(),
            Self::Duplicate { .. } => "Resource already exists".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Duplicate {
                message: db.message().to_string(),
                source: Some(err),
            },
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => Self::Constraint {
                message: db.message().to_string(),
                source: Some(err),
            },
            sqlx::Error::Database(db) if db.is_check_violation() => {
                Self::Validation(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::Connection {
                message: err.to_string(),
                source: Some(err),
            },
            sqlx::Error::BeginFailed => Self::Transaction {
                message: err.to_string(),
                source: Some(err),
            },
            _ => Self::Query {
                message: err.to_string(),
                source: Some(err),
            },
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
