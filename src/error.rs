//! Error types for the order service
//!
//! Provides one thiserror enum per layer: the HTTP surface, the order
//! storage, the cache persistence gateway and the ingestion pipeline.

use std::fmt;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Boxed driver error carried as the source of store failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// == Phase ==
/// Step of a store interaction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Acquiring a connection
    Connect,
    /// Creating or verifying a table
    Schema,
    /// Preparing a statement
    Prepare,
    /// Executing a statement
    Execute,
    /// Reading result rows
    Scan,
    /// Decoding a stored payload
    Decode,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Connect => "connect",
            Phase::Schema => "schema",
            Phase::Prepare => "prepare",
            Phase::Execute => "execute",
            Phase::Scan => "scan",
            Phase::Decode => "decode",
        };
        f.write_str(name)
    }
}

// == Persistence Error ==
/// Failure of a cache evacuate/restore operation.
///
/// Every variant names the operation (`op`) that failed so the caller can
/// tell a broken store apart from a corrupt snapshot.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The store could not be reached or a connection could not be opened
    #[error("{op}: store unavailable: {source}")]
    StoreUnavailable {
        op: &'static str,
        #[source]
        source: BoxError,
    },

    /// The snapshot table could not be created or verified
    #[error("{op}: schema failure: {source}")]
    Schema {
        op: &'static str,
        #[source]
        source: BoxError,
    },

    /// A statement failed while preparing, executing or scanning
    #[error("{op}: {phase} failed: {source}")]
    Query {
        op: &'static str,
        phase: Phase,
        #[source]
        source: BoxError,
    },

    /// The store rejected a row that already exists
    #[error("{op}: duplicate snapshot entry [{id}]")]
    Duplicate { op: &'static str, id: String },

    /// A payload could not be encoded or decoded
    #[error("{op}: serialization failure for entry [{id}]: {source}")]
    Serialization {
        op: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The operation did not finish within its deadline
    #[error("{op}: deadline of {after:?} exceeded")]
    Timeout { op: &'static str, after: Duration },
}

impl PersistenceError {
    pub fn unavailable(op: &'static str, source: impl Into<BoxError>) -> Self {
        Self::StoreUnavailable {
            op,
            source: source.into(),
        }
    }

    pub fn schema(op: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Schema {
            op,
            source: source.into(),
        }
    }

    pub fn query(op: &'static str, phase: Phase, source: impl Into<BoxError>) -> Self {
        Self::Query {
            op,
            phase,
            source: source.into(),
        }
    }

    /// Returns the phase the failure happened in.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::StoreUnavailable { .. } => Some(Phase::Connect),
            Self::Schema { .. } => Some(Phase::Schema),
            Self::Query { phase, .. } => Some(*phase),
            Self::Duplicate { .. } => Some(Phase::Execute),
            Self::Serialization { .. } => Some(Phase::Decode),
            Self::Timeout { .. } => None,
        }
    }

    /// True when the snapshot data itself is at fault rather than the store.
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::Duplicate { .. } | Self::Serialization { .. })
    }
}

/// Convenience Result type for persistence operations.
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

// == Storage Error ==
/// Failure of the authoritative order storage.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No order with this identifier
    #[error("order [{0}] not found")]
    NotFound(String),

    /// An order with this identifier is already stored
    #[error("order [{0}] already exists")]
    AlreadyExists(String),

    /// The database could not be reached
    #[error("{op}: storage unavailable: {source}")]
    Unavailable {
        op: &'static str,
        #[source]
        source: BoxError,
    },

    /// A statement failed
    #[error("{op}: {phase} failed: {source}")]
    Query {
        op: &'static str,
        phase: Phase,
        #[source]
        source: BoxError,
    },

    /// A stored order could not be encoded or decoded
    #[error("{op}: serialization failure for order [{id}]: {source}")]
    Serialization {
        op: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// == Ingest Error ==
/// Failure to process a single feed message.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The message is not a JSON order
    #[error("decoding message: {0}")]
    Decode(#[from] serde_json::Error),

    /// The order failed validation
    #[error("invalid order: {0}")]
    Invalid(String),

    /// The order could not be saved
    #[error("saving order: {0}")]
    Storage(#[from] StorageError),
}

// == API Error ==
/// Error returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Order not found
    #[error("Order not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A dependency (database, feed) is not available
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => ApiError::NotFound(id),
            StorageError::Unavailable { .. } => {
                error!("Storage unavailable: {}", err);
                ApiError::Unavailable("storage unavailable".to_string())
            }
            other => {
                error!("Storage failure: {}", other);
                ApiError::Internal("internal error".to_string())
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
