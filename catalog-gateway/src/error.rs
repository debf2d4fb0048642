//! Error taxonomy for the gateway
//!
//! Every failure a request can hit arrives as one [`GatewayError`] kind.
//! Messages never carry the raw, unvalidated request input.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::identifier::IdentifierKind;

/// Why a query that passed input validation still failed at execution time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionFailure {
    /// The referenced schema or table does not exist
    UndefinedObject,

    /// The connected role may not read the object
    PermissionDenied,

    /// The per-query timeout elapsed or the server cancelled the statement
    Timeout,

    /// The session broke while the query was running
    ConnectionLost,

    /// The built SQL or the shape of its result was wrong
    BuilderDefect,

    /// Any other driver failure
    Driver,
}

impl ExecutionFailure {
    /// Stable name used in logs and error bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UndefinedObject => "undefined_object",
            Self::PermissionDenied => "permission_denied",
            Self::Timeout => "timeout",
            Self::ConnectionLost => "connection_lost",
            Self::BuilderDefect => "builder_defect",
            Self::Driver => "driver",
        }
    }
}

/// Gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Schema or table name failed the identifier grammar
    #[error("Invalid {kind} name: {reason}")]
    InvalidIdentifier {
        kind: IdentifierKind,
        reason: String,
    },

    /// page or per_page outside the accepted range
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    /// No session could be established to the target database
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The query reached the database and failed there
    #[error("Query failed ({}): {message}", .cause.as_str())]
    QueryExecution {
        cause: ExecutionFailure,
        message: String,
    },
}

impl GatewayError {
    pub fn invalid_identifier(kind: IdentifierKind, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            kind,
            reason: reason.into(),
        }
    }

    pub fn query(cause: ExecutionFailure, message: impl Into<String>) -> Self {
        Self::QueryExecution {
            cause,
            message: message.into(),
        }
    }

    /// Error kind name as reported to callers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::InvalidPagination(_) => "invalid_pagination",
            Self::Connection(_) => "connection_error",
            Self::QueryExecution { .. } => "query_execution_error",
        }
    }

    /// Whether the caller can fix the request and try again
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. } | Self::InvalidPagination(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidIdentifier { .. } | Self::InvalidPagination(_) => StatusCode::BAD_REQUEST,
            Self::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::QueryExecution { cause, .. } => match cause {
                ExecutionFailure::UndefinedObject => StatusCode::NOT_FOUND,
                ExecutionFailure::PermissionDenied => StatusCode::FORBIDDEN,
                ExecutionFailure::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ExecutionFailure::ConnectionLost => StatusCode::SERVICE_UNAVAILABLE,
                ExecutionFailure::BuilderDefect | ExecutionFailure::Driver => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(serde_json::json!({
                "kind": self.kind(),
                "error": self.to_string()
            })),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
