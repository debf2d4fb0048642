//! REST API endpoints
//!
//! This module contains all API endpoint handlers for the gateway. Every
//! handler validates its input first, then opens one session, runs one
//! executor operation over it and closes it again.

use axum::{
    extract::{rejection::QueryRejection, Query},
    response::Json,
};
use std::sync::Arc;

use crate::database::traits::{CatalogSession, ConnectionProvider};
use crate::error::{GatewayError, Result};
use crate::identifier::IdentifierKind;
use crate::pagination::{parse_param, PageWindow, PaginationPolicy, DEFAULT_PAGE};
use crate::schema::ConnectionCoordinates;

pub mod rows;
pub mod schemas;
pub mod tables;

// Re-export handlers for convenience
pub use rows::{count_rows_handler, get_rows_handler};
pub use schemas::list_schemas_handler;
pub use tables::{count_tables_handler, list_tables_handler};

/// Shared handler state
pub struct GatewayState<P: ConnectionProvider> {
    pub provider: Arc<P>,
    pub pagination: PaginationPolicy,
}

// Derived Clone would require P: Clone
impl<P: ConnectionProvider> Clone for GatewayState<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            pagination: self.pagination,
        }
    }
}

/// Handler for GET /
pub async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Hello World" }))
}

/// Connection parameters as extracted, rejection included
///
/// Handlers take the rejection so it can be reported as a
/// [`GatewayError::Connection`] instead of axum's plain-text 400.
pub type CoordinatesQuery = std::result::Result<Query<ConnectionCoordinates>, QueryRejection>;

/// Request parameters as extracted, rejection included
pub type ParamsQuery<T> = std::result::Result<Query<T>, QueryRejection>;

/// Unwrap request parameters, reporting a rejection against the named object
///
/// Every field of the request structs has a default, so only a repeated
/// key gets here.
pub(crate) fn request_params<T>(
    operation: &'static str,
    kind: IdentifierKind,
    extracted: ParamsQuery<T>,
) -> Result<T> {
    extracted.map(|Query(params)| params).map_err(|_| {
        let error = GatewayError::invalid_identifier(kind, "request parameters could not be read");
        log_rejection(operation, &error);
        error
    })
}

/// Parse and resolve the raw paging values of a request
pub(crate) fn page_window(
    operation: &'static str,
    policy: &PaginationPolicy,
    page: Option<&str>,
    per_page: Option<&str>,
) -> Result<(i64, PageWindow)> {
    let resolved = parse_param("page", page).and_then(|page| {
        let per_page = parse_param("per_page", per_page)?;
        let window = policy.resolve_optional(page, per_page)?;
        Ok((page.unwrap_or(DEFAULT_PAGE), window))
    });
    resolved.inspect_err(|error| log_rejection(operation, error))
}

/// Open a session for the request's coordinates
///
/// Coordinates are checked here, once, before the provider is asked to dial.
pub(crate) async fn open_session<P: ConnectionProvider>(
    provider: &P,
    coordinates: CoordinatesQuery,
) -> Result<P::Session> {
    let Query(coordinates) = coordinates.map_err(|rejection| {
        tracing::debug!(status = %rejection.status(), "Rejected connection parameters");
        GatewayError::Connection(
            "db_host, db_user and db_name are required and db_port must be a port number"
                .to_string(),
        )
    })?;
    coordinates.check()?;

    provider.connect(&coordinates).await.inspect_err(|error| {
        tracing::warn!(
            host = %coordinates.host,
            port = coordinates.port,
            database = %coordinates.database,
            error = %error,
            "Failed to open database session"
        );
    })
}

/// Close the session and pass the operation's outcome through
///
/// A failed close never replaces the operation's result.
pub(crate) async fn finish<S: CatalogSession, T>(session: S, outcome: Result<T>) -> Result<T> {
    if let Err(error) = session.close().await {
        tracing::debug!(error = %error, "Session did not close cleanly");
    }
    outcome
}

/// Log a request rejected before any query ran
pub(crate) fn log_rejection(operation: &'static str, error: &GatewayError) {
    tracing::debug!(operation, kind = error.kind(), error = %error, "Rejected request");
}
