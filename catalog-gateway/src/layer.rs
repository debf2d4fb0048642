//! CatalogGateway - Axum router construction
//!
//! This module provides the main entry point for serving the gateway or
//! merging it into an existing Axum application.

use crate::api::{
    count_rows_handler, count_tables_handler, get_rows_handler, list_schemas_handler,
    list_tables_handler, root_handler, GatewayState,
};
use crate::database::traits::ConnectionProvider;
use crate::pagination::PaginationPolicy;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[cfg(feature = "postgres")]
use crate::database::postgres::PostgresConnector;
#[cfg(feature = "postgres")]
use std::time::Duration;

/// Read-only catalog gateway over a connection provider
///
/// # Example
///
/// ```rust,no_run
/// use catalog_gateway::CatalogGateway;
/// use std::time::Duration;
///
/// # async fn example() {
/// let gateway = CatalogGateway::postgres(Duration::from_secs(10), Duration::from_secs(30));
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await.unwrap();
/// axum::serve(listener, gateway.into_router()).await.unwrap();
/// # }
/// ```
pub struct CatalogGateway<P: ConnectionProvider> {
    provider: Arc<P>,
    pagination: PaginationPolicy,
}

impl<P: ConnectionProvider> CatalogGateway<P> {
    /// Create a new gateway
    ///
    /// # Arguments
    ///
    /// * `provider` - Opens one session per request
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
            pagination: PaginationPolicy::default(),
        }
    }

    /// Replace the default pagination policy
    pub fn with_pagination(mut self, pagination: PaginationPolicy) -> Self {
        self.pagination = pagination;
        self
    }

    /// Convert into an Axum Router
    ///
    /// The returned router includes:
    /// - `GET /`, `GET /schemas`
    /// - `GET /tables`, `GET /tables/count`
    /// - `GET /table_data`, `GET /table_data/count`
    /// - Permissive CORS and request tracing
    pub fn into_router(self) -> Router {
        let state = GatewayState {
            provider: self.provider,
            pagination: self.pagination,
        };

        Router::new()
            .route("/", get(root_handler))
            .route("/schemas", get(list_schemas_handler::<P>))
            .route("/tables", get(list_tables_handler::<P>))
            .route("/tables/count", get(count_tables_handler::<P>))
            .route("/table_data", get(get_rows_handler::<P>))
            .route("/table_data/count", get(count_rows_handler::<P>))
            .with_state(state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }
}

#[cfg(feature = "postgres")]
impl CatalogGateway<PostgresConnector> {
    /// Create a gateway that connects to PostgreSQL
    ///
    /// # Arguments
    ///
    /// * `connect_timeout` - Upper bound for opening a session
    /// * `query_timeout` - Upper bound for each query
    pub fn postgres(connect_timeout: Duration, query_timeout: Duration) -> Self {
        Self::new(PostgresConnector::new(connect_timeout, query_timeout))
    }
}
