//! # catalog-gateway
//!
//! A read-only HTTP gateway for browsing PostgreSQL databases. Callers pass
//! connection credentials with every request and get back schemas, table
//! names, row counts and paginated rows.
//!
//! ## Features
//!
//! - Schema listing from `information_schema`
//! - Table listing per schema, ordered by name and paginated
//! - Paginated row reads, ordered by primary key where one exists
//! - Table and row counts
//! - Per-query and per-connect timeouts
//!
//! ## Safety Model
//!
//! - Schema and table names pass [`identifier::validate`] before they can
//!   reach SQL text, and are always rendered double-quoted
//! - Every literal, including LIMIT and OFFSET, is a bound parameter
//! - Sessions are opened read-only and closed at the end of each request
//! - No authentication/authorization built-in; put it in front of the gateway
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::Router;
//! use catalog_gateway::CatalogGateway;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new().merge(
//!         CatalogGateway::postgres(Duration::from_secs(10), Duration::from_secs(30)).into_router(),
//!     );
//!
//!     // Serve the application...
//! }
//! ```

// Public modules
pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod identifier;
pub mod layer;
pub mod pagination;
pub mod query;
pub mod schema;

// Public exports
pub use config::Config;
pub use error::{ExecutionFailure, GatewayError, Result};
pub use identifier::{Identifier, IdentifierKind, QualifiedTable};
pub use layer::CatalogGateway;
pub use pagination::{PageWindow, PaginationPolicy};
pub use query::{BoundValue, BuiltQuery, QueryKind};
pub use schema::{CellValue, ConnectionCoordinates, RowRecord, SchemaDescriptor};

// Re-export connection providers
pub use database::traits::{CatalogSession, ConnectionProvider, ResultSet};

#[cfg(feature = "postgres")]
pub use database::postgres::{PostgresConnector, PostgresSession};
