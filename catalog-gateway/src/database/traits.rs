//! Session and connection provider traits
//!
//! The core never talks to a driver directly. It runs a
//! [`BuiltQuery`] over a [`CatalogSession`] and gets back a driver-neutral
//! [`ResultSet`].

use async_trait::async_trait;

use crate::error::Result;
use crate::query::BuiltQuery;
use crate::schema::{CellValue, ConnectionCoordinates};

/// Column names and value rows returned by a session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }
}

/// A live, request-scoped database session
#[async_trait]
pub trait CatalogSession: Send {
    /// Run a query and fetch every row it returns
    ///
    /// # Errors
    ///
    /// Fails with [`GatewayError::QueryExecution`](crate::GatewayError::QueryExecution)
    /// tagged with the failure cause.
    async fn fetch(&mut self, query: &BuiltQuery) -> Result<ResultSet>;

    /// End the session gracefully
    ///
    /// Dropping a session also releases it; this only makes the goodbye
    /// explicit where the driver supports one.
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Opens sessions from per-request connection coordinates
#[async_trait]
pub trait ConnectionProvider: Send + Sync + 'static {
    type Session: CatalogSession;

    /// Establish a new session
    ///
    /// # Errors
    ///
    /// Any failure to connect is a
    /// [`GatewayError::Connection`](crate::GatewayError::Connection).
    async fn connect(&self, coordinates: &ConnectionCoordinates) -> Result<Self::Session>;
}
