//! Connection provider layer
//!
//! The core runs queries through the [`CatalogSession`] trait; the
//! PostgreSQL implementation lives behind the `postgres` feature.

pub mod traits;

#[cfg(feature = "postgres")]
pub mod postgres;

// Re-export the main traits
pub use traits::{CatalogSession, ConnectionProvider, ResultSet};
