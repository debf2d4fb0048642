//! Request and response types
//!
//! These types describe what callers send (connection coordinates, paging
//! intent) and what they get back (schemas, table names, counts, rows).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::error::{GatewayError, Result};

fn default_port() -> u16 {
    5432
}

/// Credentials for one target database, supplied with every request
///
/// Field names follow the `db_*` query parameters of the HTTP API.
#[derive(Clone, Deserialize)]
pub struct ConnectionCoordinates {
    #[serde(rename = "db_host")]
    pub host: String,

    #[serde(rename = "db_port", default = "default_port")]
    pub port: u16,

    #[serde(rename = "db_user")]
    pub user: String,

    #[serde(rename = "db_password", default)]
    pub password: String,

    #[serde(rename = "db_name")]
    pub database: String,
}

impl ConnectionCoordinates {
    /// Host and database must be present before a connection is attempted
    ///
    /// Only network hosts are accepted; a path would make the driver dial a
    /// Unix socket on the gateway's own machine.
    pub fn check(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(GatewayError::Connection("db_host must not be empty".to_string()));
        }
        if self.host.trim_start().starts_with('/') {
            return Err(GatewayError::Connection(
                "db_host must be a network host, not a socket path".to_string(),
            ));
        }
        if self.database.trim().is_empty() {
            return Err(GatewayError::Connection("db_name must not be empty".to_string()));
        }
        Ok(())
    }
}

// Keeps the password out of logs
impl fmt::Debug for ConnectionCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCoordinates")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Query parameters for listing tables in a schema
///
/// Paging values stay raw text here and are parsed by
/// [`parse_param`](crate::pagination::parse_param), so malformed numbers are
/// reported as pagination errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TablesQuery {
    pub schema: String,

    pub page: Option<String>,

    pub per_page: Option<String>,
}

/// Query parameters for reading rows of a table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableDataQuery {
    pub table: String,

    /// Schema qualifying the table; the session's search_path when absent
    pub schema: Option<String>,

    pub page: Option<String>,

    pub per_page: Option<String>,
}

/// One entry of the schema listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub schema_name: String,
}

/// A single column value of a dynamically shaped row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),

    /// NUMERIC kept as text so no precision is lost
    Decimal(String),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(serde_json::Value),

    #[serde(serialize_with = "serialize_base64")]
    Binary(Vec<u8>),
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// One row, as an ordered column name to value mapping
///
/// Serializes as a JSON object whose keys keep the table's column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowRecord {
    fields: Vec<(String, CellValue)>,
}

impl RowRecord {
    pub fn new(fields: Vec<(String, CellValue)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

impl Serialize for RowRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Response for GET /schemas
#[derive(Debug, Clone, Serialize)]
pub struct SchemasResponse {
    pub schemas: Vec<SchemaDescriptor>,
}

/// Response for GET /tables
#[derive(Debug, Clone, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,

    pub page: i64,

    /// Page size actually applied, after clamping
    pub per_page: i64,
}

/// Response for GET /table_data
#[derive(Debug, Clone, Serialize)]
pub struct RowsResponse {
    pub rows: Vec<RowRecord>,

    /// Column names in result order; empty when the page has no rows
    pub columns: Vec<String>,

    pub page: i64,

    pub per_page: i64,
}

/// Response for the count endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub count: u64,
}
