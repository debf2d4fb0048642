//! PostgreSQL connection provider implementation

use crate::database::traits::{CatalogSession, ConnectionProvider, ResultSet};
use crate::error::{ExecutionFailure, GatewayError, Result};
use crate::query::{BoundValue, BuiltQuery};
use crate::schema::{CellValue, ConnectionCoordinates};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::types::{Oid, PgInterval, PgMoney};
use sqlx::postgres::{PgConnectOptions, PgRow, PgTypeKind};
use sqlx::types::{BigDecimal, Uuid};
use sqlx::{Column, Connection, PgConnection, Row, TypeInfo, ValueRef};
use std::time::Duration;

/// Opens one unpooled PostgreSQL connection per request
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl PostgresConnector {
    /// Create a new connector
    ///
    /// # Arguments
    ///
    /// * `connect_timeout` - Upper bound for establishing a session
    /// * `query_timeout` - Upper bound for every statement run on a session
    pub fn new(connect_timeout: Duration, query_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            query_timeout,
        }
    }

    fn connect_options(&self, coordinates: &ConnectionCoordinates) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&coordinates.host)
            .port(coordinates.port)
            .username(&coordinates.user)
            .database(&coordinates.database)
            .application_name("catalog-gateway")
            // Server-side statement limit mirrors the client timeout
            .options([
                ("statement_timeout", self.query_timeout.as_millis().to_string()),
                ("default_transaction_read_only", "on".to_string()),
            ]);

        if !coordinates.password.is_empty() {
            options = options.password(&coordinates.password);
        }

        options
    }
}

#[async_trait]
impl ConnectionProvider for PostgresConnector {
    type Session = PostgresSession;

    async fn connect(&self, coordinates: &ConnectionCoordinates) -> Result<PostgresSession> {
        let options = self.connect_options(coordinates);
        let connection = tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&options))
            .await
            .map_err(|_| {
                GatewayError::Connection(format!(
                    "timed out after {}s",
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(connection_error)?;

        tracing::debug!(
            host = %coordinates.host,
            port = coordinates.port,
            database = %coordinates.database,
            "Opened database session"
        );

        Ok(PostgresSession {
            connection,
            query_timeout: self.query_timeout,
        })
    }
}

/// A single PostgreSQL connection scoped to one request
pub struct PostgresSession {
    connection: PgConnection,
    query_timeout: Duration,
}

#[async_trait]
impl CatalogSession for PostgresSession {
    async fn fetch(&mut self, query: &BuiltQuery) -> Result<ResultSet> {
        let mut statement = sqlx::query(&query.sql);
        for value in &query.params {
            statement = match value {
                BoundValue::Text(text) => statement.bind(text.as_str()),
                BoundValue::BigInt(number) => statement.bind(*number),
            };
        }

        let rows = tokio::time::timeout(self.query_timeout, statement.fetch_all(&mut self.connection))
            .await
            .map_err(|_| {
                GatewayError::query(
                    ExecutionFailure::Timeout,
                    format!("exceeded {}s", self.query_timeout.as_secs()),
                )
            })?
            .map_err(query_error)?;

        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|column| column.name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let rows = rows
            .iter()
            .map(row_values)
            .collect::<Result<Vec<_>>>()?;

        Ok(ResultSet::new(columns, rows))
    }

    async fn close(self) -> Result<()> {
        self.connection
            .close()
            .await
            .map_err(|error| GatewayError::query(ExecutionFailure::ConnectionLost, error.to_string()))
    }
}

/// Convert every column of a PostgreSQL row into a [`CellValue`]
fn row_values(row: &PgRow) -> Result<Vec<CellValue>> {
    (0..row.columns().len())
        .map(|index| column_value(row, index))
        .collect()
}

fn decode_error(error: sqlx::Error) -> GatewayError {
    GatewayError::query(ExecutionFailure::Driver, error.to_string())
}

/// Decode one column according to the type the server reported for it
fn column_value(row: &PgRow, index: usize) -> Result<CellValue> {
    if row.try_get_raw(index).map_err(decode_error)?.is_null() {
        return Ok(CellValue::Null);
    }

    let type_name = row.columns()[index].type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOL" => CellValue::Bool(row.try_get::<bool, _>(index).map_err(decode_error)?),
        "INT2" => CellValue::Int(row.try_get::<i16, _>(index).map_err(decode_error)?.into()),
        "INT4" => CellValue::Int(row.try_get::<i32, _>(index).map_err(decode_error)?.into()),
        "INT8" => CellValue::Int(row.try_get::<i64, _>(index).map_err(decode_error)?),
        "FLOAT4" => CellValue::Float(row.try_get::<f32, _>(index).map_err(decode_error)?.into()),
        "FLOAT8" => CellValue::Float(row.try_get::<f64, _>(index).map_err(decode_error)?),
        "NUMERIC" => CellValue::Decimal(
            row.try_get::<BigDecimal, _>(index)
                .map_err(decode_error)?
                .to_string(),
        ),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
            CellValue::Text(row.try_get::<String, _>(index).map_err(decode_error)?)
        }
        "UUID" => CellValue::Text(row.try_get::<Uuid, _>(index).map_err(decode_error)?.to_string()),
        "DATE" => CellValue::Date(row.try_get::<NaiveDate, _>(index).map_err(decode_error)?),
        "TIME" => CellValue::Time(row.try_get::<NaiveTime, _>(index).map_err(decode_error)?),
        "TIMESTAMP" => {
            CellValue::Timestamp(row.try_get::<NaiveDateTime, _>(index).map_err(decode_error)?)
        }
        "TIMESTAMPTZ" => {
            CellValue::TimestampTz(row.try_get::<DateTime<Utc>, _>(index).map_err(decode_error)?)
        }
        "JSON" | "JSONB" => {
            CellValue::Json(row.try_get::<serde_json::Value, _>(index).map_err(decode_error)?)
        }
        "BYTEA" => CellValue::Binary(row.try_get::<Vec<u8>, _>(index).map_err(decode_error)?),
        "INTERVAL" => {
            let interval = row.try_get::<PgInterval, _>(index).map_err(decode_error)?;
            CellValue::Json(serde_json::json!({
                "months": interval.months,
                "days": interval.days,
                "microseconds": interval.microseconds,
            }))
        }
        "MONEY" => CellValue::Decimal(
            row.try_get::<PgMoney, _>(index)
                .map_err(decode_error)?
                .to_bigdecimal(2)
                .to_string(),
        ),
        "OID" => CellValue::Int(row.try_get::<Oid, _>(index).map_err(decode_error)?.0.into()),
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => CellValue::Json(serde_json::json!(row
            .try_get::<Vec<String>, _>(index)
            .map_err(decode_error)?)),
        "BOOL[]" => CellValue::Json(serde_json::json!(row
            .try_get::<Vec<bool>, _>(index)
            .map_err(decode_error)?)),
        "INT2[]" => CellValue::Json(serde_json::json!(row
            .try_get::<Vec<i16>, _>(index)
            .map_err(decode_error)?)),
        "INT4[]" => CellValue::Json(serde_json::json!(row
            .try_get::<Vec<i32>, _>(index)
            .map_err(decode_error)?)),
        "INT8[]" => CellValue::Json(serde_json::json!(row
            .try_get::<Vec<i64>, _>(index)
            .map_err(decode_error)?)),
        "FLOAT4[]" => CellValue::Json(serde_json::json!(row
            .try_get::<Vec<f32>, _>(index)
            .map_err(decode_error)?)),
        "FLOAT8[]" => CellValue::Json(serde_json::json!(row
            .try_get::<Vec<f64>, _>(index)
            .map_err(decode_error)?)),
        "NUMERIC[]" => CellValue::Json(serde_json::json!(row
            .try_get::<Vec<BigDecimal>, _>(index)
            .map_err(decode_error)?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>())),
        "UUID[]" => CellValue::Json(serde_json::json!(row
            .try_get::<Vec<Uuid>, _>(index)
            .map_err(decode_error)?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>())),
        _ => {
            let column = &row.columns()[index];
            let is_enum = matches!(column.type_info().kind(), PgTypeKind::Enum(_));
            let raw = row.try_get_raw(index).map_err(decode_error)?;
            let bytes = raw
                .as_bytes()
                .map_err(|error| GatewayError::query(ExecutionFailure::Driver, error.to_string()))?;

            if !is_enum {
                tracing::debug!(
                    column = column.name(),
                    type_name = %type_name,
                    "No typed decoder for column, returning raw bytes"
                );
            }
            fallback_value(is_enum, bytes)
        }
    };

    Ok(value)
}

/// Value for a column type without a typed decoder
///
/// Enum values arrive as their label. Every other type keeps its wire bytes,
/// which serialize as base64.
fn fallback_value(is_enum: bool, bytes: &[u8]) -> CellValue {
    if is_enum {
        CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
    } else {
        CellValue::Binary(bytes.to_vec())
    }
}

/// Classify a failure to establish a session
///
/// Everything here is a connection problem, including authentication
/// failures and unknown databases.
fn connection_error(error: sqlx::Error) -> GatewayError {
    let message = match &error {
        sqlx::Error::Database(database_error) => match database_error.code().as_deref() {
            Some("28P01") | Some("28000") => "authentication failed".to_string(),
            Some("3D000") => "database does not exist".to_string(),
            _ => database_error.message().to_string(),
        },
        sqlx::Error::Io(io_error) => format!("I/O error: {}", io_error),
        sqlx::Error::Tls(tls_error) => format!("TLS error: {}", tls_error),
        other => other.to_string(),
    };

    GatewayError::Connection(message)
}

/// Map a SQLSTATE to the execution failure it signals
fn failure_for_sql_state(code: &str) -> ExecutionFailure {
    match code {
        // undefined_table, invalid_schema_name, undefined_column, undefined_object
        "42P01" | "3F000" | "42703" | "42704" => ExecutionFailure::UndefinedObject,
        "42501" => ExecutionFailure::PermissionDenied,
        "57014" => ExecutionFailure::Timeout,
        // syntax_error, undefined_parameter, indeterminate_datatype, undefined_function
        "42601" | "42P02" | "42P18" | "42883" => ExecutionFailure::BuilderDefect,
        "57P01" | "57P02" | "57P03" => ExecutionFailure::ConnectionLost,
        code if code.starts_with("08") => ExecutionFailure::ConnectionLost,
        _ => ExecutionFailure::Driver,
    }
}

/// Classify a failure of a statement on an established session
fn query_error(error: sqlx::Error) -> GatewayError {
    match error {
        sqlx::Error::Database(database_error) => {
            let cause = database_error
                .code()
                .as_deref()
                .map(failure_for_sql_state)
                .unwrap_or(ExecutionFailure::Driver);
            GatewayError::query(cause, database_error.message())
        }
        sqlx::Error::Io(io_error) => {
            GatewayError::query(ExecutionFailure::ConnectionLost, format!("I/O error: {}", io_error))
        }
        sqlx::Error::Tls(_) | sqlx::Error::Protocol(_) | sqlx::Error::WorkerCrashed => {
            GatewayError::query(ExecutionFailure::ConnectionLost, error.to_string())
        }
        other => GatewayError::query(ExecutionFailure::Driver, other.to_string()),
    }
}
