//! Catalog query execution
//!
//! Stateless functions that build a query, run it over the caller's session
//! and shape the [`ResultSet`] into schemas, table names, rows or counts.
//! Each takes the session explicitly; nothing here holds a connection.

use crate::database::traits::{CatalogSession, ResultSet};
use crate::error::{ExecutionFailure, GatewayError, Result};
use crate::identifier::{self, Identifier, IdentifierKind, QualifiedTable};
use crate::pagination::PageWindow;
use crate::query::{self, BuiltQuery};
use crate::schema::{CellValue, RowRecord, SchemaDescriptor};

/// Run a built query and log failures by cause
pub async fn execute<S: CatalogSession>(session: &mut S, query: &BuiltQuery) -> Result<ResultSet> {
    match session.fetch(query).await {
        Ok(result) => {
            tracing::debug!(kind = ?query.kind, rows = result.rows.len(), "Query executed");
            Ok(result)
        }
        Err(error) => {
            log_failure(query, &error);
            Err(error)
        }
    }
}

fn log_failure(query: &BuiltQuery, error: &GatewayError) {
    match error {
        GatewayError::QueryExecution {
            cause: ExecutionFailure::BuilderDefect,
            ..
        } => {
            tracing::error!(kind = ?query.kind, sql = %query.sql, error = %error, "Built query was rejected by the server");
        }
        GatewayError::QueryExecution {
            cause: ExecutionFailure::UndefinedObject | ExecutionFailure::PermissionDenied,
            ..
        } => {
            tracing::debug!(kind = ?query.kind, error = %error, "Query target unavailable");
        }
        _ => {
            tracing::warn!(kind = ?query.kind, error = %error, "Query failed");
        }
    }
}

fn defect(message: impl Into<String>) -> GatewayError {
    GatewayError::query(ExecutionFailure::BuilderDefect, message)
}

/// Extract the single non-negative integer of an aggregate query
pub fn scalar_count(result: &ResultSet) -> Result<u64> {
    let row = match result.rows.as_slice() {
        [row] => row,
        [] => return Err(defect("count query returned no rows")),
        rows => {
            return Err(defect(format!(
                "count query returned {} rows",
                rows.len()
            )))
        }
    };

    match row.as_slice() {
        [CellValue::Int(count)] => u64::try_from(*count)
            .map_err(|_| defect(format!("count query returned negative value {}", count))),
        [_] => Err(defect("count query returned a non-integer value")),
        values => Err(defect(format!(
            "count query returned {} columns",
            values.len()
        ))),
    }
}

/// Take the single text column of every row
fn text_column(result: &ResultSet, column: &str) -> Result<Vec<String>> {
    let index = result
        .columns
        .iter()
        .position(|name| name == column)
        .or(if result.rows.is_empty() { Some(0) } else { None })
        .ok_or_else(|| defect(format!("result has no {} column", column)))?;

    result
        .rows
        .iter()
        .map(|row| match row.get(index) {
            Some(CellValue::Text(text)) => Ok(text.clone()),
            _ => Err(defect(format!("{} is not a text value", column))),
        })
        .collect()
}

/// Pair every row with the result's column names
fn records(result: ResultSet) -> Result<Vec<RowRecord>> {
    let ResultSet { columns, rows } = result;

    rows.into_iter()
        .map(|values| {
            if values.len() != columns.len() {
                return Err(defect(format!(
                    "row has {} values for {} columns",
                    values.len(),
                    columns.len()
                )));
            }
            Ok(RowRecord::new(columns.iter().cloned().zip(values).collect()))
        })
        .collect()
}

/// List every schema visible to the session's role
pub async fn list_schemas<S: CatalogSession>(session: &mut S) -> Result<Vec<SchemaDescriptor>> {
    let result = execute(session, &query::list_schemas()).await?;
    Ok(text_column(&result, "schema_name")?
        .into_iter()
        .map(|schema_name| SchemaDescriptor { schema_name })
        .collect())
}

/// One page of table names in `schema`, ascending by name
pub async fn list_tables<S: CatalogSession>(
    session: &mut S,
    schema: &Identifier,
    window: PageWindow,
) -> Result<Vec<String>> {
    let result = execute(session, &query::list_tables(schema, window)).await?;
    text_column(&result, "table_name")
}

pub async fn count_tables<S: CatalogSession>(session: &mut S, schema: &Identifier) -> Result<u64> {
    let result = execute(session, &query::count_tables(schema)).await?;
    scalar_count(&result)
}

/// Primary key columns usable as a stable sort key
///
/// Returns an empty list when the table has no primary key or when any key
/// column name falls outside the identifier grammar. Fails when the table
/// does not exist.
pub async fn stable_order<S: CatalogSession>(
    session: &mut S,
    table: &QualifiedTable,
) -> Result<Vec<Identifier>> {
    let result = execute(session, &query::primary_key(table)).await?;
    let names = text_column(&result, "column_name")?;

    let columns: Option<Vec<Identifier>> = names
        .iter()
        .map(|name| {
            identifier::validate(name, IdentifierKind::Column)
                .ok()
                .filter(|column| column.as_str() == name)
        })
        .collect();

    match columns {
        Some(columns) => Ok(columns),
        None => {
            tracing::debug!(table = %table, "Primary key not usable for ordering, rows stay unordered");
            Ok(Vec::new())
        }
    }
}

/// One page of rows from `table`
///
/// Rows are ordered by the primary key when [`stable_order`] finds one, so
/// repeated reads of an unchanged table page identically.
pub async fn list_rows<S: CatalogSession>(
    session: &mut S,
    table: &QualifiedTable,
    window: PageWindow,
) -> Result<(Vec<String>, Vec<RowRecord>)> {
    let order_by = stable_order(session, table).await?;
    let result = execute(session, &query::list_rows(table, &order_by, window)).await?;
    let columns = result.columns.clone();
    Ok((columns, records(result)?))
}

pub async fn count_rows<S: CatalogSession>(session: &mut S, table: &QualifiedTable) -> Result<u64> {
    let result = execute(session, &query::count_rows(table)).await?;
    scalar_count(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{BoundValue, QueryKind};
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Replays canned results and records every query it was given
    #[derive(Default)]
    struct ScriptedSession {
        replies: VecDeque<Result<ResultSet>>,
        seen: Vec<BuiltQuery>,
    }

    impl ScriptedSession {
        fn replying(replies: Vec<Result<ResultSet>>) -> Self {
            Self {
                replies: replies.into(),
                seen: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl CatalogSession for ScriptedSession {
        async fn fetch(&mut self, query: &BuiltQuery) -> Result<ResultSet> {
            self.seen.push(query.clone());
            self.replies
                .pop_front()
                .unwrap_or_else(|| Ok(ResultSet::default()))
        }

        async fn close(self) -> Result<()> {
            Ok(())
        }
    }

    fn texts(column: &str, values: &[&str]) -> ResultSet {
        ResultSet::new(
            vec![column.to_string()],
            values
                .iter()
                .map(|value| vec![CellValue::Text(value.to_string())])
                .collect(),
        )
    }

    fn count(value: i64) -> ResultSet {
        ResultSet::new(vec!["count".to_string()], vec![vec![CellValue::Int(value)]])
    }

    fn public() -> Identifier {
        identifier::validate("public", IdentifierKind::Schema).unwrap()
    }

    #[tokio::test]
    async fn test_list_schemas() {
        let mut session = ScriptedSession::replying(vec![Ok(texts(
            "schema_name",
            &["public", "information_schema"],
        ))]);

        let schemas = list_schemas(&mut session).await.unwrap();
        assert_eq!(
            schemas,
            vec![
                SchemaDescriptor {
                    schema_name: "public".to_string()
                },
                SchemaDescriptor {
                    schema_name: "information_schema".to_string()
                },
            ]
        );
        assert_eq!(session.seen[0].kind, QueryKind::ListSchemas);
    }

    #[tokio::test]
    async fn test_list_and_count_tables() {
        let mut session = ScriptedSession::replying(vec![Ok(texts("table_name", &["a", "b", "c"])), Ok(count(3))]);
        let window = PageWindow { limit: 5, offset: 0 };

        let tables = list_tables(&mut session, &public(), window).await.unwrap();
        assert_eq!(tables, vec!["a", "b", "c"]);

        let total = count_tables(&mut session, &public()).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(session.seen[1].kind, QueryKind::CountTables);
    }

    #[tokio::test]
    async fn test_empty_page_has_no_columns() {
        let mut session = ScriptedSession::replying(vec![Ok(ResultSet::default())]);
        let tables = list_tables(&mut session, &public(), PageWindow { limit: 5, offset: 50 })
            .await
            .unwrap();
        assert!(tables.is_empty());
    }

    #[tokio::test]
    async fn test_list_rows_requests_window_and_orders_by_key() {
        let rows = ResultSet::new(
            vec!["id".to_string(), "name".to_string()],
            (21..=25)
                .map(|id| vec![CellValue::Int(id), CellValue::Text(format!("user {}", id))])
                .collect(),
        );
        let mut session = ScriptedSession::replying(vec![Ok(texts("column_name", &["id"])), Ok(rows)]);
        let table = QualifiedTable::parse(None, "users").unwrap();

        let (columns, records) = list_rows(&mut session, &table, PageWindow { limit: 10, offset: 20 })
            .await
            .unwrap();

        assert_eq!(columns, vec!["id", "name"]);
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].get("id"), Some(&CellValue::Int(21)));
        assert_eq!(records[4].get("name"), Some(&CellValue::Text("user 25".to_string())));

        let row_query = &session.seen[1];
        assert_eq!(row_query.kind, QueryKind::ListRows);
        assert!(row_query.sql.contains("ORDER BY \"id\""));
        assert_eq!(
            row_query.params,
            vec![BoundValue::BigInt(10), BoundValue::BigInt(20)]
        );
    }

    #[tokio::test]
    async fn test_unusable_key_leaves_rows_unordered() {
        let mut session = ScriptedSession::replying(vec![Ok(texts("column_name", &["Order Id"]))]);
        let table = QualifiedTable::parse(None, "legacy").unwrap();

        list_rows(&mut session, &table, PageWindow { limit: 1, offset: 0 })
            .await
            .unwrap();
        assert!(!session.seen[1].sql.contains("ORDER BY"));
    }

    #[tokio::test]
    async fn test_mixed_case_key_is_not_folded() {
        let mut session = ScriptedSession::replying(vec![Ok(texts("column_name", &["UserId"]))]);
        let table = QualifiedTable::parse(None, "accounts").unwrap();

        let order = stable_order(&mut session, &table).await.unwrap();
        assert!(order.is_empty());
    }

    #[tokio::test]
    async fn test_missing_table_is_execution_error() {
        let mut session = ScriptedSession::replying(vec![Err(GatewayError::query(
            ExecutionFailure::UndefinedObject,
            "relation \"orders\" does not exist",
        ))]);
        let table = QualifiedTable::parse(None, "orders").unwrap();

        let error = count_rows(&mut session, &table).await.unwrap_err();
        assert!(matches!(
            error,
            GatewayError::QueryExecution {
                cause: ExecutionFailure::UndefinedObject,
                ..
            }
        ));
    }

    #[test]
    fn test_scalar_count_shape_checks() {
        assert_eq!(scalar_count(&count(25)).unwrap(), 25);

        let empty = ResultSet::new(vec!["count".to_string()], vec![]);
        let two_rows = ResultSet::new(
            vec!["count".to_string()],
            vec![vec![CellValue::Int(1)], vec![CellValue::Int(2)]],
        );
        let two_columns = ResultSet::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![CellValue::Int(1), CellValue::Int(2)]],
        );
        let text = texts("count", &["3"]);

        for result in [empty, two_rows, two_columns, text, count(-1)] {
            assert!(matches!(
                scalar_count(&result),
                Err(GatewayError::QueryExecution {
                    cause: ExecutionFailure::BuilderDefect,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_records_reject_ragged_rows() {
        let result = ResultSet::new(vec!["a".to_string()], vec![vec![CellValue::Null, CellValue::Null]]);
        assert!(records(result).is_err());
    }
}
