//! SQL construction for catalog lookups
//!
//! Every query is a [`BuiltQuery`]: SQL text plus the values bound to its
//! placeholders. Literal values, including LIMIT and OFFSET, always travel as
//! [`BoundValue`]s. The only text spliced into SQL is an
//! [`Identifier`](crate::identifier::Identifier) rendering.

use crate::identifier::{Identifier, QualifiedTable};
use crate::pagination::PageWindow;

/// Which lookup a query performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    ListSchemas,
    ListTables,
    CountTables,
    ListRows,
    CountRows,
    PrimaryKey,
}

/// A value passed through the driver's parameter binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundValue {
    Text(String),
    BigInt(i64),
}

/// SQL text together with its bound values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub kind: QueryKind,
    pub sql: String,
    pub params: Vec<BoundValue>,
}

impl BuiltQuery {
    fn new(kind: QueryKind, sql: impl Into<String>) -> Self {
        Self {
            kind,
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    fn bind(mut self, value: BoundValue) -> Self {
        self.params.push(value);
        self
    }

    /// The bound (limit, offset) pair, if this query pages
    pub fn window(&self) -> Option<PageWindow> {
        match (self.kind, self.params.as_slice()) {
            (QueryKind::ListTables, [_, BoundValue::BigInt(limit), BoundValue::BigInt(offset)])
            | (QueryKind::ListRows, [BoundValue::BigInt(limit), BoundValue::BigInt(offset)]) => {
                Some(PageWindow {
                    limit: *limit,
                    offset: *offset,
                })
            }
            _ => None,
        }
    }
}

/// All schemas visible to the connected role
pub fn list_schemas() -> BuiltQuery {
    BuiltQuery::new(
        QueryKind::ListSchemas,
        "SELECT schema_name::text AS schema_name FROM information_schema.schemata",
    )
}

/// One page of table names in a schema, ordered by name
pub fn list_tables(schema: &Identifier, window: PageWindow) -> BuiltQuery {
    BuiltQuery::new(
        QueryKind::ListTables,
        "SELECT table_name::text AS table_name \
         FROM information_schema.tables \
         WHERE table_schema = $1 \
         ORDER BY table_name \
         LIMIT $2 OFFSET $3",
    )
    .bind(BoundValue::Text(schema.as_str().to_string()))
    .bind(BoundValue::BigInt(window.limit))
    .bind(BoundValue::BigInt(window.offset))
}

/// Number of tables in a schema
pub fn count_tables(schema: &Identifier) -> BuiltQuery {
    BuiltQuery::new(
        QueryKind::CountTables,
        "SELECT count(*) AS count FROM information_schema.tables WHERE table_schema = $1",
    )
    .bind(BoundValue::Text(schema.as_str().to_string()))
}

/// Primary key columns of a table, in key order
///
/// The rendered table name is bound and cast to `regclass`, so a missing
/// table surfaces as an undefined-table error from the server.
pub fn primary_key(table: &QualifiedTable) -> BuiltQuery {
    BuiltQuery::new(
        QueryKind::PrimaryKey,
        "SELECT a.attname::text AS column_name \
         FROM pg_catalog.pg_index i \
         JOIN pg_catalog.pg_attribute a \
           ON a.attrelid = i.indrelid \
          AND a.attnum = ANY(i.indkey) \
         WHERE i.indrelid = $1::regclass \
           AND i.indisprimary \
         ORDER BY array_position(i.indkey::int2[], a.attnum)",
    )
    .bind(BoundValue::Text(table.render()))
}

/// One page of rows from a table
///
/// With an empty `order_by` the rows come back in whatever order the server
/// scans them, which is not stable across writes.
pub fn list_rows(table: &QualifiedTable, order_by: &[Identifier], window: PageWindow) -> BuiltQuery {
    let mut sql = format!("SELECT * FROM {}", table.render());

    if !order_by.is_empty() {
        let columns: Vec<String> = order_by.iter().map(Identifier::render).collect();
        sql.push_str(&format!(" ORDER BY {}", columns.join(", ")));
    }

    sql.push_str(" LIMIT $1 OFFSET $2");

    BuiltQuery::new(QueryKind::ListRows, sql)
        .bind(BoundValue::BigInt(window.limit))
        .bind(BoundValue::BigInt(window.offset))
}

/// Number of rows in a table
pub fn count_rows(table: &QualifiedTable) -> BuiltQuery {
    BuiltQuery::new(
        QueryKind::CountRows,
        format!("SELECT count(*) AS count FROM {}", table.render()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{validate, IdentifierKind};

    fn schema(name: &str) -> Identifier {
        validate(name, IdentifierKind::Schema).unwrap()
    }

    fn column(name: &str) -> Identifier {
        validate(name, IdentifierKind::Column).unwrap()
    }

    #[test]
    fn test_list_schemas_has_no_params() {
        let query = list_schemas();
        assert_eq!(query.kind, QueryKind::ListSchemas);
        assert!(query.sql.contains("information_schema.schemata"));
        assert!(query.params.is_empty());
        assert_eq!(query.window(), None);
    }

    #[test]
    fn test_list_tables_binds_everything() {
        let query = list_tables(&schema("Public"), PageWindow { limit: 5, offset: 10 });

        assert!(query.sql.contains("table_schema = $1"));
        assert!(query.sql.contains("ORDER BY table_name"));
        assert!(query.sql.contains("LIMIT $2 OFFSET $3"));
        assert!(!query.sql.contains("public"));
        assert_eq!(
            query.params,
            vec![
                BoundValue::Text("public".to_string()),
                BoundValue::BigInt(5),
                BoundValue::BigInt(10),
            ]
        );
        assert_eq!(query.window(), Some(PageWindow { limit: 5, offset: 10 }));
    }

    #[test]
    fn test_count_tables_is_unpaged() {
        let query = count_tables(&schema("public"));
        assert!(query.sql.contains("count(*)"));
        assert!(!query.sql.contains("LIMIT"));
        assert_eq!(query.params, vec![BoundValue::Text("public".to_string())]);
    }

    #[test]
    fn test_list_rows_interpolates_only_the_identifier() {
        let table = QualifiedTable::parse(None, "Orders").unwrap();
        let query = list_rows(&table, &[], PageWindow { limit: 10, offset: 20 });

        assert_eq!(query.sql, "SELECT * FROM \"orders\" LIMIT $1 OFFSET $2");
        assert_eq!(
            query.params,
            vec![BoundValue::BigInt(10), BoundValue::BigInt(20)]
        );
        assert_eq!(query.window(), Some(PageWindow { limit: 10, offset: 20 }));
    }

    #[test]
    fn test_list_rows_orders_by_key_columns() {
        let table = QualifiedTable::parse(Some("sales"), "order_items").unwrap();
        let query = list_rows(
            &table,
            &[column("order_id"), column("line")],
            PageWindow { limit: 1, offset: 0 },
        );

        assert_eq!(
            query.sql,
            "SELECT * FROM \"sales\".\"order_items\" ORDER BY \"order_id\", \"line\" LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_count_rows() {
        let table = QualifiedTable::parse(None, "users").unwrap();
        let query = count_rows(&table);
        assert_eq!(query.sql, "SELECT count(*) AS count FROM \"users\"");
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_primary_key_binds_rendered_name() {
        let table = QualifiedTable::parse(Some("public"), "users").unwrap();
        let query = primary_key(&table);
        assert!(query.sql.contains("$1::regclass"));
        assert_eq!(
            query.params,
            vec![BoundValue::Text("\"public\".\"users\"".to_string())]
        );
    }
}
