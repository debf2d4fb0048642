//! Row fetching endpoints with pagination

use axum::{
    extract::State,
    response::Json,
};

use crate::api::{
    finish, log_rejection, open_session, page_window, request_params, CoordinatesQuery,
    GatewayState, ParamsQuery,
};
use crate::database::traits::ConnectionProvider;
use crate::error::Result;
use crate::executor;
use crate::identifier::{IdentifierKind, QualifiedTable};
use crate::schema::{CountResponse, RowsResponse, TableDataQuery};

/// Handler for GET /table_data
///
/// Fetches one page of rows from a table. Rows are ordered by the table's
/// primary key when it has one.
///
/// Query parameters:
/// - table: Table to read
/// - schema: Schema of the table (optional, search_path when absent)
/// - page: 1-based page number (default: 1)
/// - per_page: Page size (default: 10, clamped to the configured maximum)
/// - db_host, db_port, db_user, db_password, db_name
pub async fn get_rows_handler<P: ConnectionProvider>(
    State(state): State<GatewayState<P>>,
    coordinates: CoordinatesQuery,
    query: ParamsQuery<TableDataQuery>,
) -> Result<Json<RowsResponse>> {
    let query = request_params("list_rows", IdentifierKind::Table, query)?;
    let (page, window) = page_window(
        "list_rows",
        &state.pagination,
        query.page.as_deref(),
        query.per_page.as_deref(),
    )?;
    let table = QualifiedTable::parse(query.schema.as_deref(), &query.table)
        .inspect_err(|error| log_rejection("list_rows", error))?;

    let mut session = open_session(state.provider.as_ref(), coordinates).await?;
    let outcome = executor::list_rows(&mut session, &table, window).await;
    let (columns, rows) = finish(session, outcome).await?;

    Ok(Json(RowsResponse {
        rows,
        columns,
        page,
        per_page: window.limit,
    }))
}

/// Handler for GET /table_data/count
///
/// Returns the total row count of a table. Paging parameters are ignored.
pub async fn count_rows_handler<P: ConnectionProvider>(
    State(state): State<GatewayState<P>>,
    coordinates: CoordinatesQuery,
    query: ParamsQuery<TableDataQuery>,
) -> Result<Json<CountResponse>> {
    let query = request_params("count_rows", IdentifierKind::Table, query)?;
    let table = QualifiedTable::parse(query.schema.as_deref(), &query.table)
        .inspect_err(|error| log_rejection("count_rows", error))?;

    let mut session = open_session(state.provider.as_ref(), coordinates).await?;
    let outcome = executor::count_rows(&mut session, &table).await;
    let count = finish(session, outcome).await?;

    Ok(Json(CountResponse { count }))
}
