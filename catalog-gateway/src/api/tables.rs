//! Table listing endpoints

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
use crate::identifier::{validate, IdentifierKind};
use crate::schema::{CountResponse, TablesQuery, TablesResponse};

/// Handler for GET /tables
///
/// Returns one page of table names in a schema, ordered by name.
///
/// Query parameters:
/// - schema: Schema to list
/// - page: 1-based page number (default: 1)
/// - per_page: Page size (default: 10, clamped to the configured maximum)
/// - db_host, db_port, db_user, db_password, db_name
pub async fn list_tables_handler<P: ConnectionProvider>(
    State(state): State<GatewayState<P>>,
    coordinates: CoordinatesQuery,
    query: ParamsQuery<TablesQuery>,
) -> Result<Json<TablesResponse>> {
    let query = request_params("list_tables", IdentifierKind::Schema, query)?;
    let (page, window) = page_window(
        "list_tables",
        &state.pagination,
        query.page.as_deref(),
        query.per_page.as_deref(),
    )?;
    let schema = validate(&query.schema, IdentifierKind::Schema)
        .inspect_err(|error| log_rejection("list_tables", error))?;

    let mut session = open_session(state.provider.as_ref(), coordinates).await?;
    let outcome = executor::list_tables(&mut session, &schema, window).await;
    let tables = finish(session, outcome).await?;

    Ok(Json(TablesResponse {
        tables,
        page,
        per_page: window.limit,
    }))
}

/// Handler for GET /tables/count
///
/// Returns the number of tables in a schema. Paging parameters are ignored.
pub async fn count_tables_handler<P: ConnectionProvider>(
    State(state): State<GatewayState<P>>,
    coordinates: CoordinatesQuery,
    query: ParamsQuery<TablesQuery>,
) -> Result<Json<CountResponse>> {
    let query = request_params("count_tables", IdentifierKind::Schema, query)?;
    let schema = validate(&query.schema, IdentifierKind::Schema)
        .inspect_err(|error| log_rejection("count_tables", error))?;

    let mut session = open_session(state.provider.as_ref(), coordinates).await?;
    let outcome = executor::count_tables(&mut session, &schema).await;
    let count = finish(session, outcome).await?;

    Ok(Json(CountResponse { count }))
}
