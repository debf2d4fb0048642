//! Schema listing endpoint

use axum::{
    extract::State,
    response::Json,
};

use crate::api::{finish, open_session, CoordinatesQuery, GatewayState};
use crate::database::traits::ConnectionProvider;
use crate::error::Result;
use crate::executor;
use crate::schema::SchemasResponse;

/// Handler for GET /schemas
///
/// Returns every schema visible to the connecting role.
///
/// Query parameters:
/// - db_host, db_port (default 5432), db_user, db_password, db_name
pub async fn list_schemas_handler<P: ConnectionProvider>(
    State(state): State<GatewayState<P>>,
    coordinates: CoordinatesQuery,
) -> Result<Json<SchemasResponse>> {
    let mut session = open_session(state.provider.as_ref(), coordinates).await?;
    let outcome = executor::list_schemas(&mut session).await;
    let schemas = finish(session, outcome).await?;

    Ok(Json(SchemasResponse { schemas }))
}
