use axum::{routing::get, Json};
use unihub_campus::Role;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    serialized::{ToSerialized, User},
    session::Session,
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "users",
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, body = Vec<User>, description = "All accounts, passwords stripped")
    )
)]
async fn list_users(session: Session, context: ServerContext) -> ServerResult<Json<Vec<User>>> {
    session.require(&[Role::SysAdmin])?;

    let users = context.campus.admin.list_users().await?;

    Ok(Json(users.to_serialized()))
}

pub fn router() -> Router {
    Router::new().route("/", get(list_users))
}
