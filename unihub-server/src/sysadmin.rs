use axum::{
    extract::Path,
    routing::{delete, get, post},
    Json,
};
use log::info;
use serde_json::{json, Value};
use unihub_campus::Role;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    serialized::{Application, ToSerialized},
    session::Session,
    Router,
};

#[utoipa::path(
    post,
    path = "/v1/sysadmin/ban/{id}",
    tag = "sysadmin",
    params(("id" = i32, Path, description = "User id")),
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, description = "User banned"),
        (status = 403, description = "Target is a sysAdmin"),
        (status = 404, description = "No such user")
    )
)]
async fn ban_user(
    session: Session,
    context: ServerContext,
    Path(user_id): Path<i32>,
) -> ServerResult<Json<Value>> {
    let actor = session.require(&[Role::SysAdmin])?;

    context.campus.admin.ban_user(user_id).await?;

    info!("SysAdmin {} banned user {}", actor.id, user_id);

    Ok(Json(json!({ "message": "User banned successfully" })))
}

#[utoipa::path(
    post,
    path = "/v1/sysadmin/approve-club-admin/{id}",
    tag = "sysadmin",
    params(("id" = i32, Path, description = "Application id")),
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, description = "Application approved"),
        (status = 400, description = "Application is not pending"),
        (status = 404, description = "No such application")
    )
)]
async fn approve_club_admin(
    session: Session,
    context: ServerContext,
    Path(application_id): Path<i32>,
) -> ServerResult<Json<Value>> {
    let reviewer = session.require(&[Role::SysAdmin])?;

    context
        .campus
        .admin
        .approve_application(application_id, reviewer.id)
        .await?;

    Ok(Json(json!({ "message": "Club admin request approved" })))
}

#[utoipa::path(
    post,
    path = "/v1/sysadmin/add-sysadmin/{id}",
    tag = "sysadmin",
    params(("id" = i32, Path, description = "User id")),
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, description = "User promoted"),
        (status = 404, description = "No such user")
    )
)]
async fn add_sys_admin(
    session: Session,
    context: ServerContext,
    Path(user_id): Path<i32>,
) -> ServerResult<Json<Value>> {
    let actor = session.require(&[Role::SysAdmin])?;

    context.campus.admin.promote_to_sys_admin(user_id).await?;

    info!("SysAdmin {} promoted user {}", actor.id, user_id);

    Ok(Json(json!({ "message": "User promoted to sysAdmin successfully" })))
}

#[utoipa::path(
    delete,
    path = "/v1/sysadmin/event/{id}",
    tag = "sysadmin",
    params(("id" = i32, Path, description = "Event id")),
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, description = "Event deleted"),
        (status = 404, description = "No such event")
    )
)]
async fn delete_any_event(
    session: Session,
    context: ServerContext,
    Path(event_id): Path<i32>,
) -> ServerResult<Json<Value>> {
    let actor = session.require(&[Role::SysAdmin])?;

    context.campus.events.delete(event_id, None).await?;

    info!("SysAdmin {} deleted event {}", actor.id, event_id);

    Ok(Json(json!({ "message": "Event deleted successfully" })))
}

#[utoipa::path(
    get,
    path = "/v1/sysadmin/applications",
    tag = "sysadmin",
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, body = Vec<Application>, description = "Applications awaiting review")
    )
)]
async fn pending_applications(
    session: Session,
    context: ServerContext,
) -> ServerResult<Json<Vec<Application>>> {
    session.require(&[Role::SysAdmin])?;

    let applications = context.campus.admin.pending_applications().await?;

    Ok(Json(applications.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/ban/:id", post(ban_user))
        .route("/approve-club-admin/:id", post(approve_club_admin))
        .route("/add-sysadmin/:id", post(add_sys_admin))
        .route("/event/:id", delete(delete_any_event))
        .route("/applications", get(pending_applications))
}
