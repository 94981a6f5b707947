use axum::{
    extract::Path,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json,
};
use serde_json::{json, Value};
use unihub_campus::{NewEvent, Role, UpdatedEvent, ANY_ROLE};

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::{NewEventSchema, UpdateEventSchema, ValidatedJson},
    serialized::{Event, ToSerialized},
    session::Session,
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/events",
    tag = "events",
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, body = Vec<Event>)
    )
)]
async fn list_events(session: Session, context: ServerContext) -> ServerResult<Json<Vec<Event>>> {
    session.require(&[Role::ClubAdmin])?;

    let events = context.campus.events.list_all().await?;

    Ok(Json(events.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/events/browse",
    tag = "events",
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, body = Vec<Event>)
    )
)]
async fn browse_events(session: Session, context: ServerContext) -> ServerResult<Json<Vec<Event>>> {
    session.require(&[Role::Student])?;

    let events = context.campus.events.list_all().await?;

    Ok(Json(events.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/events/{id}",
    tag = "events",
    params(("id" = i32, Path, description = "Event id")),
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, body = Event),
        (status = 404, description = "No such event")
    )
)]
async fn event_by_id(
    session: Session,
    context: ServerContext,
    Path(event_id): Path<i32>,
) -> ServerResult<Json<Event>> {
    session.require(ANY_ROLE)?;

    let event = context.campus.events.by_id(event_id).await?;

    Ok(Json(event.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/events",
    tag = "events",
    request_body = NewEventSchema,
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 201, body = Event)
    )
)]
async fn create_event(
    session: Session,
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<NewEventSchema>,
) -> ServerResult<(StatusCode, Json<Event>)> {
    let organizer = session.require(&[Role::ClubAdmin])?;

    let event = context
        .campus
        .events
        .create(NewEvent {
            title: body.title,
            organizer_id: organizer.id,
            description: body.description,
            event_date: body.event_date,
            event_time: body.event_time,
            duration_minutes: body.duration_minutes,
            category: body.category,
            address: body.address,
            room: body.room,
            registration_deadline: body.registration_deadline,
            capacity: body.capacity,
            image_url: body.image_url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(event.to_serialized())))
}

#[utoipa::path(
    put,
    path = "/v1/events/{id}",
    tag = "events",
    params(("id" = i32, Path, description = "Event id")),
    request_body = UpdateEventSchema,
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, body = Event),
        (status = 404, description = "No such event, or not the organizer")
    )
)]
async fn update_event(
    session: Session,
    context: ServerContext,
    Path(event_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<UpdateEventSchema>,
) -> ServerResult<Json<Event>> {
    let organizer = session.require(&[Role::ClubAdmin])?;

    let event = context
        .campus
        .events
        .update(
            UpdatedEvent {
                id: event_id,
                title: body.title,
                description: body.description,
                event_date: body.event_date,
                event_time: body.event_time,
                duration_minutes: body.duration_minutes,
                category: body.category,
                address: body.address,
                room: body.room,
                registration_deadline: body.registration_deadline,
                capacity: body.capacity,
                image_url: body.image_url,
            },
            organizer.id,
        )
        .await?;

    Ok(Json(event.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/events/{id}",
    tag = "events",
    params(("id" = i32, Path, description = "Event id")),
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, description = "Event deleted"),
        (status = 404, description = "No such event, or not the organizer")
    )
)]
async fn delete_event(
    session: Session,
    context: ServerContext,
    Path(event_id): Path<i32>,
) -> ServerResult<Json<Value>> {
    let user = session.require(&[Role::ClubAdmin, Role::SysAdmin])?;

    // sysAdmins may delete any event; organizers only their own
    let organizer_id = (session.role() != Role::SysAdmin).then_some(user.id);

    context.campus.events.delete(event_id, organizer_id).await?;

    Ok(Json(json!({ "message": "Event deleted successfully" })))
}

#[utoipa::path(
    get,
    path = "/v1/events/my-events",
    tag = "events",
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, body = Vec<Event>, description = "Events organized by the current user")
    )
)]
async fn my_events(session: Session, context: ServerContext) -> ServerResult<Json<Vec<Event>>> {
    let organizer = session.require(&[Role::ClubAdmin])?;

    let events = context.campus.events.by_organizer(organizer.id).await?;

    Ok(Json(events.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/events/{id}/register",
    tag = "events",
    params(("id" = i32, Path, description = "Event id")),
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, description = "Registered"),
        (status = 400, description = "Already registered, event full, or registration closed")
    )
)]
async fn register_for_event(
    session: Session,
    context: ServerContext,
    Path(event_id): Path<i32>,
) -> ServerResult<Json<Value>> {
    let student = session.require(&[Role::Student])?;

    context.campus.events.register(student.id, event_id).await?;

    Ok(Json(json!({ "message": "Registered successfully" })))
}

#[utoipa::path(
    post,
    path = "/v1/events/{id}/unregister",
    tag = "events",
    params(("id" = i32, Path, description = "Event id")),
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, description = "Unregistered"),
        (status = 404, description = "Not registered for this event")
    )
)]
async fn unregister_from_event(
    session: Session,
    context: ServerContext,
    Path(event_id): Path<i32>,
) -> ServerResult<Json<Value>> {
    let student = session.require(&[Role::Student])?;

    context.campus.events.unregister(student.id, event_id).await?;

    Ok(Json(json!({ "message": "Unregistered successfully" })))
}

#[utoipa::path(
    get,
    path = "/v1/events/participated/list",
    tag = "events",
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, body = Vec<Event>, description = "Events the current user registered for")
    )
)]
async fn participated_events(
    session: Session,
    context: ServerContext,
) -> ServerResult<Json<Vec<Event>>> {
    let student = session.require(&[Role::Student])?;

    let events = context.campus.events.participated(student.id).await?;

    Ok(Json(events.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_events))
        .route("/", post(create_event))
        .route("/browse", get(browse_events))
        .route("/my-events", get(my_events))
        .route("/participated/list", get(participated_events))
        .route("/:id", get(event_by_id))
        .route("/:id", put(update_event))
        .route("/:id", delete(delete_event))
        .route("/:id/register", post(register_for_event))
        .route("/:id/unregister", post(unregister_from_event))
}
