use axum::{
    extract::Query,
    http::StatusCode,
    routing::{get, post},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};
use unihub_campus::{Credentials, NewAccount, RequestedRole};

use crate::{
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{LoginSchema, RegisterRoleSchema, RegisterSchema, ValidatedJson},
    serialized::{LoginResult, ToSerialized, User},
    session::{session_cookie, Session},
    Router,
};

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    tag = "auth",
    request_body = RegisterSchema,
    responses(
        (status = 201, description = "Account created and verification email dispatched"),
        (status = 400, description = "Email is already taken or the body is invalid")
    )
)]
async fn register(
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<RegisterSchema>,
) -> ServerResult<(StatusCode, Json<Value>)> {
    let requested_role = match body.role {
        RegisterRoleSchema::Student => RequestedRole::Student,
        RegisterRoleSchema::ClubAdmin => RequestedRole::ClubAdmin,
    };

    context
        .campus
        .auth
        .register(NewAccount {
            name: body.name,
            username: body.username,
            email: body.email,
            password: body.password,
            requested_role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered. Please check your email to verify your account."
        })),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 200, body = LoginResult, description = "Session established; the token is also set as a cookie"),
        (status = 403, description = "Banned, unverified, or unresolved club admin application")
    )
)]
async fn login(
    context: ServerContext,
    jar: CookieJar,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<(CookieJar, Json<LoginResult>)> {
    let session = context
        .campus
        .auth
        .login(Credentials {
            email: body.email,
            password: body.password,
            remember: body.remember.unwrap_or(false),
        })
        .await?;

    let jar = jar.add(session_cookie(session.token.clone(), &context.config));

    Ok((jar, Json(session.to_serialized())))
}

#[utoipa::path(
    get,
    path = "/v1/auth/logout",
    tag = "auth",
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, description = "Session destroyed and cookie cleared")
    )
)]
async fn logout(
    session: Session,
    context: ServerContext,
    jar: CookieJar,
) -> ServerResult<(CookieJar, Json<Value>)> {
    context.campus.auth.logout(session.token()).await?;

    let jar = jar.remove(session_cookie(String::new(), &context.config));

    Ok((jar, Json(json!({ "message": "Logged out successfully" }))))
}

#[utoipa::path(
    get,
    path = "/v1/auth/status",
    tag = "auth",
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    responses(
        (status = 200, body = User, description = "The current user, with the password stripped")
    )
)]
async fn status(session: Session) -> Json<User> {
    Json(session.user().to_serialized())
}

#[derive(Debug, Deserialize)]
struct VerifyEmailQuery {
    token: Option<String>,
}

#[utoipa::path(
    get,
    path = "/v1/auth/verify-email",
    tag = "auth",
    params(("token" = Option<String>, Query, description = "Single-use verification token")),
    responses(
        (status = 200, description = "Email verified"),
        (status = 400, description = "Missing, invalid, or already consumed token")
    )
)]
async fn verify_email(
    context: ServerContext,
    Query(query): Query<VerifyEmailQuery>,
) -> ServerResult<Json<Value>> {
    let token = query
        .token
        .filter(|token| !token.is_empty())
        .ok_or(ServerError::BadRequest("Token is required"))?;

    context.campus.auth.verify_email(&token).await?;

    Ok(Json(json!({ "message": "Email verified successfully!" })))
}

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/status", get(status))
        .route("/verify-email", get(verify_email))
}
