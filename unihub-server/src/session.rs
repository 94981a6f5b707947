use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use unihub_campus::{authorize, Role, SessionData, UserData, ANY_ROLE};

use crate::{config::ServerConfig, context::ServerContext, errors::ServerError};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "unihub_session";

/// Wraps [SessionData] so [FromRequestParts] can be implemented for it.
/// Extraction restores the session with a fresh user record and runs the
/// baseline gate checks, so banned users and unresolved applicants are
/// refused before any handler runs.
pub struct Session {
    data: SessionData,
    role: Role,
}

impl Session {
    /// Returns the user of the session
    pub fn user(&self) -> &UserData {
        &self.data.user
    }

    /// The role derived for this request. Never cached between requests.
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn token(&self) -> &str {
        &self.data.token
    }

    /// Requires the session's user to hold one of the given roles
    pub fn require(&self, required: &[Role]) -> Result<&UserData, ServerError> {
        authorize(&self.data.user, required)?;

        Ok(&self.data.user)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    ServerContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);

        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .or_else(|| bearer_token(&parts.headers))
            .ok_or(ServerError::Unauthenticated)?;

        let session = context.campus.auth.session(&token).await?;
        let role = authorize(&session.user, ANY_ROLE)?;

        Ok(Self {
            data: session,
            role,
        })
    }
}

/// Falls back to the Authorization header for non-browser clients
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|x| x.to_str().ok())?;

    let parts: Vec<_> = value.split_ascii_whitespace().collect();

    if parts.first() != Some(&"Bearer") {
        return None;
    }

    parts.last().map(|token| token.to_string())
}

/// Builds the session cookie with the configured attributes
pub fn session_cookie(token: String, config: &ServerConfig) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);

    if config.secure_cookies {
        cookie.set_secure(true);
        cookie.set_same_site(SameSite::None);
    } else {
        cookie.set_same_site(SameSite::Lax);
    }

    cookie
}
