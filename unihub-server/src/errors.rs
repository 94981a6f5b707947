use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde_json::json;
use thiserror::Error;
use unihub_campus::{AccessError, AdminError, AuthError, DatabaseError, EventError};

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("Forbidden")]
    Forbidden,
    #[error("Your account is banned.")]
    Banned,
    #[error("Please verify your email first.")]
    Unverified,
    #[error("Your club admin application is pending review.")]
    ApplicationPending,
    #[error("Your club admin application was rejected.")]
    ApplicationRejected,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidVerificationToken,
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("{0}")]
    Conflict(String),
    #[error("Event is full")]
    EventFull,
    #[error("Registration deadline has passed")]
    RegistrationClosed,
    #[error("Cannot ban another sysAdmin")]
    CannotBanSysAdmin,
    #[error("Application is not pending")]
    ApplicationNotPending,
    #[error("{0}")]
    BadRequest(&'static str),
    /// Logged server-side; clients only see a generic message
    #[error("Internal server error")]
    Internal(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden
            | Self::Banned
            | Self::Unverified
            | Self::ApplicationPending
            | Self::ApplicationRejected
            | Self::CannotBanSysAdmin => StatusCode::FORBIDDEN,
            Self::NotFound { resource: _ } => StatusCode::NOT_FOUND,
            Self::InvalidCredentials
            | Self::InvalidVerificationToken
            | Self::Conflict(_)
            | Self::EventFull
            | Self::RegistrationClosed
            | Self::ApplicationNotPending
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            error!("Internal server error: {}", source);
        }

        let body = Json(json!({ "message": self.to_string() }));

        (self.as_status_code(), body).into_response()
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier: _,
            } => Self::NotFound { resource },
            DatabaseError::Conflict { .. } => Self::Conflict(value.to_string()),
            DatabaseError::Internal(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<AccessError> for ServerError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::Banned => Self::Banned,
            AccessError::Unverified => Self::Unverified,
            AccessError::ApplicationPending => Self::ApplicationPending,
            AccessError::ApplicationRejected => Self::ApplicationRejected,
            AccessError::Forbidden => Self::Forbidden,
        }
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Access(e) => e.into(),
            AuthError::InvalidToken => Self::InvalidVerificationToken,
            AuthError::UnknownSession | AuthError::SessionExpired => Self::Unauthenticated,
            AuthError::Hash(e) => Self::Internal(e),
            AuthError::Db(e) => e.into(),
        }
    }
}

impl From<EventError> for ServerError {
    fn from(value: EventError) -> Self {
        match value {
            EventError::Full => Self::EventFull,
            EventError::RegistrationClosed => Self::RegistrationClosed,
            EventError::Db(DatabaseError::Conflict {
                resource: "registration",
                ..
            }) => Self::Conflict("Already registered".to_string()),
            EventError::Db(e) => e.into(),
        }
    }
}

impl From<AdminError> for ServerError {
    fn from(value: AdminError) -> Self {
        match value {
            AdminError::CannotBanSysAdmin => Self::CannotBanSysAdmin,
            AdminError::ApplicationNotPending => Self::ApplicationNotPending,
            AdminError::Db(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::ServerError;
    use axum::http::StatusCode;
    use unihub_campus::{AccessError, AuthError, DatabaseError, EventError};

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            ServerError::Unauthenticated.as_status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServerError::Banned.as_status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServerError::ApplicationPending.as_status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServerError::NotFound { resource: "event" }.as_status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Conflict("Already registered".to_string()).as_status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::EventFull.as_status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Internal("boom".to_string()).as_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn session_errors_map_to_unauthenticated() {
        assert!(matches!(
            ServerError::from(AuthError::UnknownSession),
            ServerError::Unauthenticated
        ));
        assert!(matches!(
            ServerError::from(AuthError::SessionExpired),
            ServerError::Unauthenticated
        ));
    }

    #[test]
    fn duplicate_registration_reads_as_already_registered() {
        let conflict = EventError::Db(DatabaseError::Conflict {
            resource: "registration",
            field: "user:event",
            value: "1:2".to_string(),
        });

        let error = ServerError::from(conflict);
        assert!(matches!(&error, ServerError::Conflict(m) if m == "Already registered"));
    }

    #[test]
    fn access_errors_keep_their_distinct_messages() {
        let banned = ServerError::from(AccessError::Banned);
        let unverified = ServerError::from(AccessError::Unverified);

        assert_eq!(banned.to_string(), "Your account is banned.");
        assert_eq!(unverified.to_string(), "Please verify your email first.");
    }
}
