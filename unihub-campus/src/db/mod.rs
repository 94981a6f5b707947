use async_trait::async_trait;
use thiserror::Error;

mod data;
pub use data::*;

mod pg;
pub use pg::*;

#[cfg(test)]
pub mod memory;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn conflict_or(self, resource: &'static str, field: &'static str, value: &str)
        -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => Ok(()),
                e => Err(e),
            },
        }
    }
}

/// Represents a type that can fetch and mutate unihub data in durable storage
#[async_trait]
pub trait Database: Send + Sync + 'static {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData>;
    async fn user_by_email(&self, email: &str) -> Result<UserData>;
    async fn list_users(&self) -> Result<Vec<UserData>>;
    /// Creates the user and, when the status is pending, the club admin
    /// application in the same transaction. Both succeed or neither does.
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;
    /// Marks the user matching the token as verified and clears the token in
    /// one conditional statement, so the token cannot be replayed. Expired
    /// tokens don't match.
    async fn consume_verification_token(&self, token: &str) -> Result<UserData>;
    /// Bans the user unless they are a sysAdmin. Returns whether a row
    /// changed; the sysAdmin guard lives in the statement's predicate.
    async fn ban_user(&self, user_id: PrimaryKey) -> Result<bool>;
    async fn promote_to_sys_admin(&self, user_id: PrimaryKey) -> Result<UserData>;

    async fn session_by_token(&self, token: &str) -> Result<SessionData>;
    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    async fn delete_session_by_token(&self, token: &str) -> Result<()>;
    async fn clear_expired_sessions(&self) -> Result<()>;

    async fn application_by_id(&self, application_id: PrimaryKey) -> Result<ApplicationData>;
    async fn list_pending_applications(&self) -> Result<Vec<ApplicationData>>;
    /// Accepts a pending application and updates the applicant's standing in
    /// one transaction, recording the reviewer. A non-pending application is
    /// a conflict, never silently re-applied.
    async fn approve_application(
        &self,
        application_id: PrimaryKey,
        reviewer_id: PrimaryKey,
    ) -> Result<ApplicationData>;

    async fn event_by_id(&self, event_id: PrimaryKey) -> Result<EventData>;
    async fn list_events(&self) -> Result<Vec<EventData>>;
    async fn events_by_organizer(&self, organizer_id: PrimaryKey) -> Result<Vec<EventData>>;
    async fn events_registered_by(&self, user_id: PrimaryKey) -> Result<Vec<EventData>>;
    async fn create_event(&self, new_event: NewEvent) -> Result<EventData>;
    /// Applies the update only to a row owned by `organizer_id`. A missing
    /// row and a foreign row are indistinguishable from the outside.
    async fn update_event(
        &self,
        updated_event: UpdatedEvent,
        organizer_id: PrimaryKey,
    ) -> Result<EventData>;
    /// Deletes the event, restricted to the owning organizer unless
    /// `organizer_id` is `None`.
    async fn delete_event(
        &self,
        event_id: PrimaryKey,
        organizer_id: Option<PrimaryKey>,
    ) -> Result<()>;
    /// Inserts a registration if the event still has free capacity. Returns
    /// false when the capacity predicate rejects the insert. The database,
    /// not the caller, arbitrates the last open slot; a duplicate pair is a
    /// conflict from the uniqueness constraint.
    async fn create_registration(&self, user_id: PrimaryKey, event_id: PrimaryKey)
        -> Result<bool>;
    async fn delete_registration(&self, user_id: PrimaryKey, event_id: PrimaryKey) -> Result<()>;
}
