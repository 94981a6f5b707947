use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// Where a user stands with regard to club admin privileges.
/// Stored on the user row; the effective role is derived from it per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "club_admin_status", rename_all = "snake_case")]
pub enum ClubAdminStatus {
    NeverApplied,
    Pending,
    Accepted,
    Rejected,
}

impl ClubAdminStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeverApplied => "never_applied",
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Status of a club admin application row. Rejection is not a row state,
/// only a user-level standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }
}

/// A unihub account
#[derive(Debug, Clone, FromRow)]
pub struct UserData {
    pub id: PrimaryKey,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_banned: bool,
    pub is_sys_admin: bool,
    pub club_admin_status: ClubAdminStatus,
    pub is_verified: bool,
    /// Single-use token proving control of the email address.
    /// Cleared when consumed, so a replayed link fails.
    pub verification_token: Option<String>,
    pub verification_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Login session data for authentication
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: PrimaryKey,
    /// The session token, or key if you will
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// The user that is logged in, loaded fresh alongside the session
    pub user: UserData,
}

/// A campus event organized by a club admin
#[derive(Debug, Clone, FromRow)]
pub struct EventData {
    pub id: PrimaryKey,
    pub title: String,
    /// The user that created the event and owns mutations to it
    pub organizer_id: PrimaryKey,
    /// Display name of the organizer, joined from the user row
    pub organizer: String,
    pub description: String,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    pub duration_minutes: i32,
    pub category: String,
    pub address: String,
    pub room: String,
    pub registration_deadline: DateTime<Utc>,
    pub capacity: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// How many students are registered for the event
    pub registered_count: i64,
}

/// A request for club admin privileges, reviewed by a sysAdmin
#[derive(Debug, Clone)]
pub struct ApplicationData {
    pub id: PrimaryKey,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub reviewed_by: Option<PrimaryKey>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub applicant: UserData,
}

#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub club_admin_status: ClubAdminStatus,
    pub verification_token: String,
    pub verification_expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewSession {
    pub token: String,
    pub user_id: PrimaryKey,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewEvent {
    pub title: String,
    pub organizer_id: PrimaryKey,
    pub description: String,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    pub duration_minutes: i32,
    pub category: String,
    pub address: String,
    pub room: String,
    pub registration_deadline: DateTime<Utc>,
    pub capacity: i32,
    pub image_url: Option<String>,
}

/// Partial update of an event. `None` fields keep their current value.
#[derive(Debug, Default)]
pub struct UpdatedEvent {
    pub id: PrimaryKey,
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub room: Option<String>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
    pub image_url: Option<String>,
}
