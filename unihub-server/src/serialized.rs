//! All schemas that are exposed from endpoints are defined here
//! along with the conversion impls. Password hashes never leave the server.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use unihub_campus::{ApplicationData, EventData, Role, SessionData, UserData};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: i32,
    name: String,
    username: String,
    email: String,
    /// Derived per request, never stored
    role: &'static str,
    is_banned: bool,
    is_sys_admin: bool,
    is_verified: bool,
    club_admin_status: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    token: String,
    user: User,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    id: i32,
    title: String,
    organizer_id: i32,
    organizer: String,
    description: String,
    event_date: NaiveDate,
    event_time: NaiveTime,
    duration_minutes: i32,
    category: String,
    address: String,
    room: String,
    registration_deadline: DateTime<Utc>,
    capacity: i32,
    image_url: Option<String>,
    registered_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    id: i32,
    status: &'static str,
    applied_at: DateTime<Utc>,
    reviewed_by: Option<i32>,
    reviewed_at: Option<DateTime<Utc>>,
    applicant: User,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: Role::resolve(self).map(|role| role.as_str()).unwrap_or("none"),
            is_banned: self.is_banned,
            is_sys_admin: self.is_sys_admin,
            is_verified: self.is_verified,
            club_admin_status: self.club_admin_status.as_str(),
        }
    }
}

impl ToSerialized<LoginResult> for SessionData {
    fn to_serialized(&self) -> LoginResult {
        LoginResult {
            token: self.token.clone(),
            user: self.user.to_serialized(),
        }
    }
}

impl ToSerialized<Event> for EventData {
    fn to_serialized(&self) -> Event {
        Event {
            id: self.id,
            title: self.title.clone(),
            organizer_id: self.organizer_id,
            organizer: self.organizer.clone(),
            description: self.description.clone(),
            event_date: self.event_date,
            event_time: self.event_time,
            duration_minutes: self.duration_minutes,
            category: self.category.clone(),
            address: self.address.clone(),
            room: self.room.clone(),
            registration_deadline: self.registration_deadline,
            capacity: self.capacity,
            image_url: self.image_url.clone(),
            registered_count: self.registered_count,
        }
    }
}

impl ToSerialized<Application> for ApplicationData {
    fn to_serialized(&self) -> Application {
        Application {
            id: self.id,
            status: self.status.as_str(),
            applied_at: self.applied_at,
            reviewed_by: self.reviewed_by,
            reviewed_at: self.reviewed_at,
            applicant: self.applicant.to_serialized(),
        }
    }
}
