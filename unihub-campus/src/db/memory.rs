//! In-memory [Database] used by the crate's tests. Mirrors the conditional
//! semantics of the postgres implementation: capacity-guarded registration,
//! single-use verification tokens, and the sysAdmin ban guard.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use parking_lot::Mutex;

use crate::{
    ApplicationData, ApplicationStatus, ClubAdminStatus, Database, DatabaseError, EventData,
    NewEvent, NewSession, NewUser, PrimaryKey, Result, SessionData, UpdatedEvent, UserData,
};

#[derive(Default)]
pub struct MemoryDatabase {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    users: Vec<UserData>,
    sessions: Vec<StoredSession>,
    applications: Vec<StoredApplication>,
    events: Vec<StoredEvent>,
    registrants: Vec<StoredRegistration>,
    next_id: PrimaryKey,
}

struct StoredSession {
    id: PrimaryKey,
    token: String,
    user_id: PrimaryKey,
    expires_at: DateTime<Utc>,
}

struct StoredApplication {
    id: PrimaryKey,
    user_id: PrimaryKey,
    status: ApplicationStatus,
    applied_at: DateTime<Utc>,
    reviewed_by: Option<PrimaryKey>,
    reviewed_at: Option<DateTime<Utc>>,
}

struct StoredEvent {
    id: PrimaryKey,
    title: String,
    organizer_id: PrimaryKey,
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
    created_at: DateTime<Utc>,
}

struct StoredRegistration {
    user_id: PrimaryKey,
    event_id: PrimaryKey,
}

impl State {
    fn next_id(&mut self) -> PrimaryKey {
        self.next_id += 1;
        self.next_id
    }

    fn compose_event(&self, event: &StoredEvent) -> EventData {
        let organizer = self
            .users
            .iter()
            .find(|u| u.id == event.organizer_id)
            .map(|u| u.name.clone())
            .unwrap_or_default();

        let registered_count = self
            .registrants
            .iter()
            .filter(|r| r.event_id == event.id)
            .count() as i64;

        EventData {
            id: event.id,
            title: event.title.clone(),
            organizer_id: event.organizer_id,
            organizer,
            description: event.description.clone(),
            event_date: event.event_date,
            event_time: event.event_time,
            duration_minutes: event.duration_minutes,
            category: event.category.clone(),
            address: event.address.clone(),
            room: event.room.clone(),
            registration_deadline: event.registration_deadline,
            capacity: event.capacity,
            image_url: event.image_url.clone(),
            created_at: event.created_at,
            registered_count,
        }
    }

    fn compose_application(&self, application: &StoredApplication) -> Result<ApplicationData> {
        let applicant = self
            .users
            .iter()
            .find(|u| u.id == application.user_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })?;

        Ok(ApplicationData {
            id: application.id,
            status: application.status,
            applied_at: application.applied_at,
            reviewed_by: application.reviewed_by,
            reviewed_at: application.reviewed_at,
            applicant,
        })
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn base_user(id: PrimaryKey, email: &str) -> UserData {
        UserData {
            id,
            name: format!("User {id}"),
            username: format!("user{id}"),
            email: email.to_string(),
            password: "hash".to_string(),
            is_banned: false,
            is_sys_admin: false,
            club_admin_status: ClubAdminStatus::NeverApplied,
            is_verified: true,
            verification_token: None,
            verification_expires_at: None,
            created_at: Utc::now(),
        }
    }

    /// Inserts a verified student
    pub fn insert_student(&self, email: &str) -> UserData {
        let mut state = self.state.lock();
        let id = state.next_id();
        let user = Self::base_user(id, email);

        state.users.push(user.clone());
        user
    }

    /// Inserts a verified, accepted club admin
    pub fn insert_club_admin(&self, email: &str) -> UserData {
        let mut state = self.state.lock();
        let id = state.next_id();

        let mut user = Self::base_user(id, email);
        user.club_admin_status = ClubAdminStatus::Accepted;

        state.users.push(user.clone());
        user
    }

    /// Inserts a verified sysAdmin
    pub fn insert_sys_admin(&self, email: &str) -> UserData {
        let mut state = self.state.lock();
        let id = state.next_id();

        let mut user = Self::base_user(id, email);
        user.is_sys_admin = true;

        state.users.push(user.clone());
        user
    }

    /// Inserts a verified user with a pending application
    pub fn insert_applicant(&self, email: &str) -> UserData {
        let mut state = self.state.lock();
        let id = state.next_id();

        let mut user = Self::base_user(id, email);
        user.club_admin_status = ClubAdminStatus::Pending;
        state.users.push(user.clone());

        let application_id = state.next_id();
        state.applications.push(StoredApplication {
            id: application_id,
            user_id: id,
            status: ApplicationStatus::Pending,
            applied_at: Utc::now(),
            reviewed_by: None,
            reviewed_at: None,
        });

        user
    }

    pub fn insert_session(&self, new_session: NewSession) {
        let mut state = self.state.lock();
        let id = state.next_id();

        state.sessions.push(StoredSession {
            id,
            token: new_session.token,
            user_id: new_session.user_id,
            expires_at: new_session.expires_at,
        });
    }

    pub fn ban(&self, user_id: PrimaryKey) {
        let mut state = self.state.lock();

        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.is_banned = true;
        }
    }

    pub fn user(&self, user_id: PrimaryKey) -> UserData {
        self.state
            .lock()
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .expect("user exists")
    }

    pub fn pending_application_count(&self, user_id: PrimaryKey) -> usize {
        self.state
            .lock()
            .applications
            .iter()
            .filter(|a| a.user_id == user_id && a.status == ApplicationStatus::Pending)
            .count()
    }

    pub fn pending_application_id(&self, user_id: PrimaryKey) -> PrimaryKey {
        self.state
            .lock()
            .applications
            .iter()
            .find(|a| a.user_id == user_id && a.status == ApplicationStatus::Pending)
            .map(|a| a.id)
            .expect("pending application exists")
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        self.state
            .lock()
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })
    }

    async fn user_by_email(&self, email: &str) -> Result<UserData> {
        self.state
            .lock()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "email",
            })
    }

    async fn list_users(&self) -> Result<Vec<UserData>> {
        Ok(self.state.lock().users.clone())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        let mut state = self.state.lock();

        if state.users.iter().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::Conflict {
                resource: "user",
                field: "email",
                value: new_user.email,
            });
        }

        let id = state.next_id();
        let user = UserData {
            id,
            name: new_user.name,
            username: new_user.username,
            email: new_user.email,
            password: new_user.password,
            is_banned: false,
            is_sys_admin: false,
            club_admin_status: new_user.club_admin_status,
            is_verified: false,
            verification_token: Some(new_user.verification_token),
            verification_expires_at: Some(new_user.verification_expires_at),
            created_at: Utc::now(),
        };

        state.users.push(user.clone());

        if user.club_admin_status == ClubAdminStatus::Pending {
            let application_id = state.next_id();
            state.applications.push(StoredApplication {
                id: application_id,
                user_id: user.id,
                status: ApplicationStatus::Pending,
                applied_at: Utc::now(),
                reviewed_by: None,
                reviewed_at: None,
            });
        }

        Ok(user)
    }

    async fn consume_verification_token(&self, token: &str) -> Result<UserData> {
        let mut state = self.state.lock();
        let now = Utc::now();

        let user = state
            .users
            .iter_mut()
            .find(|u| {
                u.verification_token.as_deref() == Some(token)
                    && u.verification_expires_at.map(|at| at > now).unwrap_or(true)
            })
            .ok_or(DatabaseError::NotFound {
                resource: "verification token",
                identifier: "value",
            })?;

        user.is_verified = true;
        user.verification_token = None;
        user.verification_expires_at = None;

        Ok(user.clone())
    }

    async fn ban_user(&self, user_id: PrimaryKey) -> Result<bool> {
        let mut state = self.state.lock();

        match state
            .users
            .iter_mut()
            .find(|u| u.id == user_id && !u.is_sys_admin)
        {
            Some(user) => {
                user.is_banned = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn promote_to_sys_admin(&self, user_id: PrimaryKey) -> Result<UserData> {
        let mut state = self.state.lock();

        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })?;

        user.is_sys_admin = true;

        Ok(user.clone())
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let state = self.state.lock();

        let session = state
            .sessions
            .iter()
            .find(|s| s.token == token)
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            })?;

        let user = state
            .users
            .iter()
            .find(|u| u.id == session.user_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })?;

        Ok(SessionData {
            id: session.id,
            token: session.token.clone(),
            expires_at: session.expires_at,
            user,
        })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        {
            let mut state = self.state.lock();

            if state.sessions.iter().any(|s| s.token == new_session.token) {
                return Err(DatabaseError::Conflict {
                    resource: "session",
                    field: "token",
                    value: new_session.token,
                });
            }

            let id = state.next_id();
            state.sessions.push(StoredSession {
                id,
                token: new_session.token.clone(),
                user_id: new_session.user_id,
                expires_at: new_session.expires_at,
            });
        }

        self.session_by_token(&new_session.token).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        let mut state = self.state.lock();
        let before = state.sessions.len();

        state.sessions.retain(|s| s.token != token);

        if state.sessions.len() == before {
            return Err(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            });
        }

        Ok(())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        let now = Utc::now();
        self.state.lock().sessions.retain(|s| s.expires_at > now);

        Ok(())
    }

    async fn application_by_id(&self, application_id: PrimaryKey) -> Result<ApplicationData> {
        let state = self.state.lock();

        let application = state
            .applications
            .iter()
            .find(|a| a.id == application_id)
            .ok_or(DatabaseError::NotFound {
                resource: "club admin application",
                identifier: "id",
            })?;

        state.compose_application(application)
    }

    async fn list_pending_applications(&self) -> Result<Vec<ApplicationData>> {
        let state = self.state.lock();

        state
            .applications
            .iter()
            .filter(|a| a.status == ApplicationStatus::Pending)
            .map(|a| state.compose_application(a))
            .collect()
    }

    async fn approve_application(
        &self,
        application_id: PrimaryKey,
        reviewer_id: PrimaryKey,
    ) -> Result<ApplicationData> {
        {
            let mut state = self.state.lock();

            let application = state
                .applications
                .iter_mut()
                .find(|a| a.id == application_id)
                .ok_or(DatabaseError::NotFound {
                    resource: "club admin application",
                    identifier: "id",
                })?;

            if application.status != ApplicationStatus::Pending {
                return Err(DatabaseError::Conflict {
                    resource: "club admin application",
                    field: "status",
                    value: application.status.as_str().to_string(),
                });
            }

            application.status = ApplicationStatus::Accepted;
            application.reviewed_by = Some(reviewer_id);
            application.reviewed_at = Some(Utc::now());

            let user_id = application.user_id;
            if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
                user.club_admin_status = ClubAdminStatus::Accepted;
            }
        }

        self.application_by_id(application_id).await
    }

    async fn event_by_id(&self, event_id: PrimaryKey) -> Result<EventData> {
        let state = self.state.lock();

        state
            .events
            .iter()
            .find(|e| e.id == event_id)
            .map(|e| state.compose_event(e))
            .ok_or(DatabaseError::NotFound {
                resource: "event",
                identifier: "id",
            })
    }

    async fn list_events(&self) -> Result<Vec<EventData>> {
        let state = self.state.lock();

        Ok(state.events.iter().map(|e| state.compose_event(e)).collect())
    }

    async fn events_by_organizer(&self, organizer_id: PrimaryKey) -> Result<Vec<EventData>> {
        let state = self.state.lock();

        Ok(state
            .events
            .iter()
            .filter(|e| e.organizer_id == organizer_id)
            .map(|e| state.compose_event(e))
            .collect())
    }

    async fn events_registered_by(&self, user_id: PrimaryKey) -> Result<Vec<EventData>> {
        let state = self.state.lock();

        Ok(state
            .events
            .iter()
            .filter(|e| {
                state
                    .registrants
                    .iter()
                    .any(|r| r.event_id == e.id && r.user_id == user_id)
            })
            .map(|e| state.compose_event(e))
            .collect())
    }

    async fn create_event(&self, new_event: NewEvent) -> Result<EventData> {
        let event_id = {
            let mut state = self.state.lock();
            let id = state.next_id();

            state.events.push(StoredEvent {
                id,
                title: new_event.title,
                organizer_id: new_event.organizer_id,
                description: new_event.description,
                event_date: new_event.event_date,
                event_time: new_event.event_time,
                duration_minutes: new_event.duration_minutes,
                category: new_event.category,
                address: new_event.address,
                room: new_event.room,
                registration_deadline: new_event.registration_deadline,
                capacity: new_event.capacity,
                image_url: new_event.image_url,
                created_at: Utc::now(),
            });

            id
        };

        self.event_by_id(event_id).await
    }

    async fn update_event(
        &self,
        updated_event: UpdatedEvent,
        organizer_id: PrimaryKey,
    ) -> Result<EventData> {
        {
            let mut state = self.state.lock();

            let event = state
                .events
                .iter_mut()
                .find(|e| e.id == updated_event.id && e.organizer_id == organizer_id)
                .ok_or(DatabaseError::NotFound {
                    resource: "event",
                    identifier: "id",
                })?;

            if let Some(title) = updated_event.title {
                event.title = title;
            }
            if let Some(description) = updated_event.description {
                event.description = description;
            }
            if let Some(event_date) = updated_event.event_date {
                event.event_date = event_date;
            }
            if let Some(event_time) = updated_event.event_time {
                event.event_time = event_time;
            }
            if let Some(duration_minutes) = updated_event.duration_minutes {
                event.duration_minutes = duration_minutes;
            }
            if let Some(category) = updated_event.category {
                event.category = category;
            }
            if let Some(address) = updated_event.address {
                event.address = address;
            }
            if let Some(room) = updated_event.room {
                event.room = room;
            }
            if let Some(registration_deadline) = updated_event.registration_deadline {
                event.registration_deadline = registration_deadline;
            }
            if let Some(capacity) = updated_event.capacity {
                event.capacity = capacity;
            }
            if let Some(image_url) = updated_event.image_url {
                event.image_url = Some(image_url);
            }
        }

        self.event_by_id(updated_event.id).await
    }

    async fn delete_event(
        &self,
        event_id: PrimaryKey,
        organizer_id: Option<PrimaryKey>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let before = state.events.len();

        state.events.retain(|e| {
            e.id != event_id || organizer_id.is_some_and(|owner| e.organizer_id != owner)
        });

        if state.events.len() == before {
            return Err(DatabaseError::NotFound {
                resource: "event",
                identifier: "id",
            });
        }

        state.registrants.retain(|r| r.event_id != event_id);

        Ok(())
    }

    async fn create_registration(
        &self,
        user_id: PrimaryKey,
        event_id: PrimaryKey,
    ) -> Result<bool> {
        let mut state = self.state.lock();

        let capacity = match state.events.iter().find(|e| e.id == event_id) {
            Some(event) => event.capacity,
            None => return Ok(false),
        };

        let registered = state
            .registrants
            .iter()
            .filter(|r| r.event_id == event_id)
            .count() as i32;

        if registered >= capacity {
            return Ok(false);
        }

        if state
            .registrants
            .iter()
            .any(|r| r.event_id == event_id && r.user_id == user_id)
        {
            return Err(DatabaseError::Conflict {
                resource: "registration",
                field: "user:event",
                value: format!("{user_id}:{event_id}"),
            });
        }

        state.registrants.push(StoredRegistration { user_id, event_id });

        Ok(true)
    }

    async fn delete_registration(&self, user_id: PrimaryKey, event_id: PrimaryKey) -> Result<()> {
        let mut state = self.state.lock();
        let before = state.registrants.len();

        state
            .registrants
            .retain(|r| r.user_id != user_id || r.event_id != event_id);

        if state.registrants.len() == before {
            return Err(DatabaseError::NotFound {
                resource: "registration",
                identifier: "user:event",
            });
        }

        Ok(())
    }
}
