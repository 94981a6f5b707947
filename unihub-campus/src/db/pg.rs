use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    query, query_as, Error as SqlxError, FromRow,
};

use crate::{
    ApplicationData, ApplicationStatus, ClubAdminStatus, Database, DatabaseError, DatabaseResult,
    EventData, IntoDatabaseError, NewEvent, NewSession, NewUser, PrimaryKey, Result, SessionData,
    UpdatedEvent, UserData,
};

/// A postgres database implementation for unihub
pub struct PgDatabase {
    pool: PgPool,
}

/// Event rows are always loaded with the organizer name and the current
/// registration count, so every caller sees the same shape.
const EVENT_SELECT: &str = "
    SELECT
        e.id, e.title, e.organizer_id, u.name AS organizer, e.description,
        e.event_date, e.event_time, e.duration_minutes, e.category, e.address,
        e.room, e.registration_deadline, e.capacity, e.image_url, e.created_at,
        (SELECT COUNT(*) FROM event_registrants r WHERE r.event_id = e.id) AS registered_count
    FROM club_events e
        INNER JOIN users u ON e.organizer_id = u.id";

const APPLICATION_SELECT: &str = "
    SELECT
        a.id AS application_id, a.status, a.applied_at, a.reviewed_by, a.reviewed_at,
        u.id, u.name, u.username, u.email, u.password, u.is_banned, u.is_sys_admin,
        u.club_admin_status, u.is_verified, u.verification_token,
        u.verification_expires_at, u.created_at
    FROM club_admin_applications a
        INNER JOIN users u ON a.user_id = u.id";

const SESSION_SELECT: &str = "
    SELECT
        s.id AS session_id, s.token, s.expires_at,
        u.id, u.name, u.username, u.email, u.password, u.is_banned, u.is_sys_admin,
        u.club_admin_status, u.is_verified, u.verification_token,
        u.verification_expires_at, u.created_at
    FROM sessions s
        INNER JOIN users u ON s.user_id = u.id";

#[derive(FromRow)]
struct SessionRow {
    session_id: PrimaryKey,
    token: String,
    expires_at: DateTime<Utc>,
    #[sqlx(flatten)]
    user: UserData,
}

impl From<SessionRow> for SessionData {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.session_id,
            token: row.token,
            expires_at: row.expires_at,
            user: row.user,
        }
    }
}

#[derive(FromRow)]
struct ApplicationRow {
    application_id: PrimaryKey,
    status: ApplicationStatus,
    applied_at: DateTime<Utc>,
    reviewed_by: Option<PrimaryKey>,
    reviewed_at: Option<DateTime<Utc>>,
    #[sqlx(flatten)]
    applicant: UserData,
}

impl From<ApplicationRow> for ApplicationData {
    fn from(row: ApplicationRow) -> Self {
        Self {
            id: row.application_id,
            status: row.status,
            applied_at: row.applied_at,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            applicant: row.applicant,
        }
    }
}

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }

    /// Applies the embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        query_as::<_, UserData>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "id"))
    }

    async fn user_by_email(&self, email: &str) -> Result<UserData> {
        query_as::<_, UserData>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "email"))
    }

    async fn list_users(&self) -> Result<Vec<UserData>> {
        query_as::<_, UserData>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        self.user_by_email(&new_user.email)
            .await
            .conflict_or_ok("user", "email", &new_user.email)?;

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let user = query_as::<_, UserData>(
            "INSERT INTO users
                (name, username, email, password, club_admin_status,
                 verification_token, verification_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *",
        )
        .bind(&new_user.name)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(new_user.club_admin_status)
        .bind(&new_user.verification_token)
        .bind(new_user.verification_expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.conflict_or("user", "email", &new_user.email))?;

        // Applying for club admin creates the application in the same
        // transaction, so a half-registered applicant cannot exist
        if user.club_admin_status == ClubAdminStatus::Pending {
            query("INSERT INTO club_admin_applications (user_id) VALUES ($1)")
                .bind(user.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| e.any())?;
        }

        tx.commit().await.map_err(|e| e.any())?;

        Ok(user)
    }

    async fn consume_verification_token(&self, token: &str) -> Result<UserData> {
        query_as::<_, UserData>(
            "UPDATE users SET
                is_verified = TRUE,
                verification_token = NULL,
                verification_expires_at = NULL
            WHERE verification_token = $1
                AND (verification_expires_at IS NULL OR verification_expires_at > now())
            RETURNING *",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("verification token", "value"))
    }

    async fn ban_user(&self, user_id: PrimaryKey) -> Result<bool> {
        let result = query("UPDATE users SET is_banned = TRUE WHERE id = $1 AND is_sys_admin = FALSE")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(result.rows_affected() > 0)
    }

    async fn promote_to_sys_admin(&self, user_id: PrimaryKey) -> Result<UserData> {
        query_as::<_, UserData>("UPDATE users SET is_sys_admin = TRUE WHERE id = $1 RETURNING *")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "id"))
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let sql = format!("{SESSION_SELECT} WHERE s.token = $1");

        query_as::<_, SessionRow>(&sql)
            .bind(token)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("session", "token"))
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.session_by_token(&new_session.token)
            .await
            .conflict_or_ok("session", "token", &new_session.token)?;

        let row: (String,) = query_as(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3) RETURNING token",
        )
        .bind(&new_session.token)
        .bind(new_session.user_id)
        .bind(new_session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.session_by_token(&row.0).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        let result = query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            });
        }

        Ok(())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        query("DELETE FROM sessions WHERE now() > expires_at")
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn application_by_id(&self, application_id: PrimaryKey) -> Result<ApplicationData> {
        let sql = format!("{APPLICATION_SELECT} WHERE a.id = $1");

        query_as::<_, ApplicationRow>(&sql)
            .bind(application_id)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("club admin application", "id"))
    }

    async fn list_pending_applications(&self) -> Result<Vec<ApplicationData>> {
        let sql = format!("{APPLICATION_SELECT} WHERE a.status = 'pending' ORDER BY a.applied_at");

        let rows = query_as::<_, ApplicationRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn approve_application(
        &self,
        application_id: PrimaryKey,
        reviewer_id: PrimaryKey,
    ) -> Result<ApplicationData> {
        #[derive(FromRow)]
        struct PendingApplication {
            user_id: PrimaryKey,
            status: ApplicationStatus,
        }

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let application = query_as::<_, PendingApplication>(
            "SELECT user_id, status FROM club_admin_applications WHERE id = $1 FOR UPDATE",
        )
        .bind(application_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.not_found_or("club admin application", "id"))?;

        if application.status != ApplicationStatus::Pending {
            return Err(DatabaseError::Conflict {
                resource: "club admin application",
                field: "status",
                value: application.status.as_str().to_string(),
            });
        }

        query("UPDATE users SET club_admin_status = 'accepted' WHERE id = $1")
            .bind(application.user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        query(
            "UPDATE club_admin_applications SET
                status = 'accepted',
                reviewed_by = $1,
                reviewed_at = now()
            WHERE id = $2",
        )
        .bind(reviewer_id)
        .bind(application_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| e.any())?;

        tx.commit().await.map_err(|e| e.any())?;

        self.application_by_id(application_id).await
    }

    async fn event_by_id(&self, event_id: PrimaryKey) -> Result<EventData> {
        let sql = format!("{EVENT_SELECT} WHERE e.id = $1");

        query_as::<_, EventData>(&sql)
            .bind(event_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("event", "id"))
    }

    async fn list_events(&self) -> Result<Vec<EventData>> {
        let sql = format!("{EVENT_SELECT} ORDER BY e.event_date, e.event_time");

        query_as::<_, EventData>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn events_by_organizer(&self, organizer_id: PrimaryKey) -> Result<Vec<EventData>> {
        let sql = format!("{EVENT_SELECT} WHERE e.organizer_id = $1 ORDER BY e.event_date");

        query_as::<_, EventData>(&sql)
            .bind(organizer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn events_registered_by(&self, user_id: PrimaryKey) -> Result<Vec<EventData>> {
        let sql = format!(
            "{EVENT_SELECT}
                INNER JOIN event_registrants mine ON mine.event_id = e.id
            WHERE mine.user_id = $1
            ORDER BY e.event_date"
        );

        query_as::<_, EventData>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_event(&self, new_event: NewEvent) -> Result<EventData> {
        let row: (PrimaryKey,) = query_as(
            "INSERT INTO club_events
                (title, organizer_id, description, event_date, event_time,
                 duration_minutes, category, address, room,
                 registration_deadline, capacity, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id",
        )
        .bind(&new_event.title)
        .bind(new_event.organizer_id)
        .bind(&new_event.description)
        .bind(new_event.event_date)
        .bind(new_event.event_time)
        .bind(new_event.duration_minutes)
        .bind(&new_event.category)
        .bind(&new_event.address)
        .bind(&new_event.room)
        .bind(new_event.registration_deadline)
        .bind(new_event.capacity)
        .bind(&new_event.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.event_by_id(row.0).await
    }

    async fn update_event(
        &self,
        updated_event: UpdatedEvent,
        organizer_id: PrimaryKey,
    ) -> Result<EventData> {
        // Ownership is part of the statement's predicate, so a row that was
        // reassigned or deleted between request and execution is untouched
        let result = query(
            "UPDATE club_events SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                event_date = COALESCE($5, event_date),
                event_time = COALESCE($6, event_time),
                duration_minutes = COALESCE($7, duration_minutes),
                category = COALESCE($8, category),
                address = COALESCE($9, address),
                room = COALESCE($10, room),
                registration_deadline = COALESCE($11, registration_deadline),
                capacity = COALESCE($12, capacity),
                image_url = COALESCE($13, image_url)
            WHERE id = $1 AND organizer_id = $2",
        )
        .bind(updated_event.id)
        .bind(organizer_id)
        .bind(&updated_event.title)
        .bind(&updated_event.description)
        .bind(updated_event.event_date)
        .bind(updated_event.event_time)
        .bind(updated_event.duration_minutes)
        .bind(&updated_event.category)
        .bind(&updated_event.address)
        .bind(&updated_event.room)
        .bind(updated_event.registration_deadline)
        .bind(updated_event.capacity)
        .bind(&updated_event.image_url)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "event",
                identifier: "id",
            });
        }

        self.event_by_id(updated_event.id).await
    }

    async fn delete_event(
        &self,
        event_id: PrimaryKey,
        organizer_id: Option<PrimaryKey>,
    ) -> Result<()> {
        let result = match organizer_id {
            Some(organizer_id) => {
                query("DELETE FROM club_events WHERE id = $1 AND organizer_id = $2")
                    .bind(event_id)
                    .bind(organizer_id)
                    .execute(&self.pool)
                    .await
            }
            None => {
                query("DELETE FROM club_events WHERE id = $1")
                    .bind(event_id)
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "event",
                identifier: "id",
            });
        }

        Ok(())
    }

    async fn create_registration(
        &self,
        user_id: PrimaryKey,
        event_id: PrimaryKey,
    ) -> Result<bool> {
        // The capacity predicate and the (user, event) uniqueness constraint
        // arbitrate concurrent attempts for the last open slot
        let result = query(
            "INSERT INTO event_registrants (user_id, event_id)
            SELECT $1, e.id FROM club_events e
            WHERE e.id = $2
                AND (SELECT COUNT(*) FROM event_registrants r WHERE r.event_id = e.id) < e.capacity",
        )
        .bind(user_id)
        .bind(event_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            e.conflict_or(
                "registration",
                "user:event",
                &format!("{user_id}:{event_id}"),
            )
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_registration(&self, user_id: PrimaryKey, event_id: PrimaryKey) -> Result<()> {
        let result = query("DELETE FROM event_registrants WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "registration",
                identifier: "user:event",
            });
        }

        Ok(())
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }

    fn conflict_or(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> DatabaseError {
        let is_unique_violation =
            matches!(&self, SqlxError::Database(e) if e.is_unique_violation());

        if is_unique_violation {
            DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }
        } else {
            self.any()
        }
    }
}
