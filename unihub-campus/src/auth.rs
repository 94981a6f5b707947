use argon2::{
    password_hash::{Encoding, Error as PasswordHashError, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use log::warn;
use rand::rngs::OsRng;
use thiserror::Error;

use crate::{
    authorize, util::random_string, AccessError, CampusContext, ClubAdminStatus, Database,
    DatabaseError, NewSession, NewUser, SessionData, UserData, ANY_ROLE,
};

/// Authentication manager: credentials, sessions, and email verification.
pub struct Auth<Db> {
    context: CampusContext<Db>,
    argon: Argon2<'static>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// The user may not log in or act right now
    #[error(transparent)]
    Access(#[from] AccessError),
    /// The verification token matches no account, or was already consumed
    #[error("Invalid or expired token")]
    InvalidToken,
    /// No session with that token
    #[error("Unknown session")]
    UnknownSession,
    #[error("Session has expired")]
    SessionExpired,
    /// The hashing subsystem failed. Distinct from a wrong password so an
    /// outage never masquerades as bad credentials.
    #[error("HashError: {0}")]
    Hash(String),
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
}

/// The role a new account asks for. ClubAdmin requires sysAdmin approval
/// before it takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedRole {
    Student,
    ClubAdmin,
}

#[derive(Debug)]
pub struct NewAccount {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub requested_role: RequestedRole,
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub remember: bool,
}

impl<Db> Auth<Db>
where
    Db: Database,
{
    const SESSION_DURATION_IN_HOURS: i64 = 24;
    const REMEMBERED_SESSION_DURATION_IN_DAYS: i64 = 30;
    const VERIFICATION_DURATION_IN_HOURS: i64 = 72;

    const SESSION_TOKEN_LENGTH: usize = 32;
    const VERIFICATION_TOKEN_LENGTH: usize = 64;

    pub fn new(context: &CampusContext<Db>) -> Self {
        Self {
            context: context.clone(),
            argon: Argon2::default(),
        }
    }

    /// Creates an account in unverified state and dispatches the
    /// verification link. Delivery failures are logged, never propagated:
    /// the account row is the durable source of truth.
    pub async fn register(&self, new_account: NewAccount) -> Result<UserData, AuthError> {
        let hashed_password = self.hash_password(&new_account.password)?;

        let club_admin_status = match new_account.requested_role {
            RequestedRole::Student => ClubAdminStatus::NeverApplied,
            RequestedRole::ClubAdmin => ClubAdminStatus::Pending,
        };

        let token = random_string(Self::VERIFICATION_TOKEN_LENGTH);

        let user = self
            .context
            .database
            .create_user(NewUser {
                name: new_account.name,
                username: new_account.username,
                email: new_account.email,
                password: hashed_password,
                club_admin_status,
                verification_token: token.clone(),
                verification_expires_at: Utc::now()
                    + Duration::hours(Self::VERIFICATION_DURATION_IN_HOURS),
            })
            .await
            .map_err(AuthError::Db)?;

        let mailer = self.context.mailer.clone();
        let email = user.email.clone();

        tokio::spawn(async move {
            if let Err(e) = mailer.send_verification(&email, &token).await {
                warn!("Failed to send verification email to {}: {}", email, e);
            }
        });

        Ok(user)
    }

    /// Logs in a user, returning a new session
    pub async fn login(&self, credentials: Credentials) -> Result<SessionData, AuthError> {
        self.clear_expired().await;

        let user = self
            .context
            .database
            .user_by_email(&credentials.email)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        self.verify_password(&credentials.password, &user.password)?;

        // Same checks as every gated request: banned, unverified, and
        // unresolved applicants never get a session
        authorize(&user, ANY_ROLE)?;

        let expires_at = if credentials.remember {
            Utc::now() + Duration::days(Self::REMEMBERED_SESSION_DURATION_IN_DAYS)
        } else {
            Utc::now() + Duration::hours(Self::SESSION_DURATION_IN_HOURS)
        };

        let new_session = NewSession {
            token: random_string(Self::SESSION_TOKEN_LENGTH),
            user_id: user.id,
            expires_at,
        };

        self.context
            .database
            .create_session(new_session)
            .await
            .map_err(AuthError::Db)
    }

    /// Deletes the associated session, if it exists
    pub async fn logout(&self, token: &str) -> Result<(), DatabaseError> {
        self.context.database.delete_session_by_token(token).await
    }

    /// Restores a session, loading the user record fresh so bans and role
    /// changes apply on the very next request
    pub async fn session(&self, token: &str) -> Result<SessionData, AuthError> {
        let session = self
            .context
            .database
            .session_by_token(token)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => AuthError::UnknownSession,
                err => AuthError::Db(err),
            })?;

        if session.expires_at <= Utc::now() {
            if let Err(e) = self.context.database.delete_session_by_token(token).await {
                warn!("Failed to delete expired session: {}", e);
            }

            return Err(AuthError::SessionExpired);
        }

        Ok(session)
    }

    /// Consumes a verification token. Single-use: the matching account's
    /// token is cleared in the same statement, so a replay fails.
    pub async fn verify_email(&self, token: &str) -> Result<UserData, AuthError> {
        self.context
            .database
            .consume_verification_token(token)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => AuthError::InvalidToken,
                err => AuthError::Db(err),
            })
    }

    fn hash_password(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Ok(self
            .argon
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .to_string())
    }

    fn verify_password(&self, plaintext: &str, stored: &str) -> Result<(), AuthError> {
        let stored_password = PasswordHash::parse(stored, Encoding::default())
            .map_err(|e| AuthError::Hash(e.to_string()))?;

        match self
            .argon
            .verify_password(plaintext.as_bytes(), &stored_password)
        {
            Ok(()) => Ok(()),
            Err(PasswordHashError::Password) => Err(AuthError::InvalidCredentials),
            Err(e) => Err(AuthError::Hash(e.to_string())),
        }
    }

    async fn clear_expired(&self) {
        if let Err(e) = self.context.database.clear_expired_sessions().await {
            warn!("Failed to clear expired sessions: {}", e);
        }
    }
}
