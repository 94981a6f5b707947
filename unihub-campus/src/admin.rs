use log::info;
use thiserror::Error;

use crate::{
    ApplicationData, CampusContext, Database, DatabaseError, PrimaryKey, UserData,
};

/// SysAdmin operations: bans, promotions, and application review.
pub struct Admin<Db> {
    context: CampusContext<Db>,
}

#[derive(Debug, Error)]
pub enum AdminError {
    /// sysAdmin accounts are never bannable through this pathway
    #[error("Cannot ban another sysAdmin")]
    CannotBanSysAdmin,
    #[error("Application is not pending")]
    ApplicationNotPending,
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

impl<Db> Admin<Db>
where
    Db: Database,
{
    pub fn new(context: &CampusContext<Db>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub async fn ban_user(&self, user_id: PrimaryKey) -> Result<(), AdminError> {
        let user = self.context.database.user_by_id(user_id).await?;

        if user.is_sys_admin {
            return Err(AdminError::CannotBanSysAdmin);
        }

        // The statement re-checks the flag, so a concurrent promotion still
        // cannot end with a banned sysAdmin
        let banned = self.context.database.ban_user(user_id).await?;

        if !banned {
            return Err(AdminError::CannotBanSysAdmin);
        }

        info!("User {} banned", user_id);

        Ok(())
    }

    /// Accepts a pending application, recording who reviewed it and when.
    /// Anything but a pending application is refused, never re-applied.
    pub async fn approve_application(
        &self,
        application_id: PrimaryKey,
        reviewer_id: PrimaryKey,
    ) -> Result<ApplicationData, AdminError> {
        let application = self
            .context
            .database
            .approve_application(application_id, reviewer_id)
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict { .. } => AdminError::ApplicationNotPending,
                err => AdminError::Db(err),
            })?;

        info!(
            "Club admin application {} approved by sysAdmin {}",
            application_id, reviewer_id
        );

        Ok(application)
    }

    pub async fn promote_to_sys_admin(&self, user_id: PrimaryKey) -> Result<UserData, AdminError> {
        let user = self.context.database.promote_to_sys_admin(user_id).await?;

        info!("User {} promoted to sysAdmin", user_id);

        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<UserData>, DatabaseError> {
        self.context.database.list_users().await
    }

    pub async fn pending_applications(&self) -> Result<Vec<ApplicationData>, DatabaseError> {
        self.context.database.list_pending_applications().await
    }
}
