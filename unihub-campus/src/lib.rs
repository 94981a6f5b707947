mod admin;
mod auth;
mod db;
mod events;
mod gate;
mod mailer;
mod roles;
mod util;

use std::sync::Arc;

pub use admin::*;
pub use auth::*;
pub use db::*;
pub use events::*;
pub use gate::*;
pub use mailer::*;
pub use roles::*;

/// The campus system, facilitating authentication, event management, and
/// administration over a shared storage backend.
pub struct Campus<Db> {
    database: Arc<Db>,

    pub auth: Auth<Db>,
    pub events: Events<Db>,
    pub admin: Admin<Db>,
}

/// A type passed to the managers to access storage and the mail side channel.
pub struct CampusContext<Db> {
    pub database: Arc<Db>,
    pub mailer: Arc<dyn Mailer>,
}

impl<Db> Campus<Db>
where
    Db: Database,
{
    pub fn new(database: Db, mailer: impl Mailer + 'static) -> Self {
        let database = Arc::new(database);

        let context = CampusContext {
            database: database.clone(),
            mailer: Arc::new(mailer),
        };

        Self {
            auth: Auth::new(&context),
            events: Events::new(&context),
            admin: Admin::new(&context),
            database,
        }
    }

    pub fn database(&self) -> &Db {
        &self.database
    }
}

impl<Db> Clone for CampusContext<Db>
where
    Db: Database,
{
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            mailer: self.mailer.clone(),
        }
    }
}
