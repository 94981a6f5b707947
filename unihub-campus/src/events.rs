use chrono::Utc;
use log::info;
use thiserror::Error;

use crate::{
    CampusContext, Database, DatabaseError, EventData, NewEvent, PrimaryKey, UpdatedEvent,
};

/// Event manager: CRUD for club events and student registrations.
pub struct Events<Db> {
    context: CampusContext<Db>,
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event is full")]
    Full,
    #[error("Registration deadline has passed")]
    RegistrationClosed,
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

impl<Db> Events<Db>
where
    Db: Database,
{
    pub fn new(context: &CampusContext<Db>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub async fn create(&self, new_event: NewEvent) -> Result<EventData, DatabaseError> {
        let event = self.context.database.create_event(new_event).await?;

        info!(
            "Event {} created by organizer {}",
            event.title, event.organizer_id
        );

        Ok(event)
    }

    /// Updates an event owned by `organizer_id`. Ownership is decided by the
    /// statement itself, so there is no window between check and mutation; a
    /// foreign event looks like a missing one.
    pub async fn update(
        &self,
        updated_event: UpdatedEvent,
        organizer_id: PrimaryKey,
    ) -> Result<EventData, DatabaseError> {
        self.context
            .database
            .update_event(updated_event, organizer_id)
            .await
    }

    /// Deletes an event. `organizer_id` restricts the delete to that owner;
    /// `None` deletes unconditionally (sysAdmin).
    pub async fn delete(
        &self,
        event_id: PrimaryKey,
        organizer_id: Option<PrimaryKey>,
    ) -> Result<(), DatabaseError> {
        self.context
            .database
            .delete_event(event_id, organizer_id)
            .await?;

        info!("Event {} deleted", event_id);

        Ok(())
    }

    pub async fn by_id(&self, event_id: PrimaryKey) -> Result<EventData, DatabaseError> {
        self.context.database.event_by_id(event_id).await
    }

    pub async fn list_all(&self) -> Result<Vec<EventData>, DatabaseError> {
        self.context.database.list_events().await
    }

    pub async fn by_organizer(
        &self,
        organizer_id: PrimaryKey,
    ) -> Result<Vec<EventData>, DatabaseError> {
        self.context.database.events_by_organizer(organizer_id).await
    }

    pub async fn participated(&self, user_id: PrimaryKey) -> Result<Vec<EventData>, DatabaseError> {
        self.context.database.events_registered_by(user_id).await
    }

    /// Registers a student for an event. The database arbitrates both the
    /// capacity race and the at-most-once invariant.
    pub async fn register(
        &self,
        user_id: PrimaryKey,
        event_id: PrimaryKey,
    ) -> Result<(), EventError> {
        let event = self.context.database.event_by_id(event_id).await?;

        if event.registration_deadline <= Utc::now() {
            return Err(EventError::RegistrationClosed);
        }

        let registered = self
            .context
            .database
            .create_registration(user_id, event_id)
            .await?;

        if !registered {
            return Err(EventError::Full);
        }

        info!("User {} registered for event {}", user_id, event.title);

        Ok(())
    }

    pub async fn unregister(
        &self,
        user_id: PrimaryKey,
        event_id: PrimaryKey,
    ) -> Result<(), DatabaseError> {
        self.context
            .database
            .delete_registration(user_id, event_id)
            .await?;

        info!("User {} unregistered from event {}", user_id, event_id);

        Ok(())
    }
}
