//! Durable event persistence service.
//!
//! [`EventPersistence`] drains a bus receiver into the `events` table until
//! the bus is dropped at shutdown.

use shopfloor_core::types::DbId;
use shopfloor_db::repositories::EventRepo;
use shopfloor_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::PlatformEvent;

/// Background service that persists platform events to the database.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event persistence lagged, events were lost");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write one event. A name with no `event_types` row is reported as
    /// `RowNotFound` and nothing is stored.
    pub async fn persist(pool: &DbPool, event: &PlatformEvent) -> Result<DbId, sqlx::Error> {
        let source = event
            .source_entity_type
            .as_deref()
            .zip(event.source_entity_id);

        EventRepo::insert_named(
            pool,
            &event.event_type,
            source,
            event.actor.as_deref(),
            &event.payload,
        )
        .await?
        .ok_or(sqlx::Error::RowNotFound)
    }
}
