//! Repository for the `events` log and its `event_types` lookup.

use shopfloor_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::{EventEntry, EventType};

const ENTRY_COLUMNS: &str = "e.id, t.name AS event_type, e.source_entity_type, \
     e.source_entity_id, e.actor, e.payload, e.created_at";

pub struct EventRepo;

impl EventRepo {
    pub async fn list_event_types(pool: &PgPool) -> Result<Vec<EventType>, sqlx::Error> {
        sqlx::query_as::<_, EventType>(
            "SELECT id, name, category, description, created_at \
             FROM event_types ORDER BY category, name",
        )
        .fetch_all(pool)
        .await
    }

    /// Append an event, resolving its type by name in the same statement.
    ///
    /// Returns `None` when `event_type` has no `event_types` row; nothing is
    /// written in that case.
    pub async fn insert_named(
        pool: &PgPool,
        event_type: &str,
        source: Option<(&str, DbId)>,
        actor: Option<&str>,
        payload: &serde_json::Value,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO events \
                (event_type_id, source_entity_type, source_entity_id, actor, payload) \
             SELECT t.id, $2, $3, $4, $5 FROM event_types t WHERE t.name = $1 \
             RETURNING id",
        )
        .bind(event_type)
        .bind(source.map(|(kind, _)| kind))
        .bind(source.map(|(_, id)| id))
        .bind(actor)
        .bind(payload)
        .fetch_optional(pool)
        .await
    }

    /// Events about one entity (e.g. `("batch", 7)`), newest first.
    pub async fn list_for_source(
        pool: &PgPool,
        source_entity_type: &str,
        source_entity_id: DbId,
        limit: i64,
    ) -> Result<Vec<EventEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM events e \
             JOIN event_types t ON t.id = e.event_type_id \
             WHERE e.source_entity_type = $1 AND e.source_entity_id = $2 \
             ORDER BY e.created_at DESC, e.id DESC LIMIT $3"
        );
        sqlx::query_as::<_, EventEntry>(&query)
            .bind(source_entity_type)
            .bind(source_entity_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
