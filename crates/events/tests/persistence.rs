use sqlx::PgPool;

use shopfloor_db::repositories::EventRepo;
use shopfloor_events::{names, EventBus, EventPersistence, PlatformEvent};

#[sqlx::test(migrations = "../../db/migrations")]
async fn every_named_event_is_seeded(pool: PgPool) {
    let seeded: Vec<String> = EventRepo::list_event_types(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    for name in [
        names::BATCH_CREATED,
        names::BATCH_STAGE_ENTERED,
        names::BATCH_STATUS_CHANGED,
        names::BATCH_COMPLETED,
        names::TASK_ASSIGNED,
        names::TASK_COMPLETED,
        names::TASK_QC_FAILED,
        names::ORDER_SYNCED,
        names::ORDER_ITEM_IMPORTED,
        names::PRODUCTION_LOGGED,
        names::REPAIR_STATUS_CHANGED,
    ] {
        assert!(
            seeded.iter().any(|s| s == name),
            "{name} missing from event_types"
        );
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn run_persists_until_bus_dropped(pool: PgPool) {
    let bus = EventBus::default();
    let handle = tokio::spawn(EventPersistence::run(pool.clone(), bus.subscribe()));

    bus.publish(
        PlatformEvent::new(names::BATCH_CREATED)
            .with_source("batch", 7)
            .with_actor("tester"),
    );
    drop(bus);
    handle.await.unwrap();

    let events = EventRepo::list_for_source(&pool, "batch", 7, 10).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, names::BATCH_CREATED);
    assert_eq!(events[0].actor.as_deref(), Some("tester"));

    let other = EventRepo::list_for_source(&pool, "repair", 7, 10).await.unwrap();
    assert!(other.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_event_name_is_rejected(pool: PgPool) {
    let err = EventPersistence::persist(&pool, &PlatformEvent::new("batch.exploded"))
        .await
        .unwrap_err();
    assert!(matches!(err, sqlx::Error::RowNotFound));
}
