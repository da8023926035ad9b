use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema and seed data.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    shopfloor_db::health_check(&pool).await.unwrap();

    let tables = [
        "workflow_templates",
        "workers",
        "orders",
        "order_items",
        "batches",
        "batch_items",
        "batch_stage_history",
        "work_tasks",
        "production_requests",
        "production_logs",
        "repairs",
        "automation_rules",
        "automation_executions",
        "settings",
        "events",
    ];
    for table in tables {
        sqlx::query(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
    }

    let event_types: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM event_types")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(event_types.0 > 0, "event_types should have seed data");
}

/// The model list used by the classifier is seeded.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_headphone_models_seeded(pool: PgPool) {
    let setting = shopfloor_db::repositories::SettingRepo::get(&pool, "headphone_models")
        .await
        .unwrap()
        .expect("headphone_models should be seeded");
    let models = shopfloor_core::settings::parse_headphone_models(&setting.value).unwrap();
    assert!(models.iter().any(|m| m == "Auteur"));
}
