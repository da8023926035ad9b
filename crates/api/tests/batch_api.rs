//! HTTP-level tests for batches, transitions and the flow board.

mod common;

use axum::http::StatusCode;
use common::{body_json, data, delete, get, post_json, post_json_as, put_json};
use serde_json::json;
use sqlx::PgPool;

async fn transition(pool: &PgPool, batch_id: i64, to_stage: serde_json::Value) -> axum::response::Response {
    post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/batches/{batch_id}/transition"),
        json!({"to_stage": to_stage, "notes": "moved"}),
    )
    .await
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_batch_starts_pending_with_default_template(pool: PgPool) {
    let template_id = common::create_template(&pool, common::template_body("Main")).await;
    post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/workflows/{template_id}/default"),
        json!({}),
    )
    .await;
    let items = common::seed_order(&pool, 1001, &[("Auteur", "headphone"), ("Pads", "accessory")]).await;

    let batch = common::create_batch(&pool, None, &[items[1], items[0], items[1]]).await;

    assert_eq!(batch["status"], "pending");
    assert!(batch["current_stage"].is_null());
    assert_eq!(batch["batch_type"], "standard");
    assert_eq!(batch["workflow_template_id"], template_id);
    assert_eq!(batch["order_item_ids"], json!([items[0], items[1]]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_batch_requires_items(pool: PgPool) {
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/batches",
        json!({"name": "Empty", "order_item_ids": []}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_batch_with_missing_item_is_rejected(pool: PgPool) {
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/batches",
        json!({"name": "Ghost", "order_item_ids": [999_999]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn item_cannot_join_two_batches(pool: PgPool) {
    let items = common::seed_order(&pool, 1002, &[("Auteur", "headphone")]).await;
    common::create_batch(&pool, None, &items).await;

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/batches",
        json!({"name": "Second", "order_item_ids": items}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn worker_cannot_create_batches(pool: PgPool) {
    let items = common::seed_order(&pool, 1003, &[("Auteur", "headphone")]).await;
    let response = post_json_as(
        common::build_test_app(pool),
        "/api/v1/batches",
        "worker",
        json!({"name": "Nope", "order_item_ids": items}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn transition_into_stage_activates_and_records_history(pool: PgPool) {
    let template_id = common::create_template(&pool, common::template_body("Main")).await;
    let items = common::seed_order(&pool, 1004, &[("Auteur", "headphone")]).await;
    let batch = common::create_batch(&pool, Some(template_id), &items).await;
    let id = batch["id"].as_i64().unwrap();

    let response = transition(&pool, id, json!("assembly")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let moved = data(response).await;
    assert_eq!(moved["current_stage"], "assembly");
    assert_eq!(moved["status"], "active");

    let response = transition(&pool, id, json!("pending")).await;
    let back = data(response).await;
    assert!(back["current_stage"].is_null());
    assert_eq!(back["status"], "pending");

    let history = data(get(common::build_test_app(pool), &format!("/api/v1/batches/{id}/history")).await).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["from_stage"], "assembly");
    assert!(history[0]["to_stage"].is_null());
    assert!(history[1]["from_stage"].is_null());
    assert_eq!(history[1]["to_stage"], "assembly");
    assert_eq!(history[1]["notes"], "moved");
    assert_eq!(history[1]["transitioned_by"], "test-manager");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn transition_to_unknown_stage_is_rejected(pool: PgPool) {
    let template_id = common::create_template(&pool, common::template_body("Main")).await;
    let items = common::seed_order(&pool, 1005, &[("Auteur", "headphone")]).await;
    let id = common::create_batch(&pool, Some(template_id), &items).await["id"]
        .as_i64()
        .unwrap();

    let response = transition(&pool, id, json!("painting")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completed_batch_cannot_move(pool: PgPool) {
    let template_id = common::create_template(&pool, common::template_body("Main")).await;
    let items = common::seed_order(&pool, 1006, &[("Auteur", "headphone")]).await;
    let id = common::create_batch(&pool, Some(template_id), &items).await["id"]
        .as_i64()
        .unwrap();

    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/batches/{id}/status"),
        json!({"status": "completed"}),
    )
    .await;
    assert_eq!(data(response).await["status"], "completed");

    let response = transition(&pool, id, json!("sanding")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_batch_status_is_rejected(pool: PgPool) {
    let items = common::seed_order(&pool, 1007, &[("Auteur", "headphone")]).await;
    let id = common::create_batch(&pool, None, &items).await["id"].as_i64().unwrap();

    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/batches/{id}/status"),
        json!({"status": "archived"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn board_buckets_batches_by_stage(pool: PgPool) {
    let template_id = common::create_template(&pool, common::template_body("Main")).await;
    let items = common::seed_order(&pool, 1008, &[("A", "headphone"), ("B", "headphone")]).await;
    common::create_batch(&pool, Some(template_id), &items[..1]).await;
    let moved = common::create_batch(&pool, Some(template_id), &items[1..]).await;
    transition(&pool, moved["id"].as_i64().unwrap(), json!("sanding")).await;

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/batches/board?workflow_template_id={template_id}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let board = data(response).await;

    let columns = board["columns"].as_array().unwrap();
    let codes: Vec<&str> = columns.iter().map(|c| c["stage_code"].as_str().unwrap()).collect();
    assert_eq!(codes, vec!["pending", "sanding", "assembly"]);
    assert_eq!(columns[0]["items"].as_array().unwrap().len(), 1);
    assert_eq!(columns[1]["items"][0]["id"], moved["id"]);
    assert!(columns[2]["items"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn board_without_template_or_default_is_400(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v1/batches/board").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_batch_frees_items(pool: PgPool) {
    let items = common::seed_order(&pool, 1009, &[("Auteur", "headphone")]).await;
    let id = common::create_batch(&pool, None, &items).await["id"].as_i64().unwrap();

    let response = delete(common::build_test_app(pool.clone()), &format!("/api/v1/batches/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    common::create_batch(&pool, None, &items).await;
}

// ---------------------------------------------------------------------------
// Activity feed
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn batch_events_lists_persisted_activity(pool: PgPool) {
    let state = common::build_test_state(pool.clone(), common::test_config());
    let mut receiver = state.event_bus.subscribe();
    let template_id = common::create_template(&pool, common::template_body("Feed")).await;
    let items = common::seed_order(&pool, 4001, &[("Auteur", "headphone")]).await;

    let response = post_json(
        common::app_from_state(state.clone()),
        "/api/v1/batches",
        json!({"name": "Feed batch", "order_item_ids": items, "workflow_template_id": template_id}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let batch_id = data(response).await["id"].as_i64().unwrap();

    let response = post_json(
        common::app_from_state(state.clone()),
        &format!("/api/v1/batches/{batch_id}/transition"),
        json!({"to_stage": "sanding"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    while let Ok(event) = receiver.try_recv() {
        shopfloor_events::EventPersistence::persist(&pool, &event)
            .await
            .unwrap();
    }

    let response = get(
        common::app_from_state(state),
        &format!("/api/v1/batches/{batch_id}/events"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let events = data(response).await;
    let names: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["batch.status_changed", "batch.stage_entered", "batch.created"]
    );
    assert_eq!(events[2]["actor"], "test-manager");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn batch_events_for_missing_batch_is_404(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v1/batches/424242/events").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
