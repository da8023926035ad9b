//! HTTP-level tests for order-item import, task assignment, QC and batch
//! auto-completion.

mod common;

use axum::http::StatusCode;
use common::{data, get, post_json, post_json_as};
use serde_json::json;
use sqlx::PgPool;

async fn import(pool: &PgPool, item_ids: &[i64]) -> serde_json::Value {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/shopify/import",
        json!({"order_item_ids": item_ids}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    data(response).await
}

async fn create_worker(pool: &PgPool, name: &str, skills: &[&str]) -> i64 {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/workers",
        json!({"name": name, "email": format!("{name}@example.com"), "skills": skills}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    data(response).await["id"].as_i64().unwrap()
}

/// The only task of `task_type`.
async fn task_of_type(pool: &PgPool, task_type: &str) -> serde_json::Value {
    let tasks = data(
        get(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/tasks?task_type={task_type}"),
        )
        .await,
    )
    .await;
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1, "expected one {task_type} task");
    tasks[0].clone()
}

async fn action(pool: &PgPool, task_id: i64, verb: &str, body: serde_json::Value) -> axum::response::Response {
    post_json_as(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/tasks/{task_id}/{verb}"),
        "supervisor",
        body,
    )
    .await
}

async fn assign_and_complete(pool: &PgPool, task_id: i64, worker_id: i64) {
    let response = action(pool, task_id, "assign", json!({"worker_id": worker_id})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = action(pool, task_id, "complete", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn import_creates_tasks_per_category_once(pool: PgPool) {
    let items = common::seed_order(&pool, 2001, &[("Auteur", "headphone"), ("Pads", "accessory")]).await;

    let summary = import(&pool, &items).await;
    assert_eq!(summary["imported_items"], 2);
    assert_eq!(summary["created_tasks"], 6);
    assert!(summary["error"].is_null());

    let again = import(&pool, &items).await;
    assert_eq!(again["imported_items"], 0);
    assert_eq!(again["skipped_items"], 2);
    assert_eq!(again["created_tasks"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn import_stops_at_first_failure_and_keeps_progress(pool: PgPool) {
    let items = common::seed_order(&pool, 2002, &[("Pads", "accessory"), ("Cable", "other")]).await;

    let summary = import(&pool, &[items[0], 999_999, items[1]]).await;

    assert_eq!(summary["imported_items"], 1);
    assert_eq!(summary["failed_item_id"], 999_999);
    assert!(summary["error"].as_str().unwrap().contains("not found"));

    // The item after the failure was never attempted.
    let retry = import(&pool, &[items[1]]).await;
    assert_eq!(retry["imported_items"], 1);
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn explicit_assignment(pool: PgPool) {
    let items = common::seed_order(&pool, 2003, &[("Cable", "other")]).await;
    import(&pool, &items).await;
    let worker = create_worker(&pool, "kai", &[]).await;
    let task = task_of_type(&pool, "packaging").await;

    let response = action(&pool, task["id"].as_i64().unwrap(), "assign", json!({"worker_id": worker})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let assigned = data(response).await;
    assert_eq!(assigned["status"], "assigned");
    assert_eq!(assigned["worker_id"], worker);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn least_busy_picks_skilled_worker(pool: PgPool) {
    let items = common::seed_order(&pool, 2004, &[("Cable", "other")]).await;
    import(&pool, &items).await;
    create_worker(&pool, "no-skill", &["sanding"]).await;
    let packer = create_worker(&pool, "packer", &["packaging"]).await;
    let task = task_of_type(&pool, "packaging").await;

    let response = action(&pool, task["id"].as_i64().unwrap(), "assign", json!({"rule": "least_busy"})).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(data(response).await["worker_id"], packer);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn no_eligible_worker_conflicts(pool: PgPool) {
    let items = common::seed_order(&pool, 2005, &[("Cable", "other")]).await;
    import(&pool, &items).await;
    create_worker(&pool, "sander", &["sanding"]).await;
    let task = task_of_type(&pool, "packaging").await;

    let response = action(&pool, task["id"].as_i64().unwrap(), "assign", json!({"rule": "least_busy"})).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn manual_rule_needs_worker_id(pool: PgPool) {
    let items = common::seed_order(&pool, 2006, &[("Cable", "other")]).await;
    import(&pool, &items).await;
    let task = task_of_type(&pool, "packaging").await;

    let response = action(&pool, task["id"].as_i64().unwrap(), "assign", json!({})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pending_task_cannot_be_completed(pool: PgPool) {
    let items = common::seed_order(&pool, 2007, &[("Cable", "other")]).await;
    import(&pool, &items).await;
    let task = task_of_type(&pool, "packaging").await;

    let response = action(&pool, task["id"].as_i64().unwrap(), "complete", json!({})).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// QC
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn qc_fail_reopens_assembly_and_rework_reopens_qc(pool: PgPool) {
    let items = common::seed_order(&pool, 2008, &[("Auteur", "headphone")]).await;
    import(&pool, &items).await;
    let worker = create_worker(&pool, "tech", &[]).await;

    let assembly = task_of_type(&pool, "assembly").await["id"].as_i64().unwrap();
    let qc = task_of_type(&pool, "qc").await["id"].as_i64().unwrap();
    assign_and_complete(&pool, assembly, worker).await;
    action(&pool, qc, "assign", json!({"worker_id": worker})).await;

    let response = action(&pool, qc, "qc", json!({"passed": false, "notes": "driver rattle"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = data(response).await;
    assert_eq!(outcome["task"]["status"], "qc_failed");
    assert_eq!(outcome["reopened_task"]["id"], assembly);
    assert_eq!(outcome["reopened_task"]["status"], "pending");
    assert!(outcome["reopened_task"]["worker_id"].is_null());

    assign_and_complete(&pool, assembly, worker).await;
    assert_eq!(task_of_type(&pool, "qc").await["status"], "pending");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn qc_result_on_non_qc_task_is_rejected(pool: PgPool) {
    let items = common::seed_order(&pool, 2009, &[("Cable", "other")]).await;
    import(&pool, &items).await;
    let task = task_of_type(&pool, "packaging").await;

    let response = action(&pool, task["id"].as_i64().unwrap(), "qc", json!({"passed": true})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Batch completion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn batch_completes_when_last_task_completes(pool: PgPool) {
    let items = common::seed_order(&pool, 2010, &[("Pads", "accessory")]).await;
    import(&pool, &items).await;
    let batch_id = common::create_batch(&pool, None, &items).await["id"].as_i64().unwrap();
    let worker = create_worker(&pool, "finisher", &[]).await;

    let qc = task_of_type(&pool, "qc").await["id"].as_i64().unwrap();
    let packaging = task_of_type(&pool, "packaging").await["id"].as_i64().unwrap();

    action(&pool, qc, "assign", json!({"worker_id": worker})).await;
    let response = action(&pool, qc, "qc", json!({"passed": true})).await;
    assert_eq!(data(response).await["task"]["status"], "completed");

    let batch = data(get(common::build_test_app(pool.clone()), &format!("/api/v1/batches/{batch_id}")).await).await;
    assert_eq!(batch["status"], "pending");

    assign_and_complete(&pool, packaging, worker).await;

    let batch = data(get(common::build_test_app(pool.clone()), &format!("/api/v1/batches/{batch_id}")).await).await;
    assert_eq!(batch["status"], "completed");

    let open = data(get(common::build_test_app(pool), &format!("/api/v1/workers/{worker}/tasks")).await).await;
    assert!(open.as_array().unwrap().is_empty());
}
