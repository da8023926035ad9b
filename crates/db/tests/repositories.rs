//! Repository tests against a real database.

use assert_matches::assert_matches;
use sqlx::PgPool;

use shopfloor_core::batch::BatchStatus;
use shopfloor_core::tasks::{derive_required_tasks, TaskStatus};
use shopfloor_core::workflow::{generate_transitions, AutoAssignRule, Stage};
use shopfloor_db::models::batch::StageChange;
use shopfloor_db::models::order::{UpsertOrder, UpsertOrderItem};
use shopfloor_db::models::production::{CreateProductionRequest, LogProduction};
use shopfloor_db::models::worker::CreateWorker;
use shopfloor_db::repositories::workflow_template_repo::TemplateBody;
use shopfloor_db::repositories::{
    BatchRepo, OrderRepo, ProductionRepo, WorkTaskRepo, WorkerRepo, WorkflowTemplateRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn stage(code: &str) -> Stage {
    Stage {
        id: format!("stage-{code}"),
        stage_code: code.to_string(),
        name: code.to_string(),
        description: None,
        estimated_hours: 1.0,
        required_skills: Default::default(),
        is_optional: false,
        is_automated: false,
        auto_assign_rule: AutoAssignRule::Manual,
        specific_worker_id: None,
    }
}

async fn seed_items(pool: &PgPool, shopify_order_id: i64, titles: &[&str]) -> Vec<i64> {
    let order = UpsertOrder {
        shopify_order_id,
        order_number: format!("#{shopify_order_id}"),
        customer_name: Some("Test Customer".into()),
        customer_email: None,
        total_price: Some(100.0),
        financial_status: Some("paid".into()),
        fulfillment_status: None,
        ordered_at: None,
    };
    let items: Vec<UpsertOrderItem> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| UpsertOrderItem {
            shopify_line_item_id: shopify_order_id * 100 + i as i64,
            title: title.to_string(),
            variant_title: None,
            sku: None,
            quantity: 1,
            price: Some(50.0),
            properties: serde_json::json!([]),
            product_category: "accessory".into(),
            specs: serde_json::json!({}),
        })
        .collect();
    let (_, stored) = OrderRepo::upsert_with_items(pool, &order, &items)
        .await
        .unwrap();
    stored.into_iter().map(|i| i.id).collect()
}

// ---------------------------------------------------------------------------
// Workflow templates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_one_default_template(pool: PgPool) {
    let stages = vec![stage("sanding"), stage("finishing")];
    let transitions = generate_transitions(&stages);
    let body = |name: &'static str| TemplateBody {
        name,
        description: None,
        stages: &stages,
        stage_transitions: &transitions,
        is_active: true,
        is_default: true,
    };

    let first = WorkflowTemplateRepo::create(&pool, &body("First")).await.unwrap();
    let second = WorkflowTemplateRepo::create(&pool, &body("Second")).await.unwrap();

    let first = WorkflowTemplateRepo::find_by_id(&pool, first.id).await.unwrap().unwrap();
    assert!(!first.is_default);
    let default = WorkflowTemplateRepo::find_default(&pool).await.unwrap().unwrap();
    assert_eq!(default.id, second.id);

    WorkflowTemplateRepo::set_default(&pool, first.id).await.unwrap();
    let default = WorkflowTemplateRepo::find_default(&pool).await.unwrap().unwrap();
    assert_eq!(default.id, first.id);
    assert_eq!(default.parsed_stages().unwrap(), stages);
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn order_sync_is_idempotent(pool: PgPool) {
    let first = seed_items(&pool, 1001, &["Velour Pads"]).await;
    let again = seed_items(&pool, 1001, &["Velour Pads"]).await;
    assert_eq!(first, again);

    let orders = OrderRepo::list(&pool, 50, 0).await.unwrap();
    assert_eq!(orders.len(), 1);
}

// ---------------------------------------------------------------------------
// Tasks and batches
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn import_creates_tasks_once(pool: PgPool) {
    let items = seed_items(&pool, 2001, &["Velour Pads"]).await;
    let tasks = derive_required_tasks("accessory", false);

    let created = WorkTaskRepo::import_item(&pool, items[0], &tasks)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].task_type, "qc");
    assert_eq!(created[1].sequence, 2);

    let second = WorkTaskRepo::import_item(&pool, items[0], &tasks).await.unwrap();
    assert_matches!(second, None);

    let stored = WorkTaskRepo::list_for_item(&pool, items[0]).await.unwrap();
    let types: Vec<&str> = stored.iter().map(|t| t.task_type.as_str()).collect();
    assert_eq!(types, ["qc", "packaging"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn batch_completes_when_all_tasks_done(pool: PgPool) {
    let items = seed_items(&pool, 3001, &["Velour Pads"]).await;
    let tasks = derive_required_tasks("accessory", false);
    let created = WorkTaskRepo::import_item(&pool, items[0], &tasks)
        .await
        .unwrap()
        .unwrap();
    let batch = BatchRepo::create(&pool, "B1", "standard", None, &items)
        .await
        .unwrap();
    assert_eq!(batch.order_item_ids, items);

    assert!(!BatchRepo::complete_if_done(&pool, batch.id).await.unwrap());

    for task in &created {
        WorkTaskRepo::set_status(&pool, task.id, TaskStatus::Pending, TaskStatus::Completed, None)
            .await
            .unwrap()
            .unwrap();
    }
    assert!(BatchRepo::complete_if_done(&pool, batch.id).await.unwrap());
    let batch = BatchRepo::find_by_id(&pool, batch.id).await.unwrap().unwrap();
    assert_eq!(batch.status, "completed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn item_cannot_join_two_batches(pool: PgPool) {
    let items = seed_items(&pool, 3501, &["Strap"]).await;
    BatchRepo::create(&pool, "B1", "standard", None, &items).await.unwrap();

    let err = BatchRepo::create(&pool, "B2", "standard", None, &items)
        .await
        .unwrap_err();
    let constraint = err.as_database_error().and_then(|e| e.constraint().map(str::to_string));
    assert_eq!(constraint.as_deref(), Some("uq_batch_items_order_item_id"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stage_change_writes_history(pool: PgPool) {
    let items = seed_items(&pool, 4001, &["Cable"]).await;
    let batch = BatchRepo::create(&pool, "B1", "standard", None, &items)
        .await
        .unwrap();

    let change = StageChange {
        from_stage: None,
        to_stage: Some("sanding"),
        from_status: "pending",
        status: "active",
        notes: Some("starting"),
        transitioned_by: Some("tester"),
    };
    let moved = BatchRepo::apply_stage_change(&pool, batch.id, &change)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.current_stage.as_deref(), Some("sanding"));

    let history = BatchRepo::history(&pool, batch.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].to_stage.as_deref(), Some("sanding"));
    assert_eq!(history[0].from_stage, None);

    // Replaying the same change finds the batch no longer pending.
    let replay = BatchRepo::apply_stage_change(&pool, batch.id, &change)
        .await
        .unwrap();
    assert_matches!(replay, None);
    assert_eq!(BatchRepo::history(&pool, batch.id).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stale_stage_change_does_not_reopen_completed_batch(pool: PgPool) {
    let items = seed_items(&pool, 4101, &["Cable"]).await;
    let batch = BatchRepo::create(&pool, "B2", "standard", None, &items)
        .await
        .unwrap();
    BatchRepo::set_status(&pool, batch.id, BatchStatus::Pending, BatchStatus::Active)
        .await
        .unwrap()
        .unwrap();
    BatchRepo::set_status(&pool, batch.id, BatchStatus::Active, BatchStatus::Completed)
        .await
        .unwrap()
        .unwrap();

    // A writer that read the batch while it was still active.
    let stale = StageChange {
        from_stage: None,
        to_stage: Some("assembly"),
        from_status: "active",
        status: "active",
        notes: None,
        transitioned_by: Some("tester"),
    };
    let result = BatchRepo::apply_stage_change(&pool, batch.id, &stale)
        .await
        .unwrap();
    assert_matches!(result, None);

    let stored = BatchRepo::find_by_id(&pool, batch.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "completed");
    assert_eq!(stored.current_stage, None);
    assert!(BatchRepo::history(&pool, batch.id).await.unwrap().is_empty());

    let stale_status =
        BatchRepo::set_status(&pool, batch.id, BatchStatus::Active, BatchStatus::OnHold)
            .await
            .unwrap();
    assert_matches!(stale_status, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn task_status_write_needs_the_expected_status(pool: PgPool) {
    let items = seed_items(&pool, 4201, &["Pads"]).await;
    let created = WorkTaskRepo::import_item(&pool, items[0], &derive_required_tasks("accessory", false))
        .await
        .unwrap()
        .unwrap();
    let qc = &created[0];

    let done = WorkTaskRepo::set_status(&pool, qc.id, TaskStatus::Pending, TaskStatus::Completed, None)
        .await
        .unwrap();
    assert_matches!(done, Some(ref t) if t.status == "completed");

    // A second completer that also read `pending` loses.
    let again = WorkTaskRepo::set_status(&pool, qc.id, TaskStatus::Pending, TaskStatus::Completed, None)
        .await
        .unwrap();
    assert_matches!(again, None);

    let assigned = WorkTaskRepo::assign(&pool, qc.id, TaskStatus::Pending, 1).await.unwrap();
    assert_matches!(assigned, None);
    let failed = WorkTaskRepo::fail_qc(&pool, qc.id, TaskStatus::InProgress, None).await.unwrap();
    assert_matches!(failed, None);

    let stored = WorkTaskRepo::find_by_id(&pool, qc.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "completed");
    assert_eq!(stored.worker_id, None);
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn worker_load_counts_open_tasks(pool: PgPool) {
    let worker = WorkerRepo::create(
        &pool,
        &CreateWorker {
            name: "Sam".into(),
            email: "sam@example.com".into(),
            role: None,
            skills: vec!["qc".into()],
        },
    )
    .await
    .unwrap();
    assert_eq!(worker.role, "worker");

    let items = seed_items(&pool, 5001, &["Pads"]).await;
    let created = WorkTaskRepo::import_item(&pool, items[0], &derive_required_tasks("accessory", false))
        .await
        .unwrap()
        .unwrap();
    WorkTaskRepo::assign(&pool, created[0].id, TaskStatus::Pending, worker.id)
        .await
        .unwrap()
        .unwrap();

    let snapshot = WorkerRepo::load_snapshot(&pool).await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].open_tasks, 1);
    assert_eq!(
        WorkTaskRepo::last_assigned_worker(&pool, "qc").await.unwrap(),
        Some(worker.id)
    );
}

// ---------------------------------------------------------------------------
// Production
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn logging_to_quantity_fulfils_request(pool: PgPool) {
    let request = ProductionRepo::create_request(
        &pool,
        &CreateProductionRequest {
            product_name: "Auteur Classic".into(),
            quantity_requested: 3,
            due_date: None,
            notes: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(request.status, "open");

    let log = |quantity| LogProduction {
        quantity,
        worker_id: None,
        notes: None,
    };

    let first = ProductionRepo::log_production(&pool, request.id, &log(2))
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(first.request.quantity_completed, 2);
    assert_eq!(first.request.status, "open");

    let second = ProductionRepo::log_production(&pool, request.id, &log(1))
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(second.request.status, "fulfilled");

    let third = ProductionRepo::log_production(&pool, request.id, &log(1))
        .await
        .unwrap()
        .unwrap();
    assert!(third.is_err());

    assert_eq!(ProductionRepo::list_logs(&pool, request.id).await.unwrap().len(), 2);
}
