//! Repository for the `work_tasks` table.

use sqlx::PgPool;
use shopfloor_core::tasks::{TaskStatus, TaskType};
use shopfloor_core::types::DbId;

use crate::models::work_task::{TaskListParams, WorkTask};

const COLUMNS: &str = "id, order_item_id, task_type, status, sequence, worker_id, notes, \
    assigned_at, started_at, completed_at, created_at, updated_at";

/// Provides task creation, lifecycle updates and queries.
pub struct WorkTaskRepo;

impl WorkTaskRepo {
    /// Create the task list for an order item and stamp the item as imported,
    /// in one transaction.
    ///
    /// Returns `None` without writing if the item was already imported.
    pub async fn import_item(
        pool: &PgPool,
        order_item_id: DbId,
        tasks: &[TaskType],
    ) -> Result<Option<Vec<WorkTask>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE order_items SET imported_at = NOW()
             WHERE id = $1 AND imported_at IS NULL",
        )
        .bind(order_item_id)
        .execute(&mut *tx)
        .await?;
        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO work_tasks (order_item_id, task_type, sequence)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let mut created = Vec::with_capacity(tasks.len());
        for (idx, task_type) in tasks.iter().enumerate() {
            let task = sqlx::query_as::<_, WorkTask>(&query)
                .bind(order_item_id)
                .bind(task_type.as_str())
                .bind(idx as i32 + 1)
                .fetch_one(&mut *tx)
                .await?;
            created.push(task);
        }

        tx.commit().await?;
        Ok(Some(created))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WorkTask>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_tasks WHERE id = $1");
        sqlx::query_as::<_, WorkTask>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tasks matching the optional filters, oldest first.
    pub async fn list(
        pool: &PgPool,
        params: &TaskListParams,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WorkTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_tasks
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::BIGINT IS NULL OR worker_id = $2)
               AND ($3::TEXT IS NULL OR task_type = $3)
             ORDER BY created_at, order_item_id, sequence
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, WorkTask>(&query)
            .bind(&params.status)
            .bind(params.worker_id)
            .bind(&params.task_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Open tasks currently held by a worker.
    pub async fn open_for_worker(
        pool: &PgPool,
        worker_id: DbId,
    ) -> Result<Vec<WorkTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_tasks
             WHERE worker_id = $1 AND status IN ('pending', 'assigned', 'in_progress')
             ORDER BY created_at, sequence"
        );
        sqlx::query_as::<_, WorkTask>(&query)
            .bind(worker_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_item(
        pool: &PgPool,
        order_item_id: DbId,
    ) -> Result<Vec<WorkTask>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_tasks WHERE order_item_id = $1 ORDER BY sequence"
        );
        sqlx::query_as::<_, WorkTask>(&query)
            .bind(order_item_id)
            .fetch_all(pool)
            .await
    }

    /// The worker most recently assigned a task of this type.
    pub async fn last_assigned_worker(
        pool: &PgPool,
        task_type: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let row: Option<Option<DbId>> = sqlx::query_scalar(
            "SELECT worker_id FROM work_tasks
             WHERE task_type = $1 AND worker_id IS NOT NULL AND assigned_at IS NOT NULL
             ORDER BY assigned_at DESC, id DESC
             LIMIT 1",
        )
        .bind(task_type)
        .fetch_optional(pool)
        .await?;
        Ok(row.flatten())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    // Status writes below are compare-and-set on the status the caller
    // validated against; `None` means the task is gone or has moved on.

    /// Assign a task that is still `from` to a worker.
    pub async fn assign(
        pool: &PgPool,
        id: DbId,
        from: TaskStatus,
        worker_id: DbId,
    ) -> Result<Option<WorkTask>, sqlx::Error> {
        let query = format!(
            "UPDATE work_tasks SET
                worker_id = $1,
                status = 'assigned',
                assigned_at = NOW()
             WHERE id = $2 AND status = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkTask>(&query)
            .bind(worker_id)
            .bind(id)
            .bind(from.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Move a task from `from` to `to`, stamping `started_at`/`completed_at`
    /// as needed.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        from: TaskStatus,
        to: TaskStatus,
        notes: Option<&str>,
    ) -> Result<Option<WorkTask>, sqlx::Error> {
        let query = format!(
            "UPDATE work_tasks SET
                status = $1,
                notes = COALESCE($2, notes),
                started_at = CASE WHEN $1 = 'in_progress' THEN NOW() ELSE started_at END,
                completed_at = CASE WHEN $1 IN ('completed', 'qc_failed') THEN NOW()
                                    WHEN $1 = 'pending' THEN NULL
                                    ELSE completed_at END
             WHERE id = $3 AND status = $4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkTask>(&query)
            .bind(to.as_str())
            .bind(notes)
            .bind(id)
            .bind(from.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Record a failed QC task and reopen the item's assembly task, in one
    /// transaction. Returns the failed QC task and the reopened assembly task
    /// (if the item has one).
    pub async fn fail_qc(
        pool: &PgPool,
        qc_task_id: DbId,
        from: TaskStatus,
        notes: Option<&str>,
    ) -> Result<Option<(WorkTask, Option<WorkTask>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE work_tasks SET status = 'qc_failed', notes = COALESCE($1, notes),
                completed_at = NOW()
             WHERE id = $2 AND status = $3
             RETURNING {COLUMNS}"
        );
        let Some(qc_task) = sqlx::query_as::<_, WorkTask>(&query)
            .bind(notes)
            .bind(qc_task_id)
            .bind(from.as_str())
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        let reopen = format!(
            "UPDATE work_tasks SET status = 'pending', worker_id = NULL, assigned_at = NULL,
                started_at = NULL, completed_at = NULL
             WHERE order_item_id = $1 AND task_type = 'assembly'
             RETURNING {COLUMNS}"
        );
        let assembly = sqlx::query_as::<_, WorkTask>(&reopen)
            .bind(qc_task.order_item_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((qc_task, assembly)))
    }

    /// Put a failed QC task for the item back to `pending` once assembly is
    /// redone. Returns the reopened task, if any.
    pub async fn reopen_failed_qc(
        pool: &PgPool,
        order_item_id: DbId,
    ) -> Result<Option<WorkTask>, sqlx::Error> {
        let query = format!(
            "UPDATE work_tasks SET status = 'pending', worker_id = NULL, assigned_at = NULL,
                started_at = NULL, completed_at = NULL
             WHERE order_item_id = $1 AND task_type = 'qc' AND status = 'qc_failed'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkTask>(&query)
            .bind(order_item_id)
            .fetch_optional(pool)
            .await
    }
}
