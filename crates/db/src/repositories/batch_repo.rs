//! Repository for the `batches`, `batch_items` and `batch_stage_history`
//! tables.

use sqlx::{PgConnection, PgPool};
use shopfloor_core::batch::BatchStatus;
use shopfloor_core::types::DbId;

use crate::models::batch::{Batch, BatchStageHistory, StageChange};

/// Column list for batch queries. Expects `batches` aliased as `b`.
const COLUMNS: &str = "b.id, b.name, b.batch_type, b.workflow_template_id, b.current_stage, \
    b.status, \
    ARRAY(SELECT bi.order_item_id FROM batch_items bi \
          WHERE bi.batch_id = b.id ORDER BY bi.order_item_id) AS order_item_ids, \
    b.created_at, b.updated_at";

const HISTORY_COLUMNS: &str =
    "id, batch_id, from_stage, to_stage, notes, transitioned_by, created_at";

/// Provides CRUD and stage movement for production batches.
pub struct BatchRepo;

impl BatchRepo {
    async fn fetch_on(conn: &mut PgConnection, id: DbId) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM batches b WHERE b.id = $1");
        sqlx::query_as::<_, Batch>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Insert a batch and its item memberships in one transaction.
    ///
    /// An item already in another batch violates `uq_batch_items_order_item_id`.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        batch_type: &str,
        workflow_template_id: Option<DbId>,
        order_item_ids: &[DbId],
    ) -> Result<Batch, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO batches (name, batch_type, workflow_template_id)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(name)
        .bind(batch_type)
        .bind(workflow_template_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO batch_items (batch_id, order_item_id)
             SELECT $1, item_id FROM UNNEST($2::BIGINT[]) AS item_id",
        )
        .bind(id)
        .bind(order_item_ids)
        .execute(&mut *tx)
        .await?;

        let batch = Self::fetch_on(&mut tx, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;
        Ok(batch)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Batch>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::fetch_on(&mut conn, id).await
    }

    /// List batches newest first with optional status and template filters.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        workflow_template_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Batch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM batches b
             WHERE ($1::TEXT IS NULL OR b.status = $1)
               AND ($2::BIGINT IS NULL OR b.workflow_template_id = $2)
             ORDER BY b.created_at DESC, b.id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(status)
            .bind(workflow_template_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// All batches shown on a template's board, oldest first.
    pub async fn list_for_board(
        pool: &PgPool,
        workflow_template_id: DbId,
    ) -> Result<Vec<Batch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM batches b
             WHERE b.workflow_template_id = $1
             ORDER BY b.created_at, b.id"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(workflow_template_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a batch by its ID. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM batches WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Stage movement
    // -----------------------------------------------------------------------

    /// Persist a stage change and its history row in one transaction.
    ///
    /// The update only applies while the batch still has `from_stage` and
    /// `from_status`. Returns `None` when it is missing or has moved on.
    pub async fn apply_stage_change(
        pool: &PgPool,
        id: DbId,
        change: &StageChange<'_>,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE batches SET current_stage = $1, status = $2
             WHERE id = $3 AND status = $4 AND current_stage IS NOT DISTINCT FROM $5",
        )
        .bind(change.to_stage)
        .bind(change.status)
        .bind(id)
        .bind(change.from_status)
        .bind(change.from_stage)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(
            "INSERT INTO batch_stage_history
                (batch_id, from_stage, to_stage, notes, transitioned_by)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(change.from_stage)
        .bind(change.to_stage)
        .bind(change.notes)
        .bind(change.transitioned_by)
        .execute(&mut *tx)
        .await?;

        let batch = Self::fetch_on(&mut tx, id).await?;
        tx.commit().await?;
        Ok(batch)
    }

    /// Set a batch's status without moving it, if it is still `from`.
    /// Returns `None` when the batch is missing or its status changed.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        from: BatchStatus,
        to: BatchStatus,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let updated = sqlx::query("UPDATE batches SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to.as_str())
            .bind(id)
            .bind(from.as_str())
            .execute(pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    /// Stage history for a batch, newest first.
    pub async fn history(
        pool: &PgPool,
        batch_id: DbId,
    ) -> Result<Vec<BatchStageHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM batch_stage_history
             WHERE batch_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, BatchStageHistory>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Completion
    // -----------------------------------------------------------------------

    /// The batch an order item belongs to, if any.
    pub async fn batch_id_for_item(
        pool: &PgPool,
        order_item_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT batch_id FROM batch_items WHERE order_item_id = $1")
            .bind(order_item_id)
            .fetch_optional(pool)
            .await
    }

    /// Distinct product categories of the batch's items, sorted.
    pub async fn item_categories(
        pool: &PgPool,
        batch_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT oi.product_category
             FROM batch_items bi
             JOIN order_items oi ON oi.id = bi.order_item_id
             WHERE bi.batch_id = $1
             ORDER BY oi.product_category",
        )
        .bind(batch_id)
        .fetch_all(pool)
        .await
    }

    /// Mark the batch completed if its items have tasks and every one of them
    /// is completed. Returns `true` when this call completed the batch.
    pub async fn complete_if_done(pool: &PgPool, batch_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE batches b SET status = 'completed'
             WHERE b.id = $1
               AND b.status <> 'completed'
               AND EXISTS (
                   SELECT 1 FROM work_tasks t
                   JOIN batch_items bi ON bi.order_item_id = t.order_item_id
                   WHERE bi.batch_id = b.id)
               AND NOT EXISTS (
                   SELECT 1 FROM work_tasks t
                   JOIN batch_items bi ON bi.order_item_id = t.order_item_id
                   WHERE bi.batch_id = b.id AND t.status <> 'completed')",
        )
        .bind(batch_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
