//! Repository for the `production_requests` and `production_logs` tables.

use sqlx::PgPool;
use shopfloor_core::production::{status_after_log, ProductionRequestStatus};
use shopfloor_core::types::DbId;

use crate::models::production::{
    CreateProductionRequest, LogProduction, LoggedProduction, ProductionLog, ProductionRequest,
};

const COLUMNS: &str = "id, product_name, quantity_requested, quantity_completed, status, \
    due_date, notes, created_at, updated_at";

const LOG_COLUMNS: &str = "id, request_id, worker_id, quantity, notes, created_at";

/// Provides CRUD for production requests and their logs.
pub struct ProductionRepo;

impl ProductionRepo {
    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    pub async fn create_request(
        pool: &PgPool,
        input: &CreateProductionRequest,
    ) -> Result<ProductionRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO production_requests (product_name, quantity_requested, due_date, notes)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductionRequest>(&query)
            .bind(&input.product_name)
            .bind(input.quantity_requested)
            .bind(input.due_date)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_request(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ProductionRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM production_requests WHERE id = $1");
        sqlx::query_as::<_, ProductionRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List requests by due date (undated last), optionally by status.
    pub async fn list_requests(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductionRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM production_requests
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY due_date ASC NULLS LAST, id
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ProductionRequest>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Cancel an open request. Returns the updated row, or `None` if the
    /// request does not exist or is no longer open.
    pub async fn cancel_request(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ProductionRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE production_requests SET status = 'cancelled'
             WHERE id = $1 AND status = 'open'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductionRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Logs
    // -----------------------------------------------------------------------

    /// Insert a log row and bump the request's completed count in one
    /// transaction. The request row is locked for the duration so concurrent
    /// logs serialize. Returns `None` if the request does not exist.
    ///
    /// The caller validates the request status beforehand; this re-checks it
    /// under the lock and returns `Ok(Err(status))` if it changed.
    pub async fn log_production(
        pool: &PgPool,
        request_id: DbId,
        input: &LogProduction,
    ) -> Result<Option<Result<LoggedProduction, ProductionRequestStatus>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(String, i32, i32)> = sqlx::query_as(
            "SELECT status, quantity_completed, quantity_requested
             FROM production_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((status, completed, requested)) = locked else {
            tx.rollback().await?;
            return Ok(None);
        };
        let status = ProductionRequestStatus::parse(&status)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        if status != ProductionRequestStatus::Open {
            tx.rollback().await?;
            return Ok(Some(Err(status)));
        }

        let log_query = format!(
            "INSERT INTO production_logs (request_id, worker_id, quantity, notes)
             VALUES ($1, $2, $3, $4)
             RETURNING {LOG_COLUMNS}"
        );
        let log = sqlx::query_as::<_, ProductionLog>(&log_query)
            .bind(request_id)
            .bind(input.worker_id)
            .bind(input.quantity)
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await?;

        let new_completed = completed + input.quantity;
        let new_status = status_after_log(new_completed, requested);
        let update = format!(
            "UPDATE production_requests SET quantity_completed = $1, status = $2
             WHERE id = $3
             RETURNING {COLUMNS}"
        );
        let request = sqlx::query_as::<_, ProductionRequest>(&update)
            .bind(new_completed)
            .bind(new_status.as_str())
            .bind(request_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(Ok(LoggedProduction { request, log })))
    }

    pub async fn list_logs(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Vec<ProductionLog>, sqlx::Error> {
        let query = format!(
            "SELECT {LOG_COLUMNS} FROM production_logs
             WHERE request_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ProductionLog>(&query)
            .bind(request_id)
            .fetch_all(pool)
            .await
    }
}
