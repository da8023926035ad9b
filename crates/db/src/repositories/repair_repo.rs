//! Repository for the `repairs` table.

use sqlx::PgPool;
use shopfloor_core::repair::{RepairStatus, DEFAULT_PRIORITY};
use shopfloor_core::types::DbId;

use crate::models::repair::{CreateRepair, Repair, UpdateRepair};

const COLUMNS: &str = "id, customer_name, customer_email, product_model, serial_number, \
    issue_description, status, priority, estimated_cost, notes, created_at, updated_at";

/// Provides CRUD operations for repair tickets.
pub struct RepairRepo;

impl RepairRepo {
    pub async fn create(pool: &PgPool, input: &CreateRepair) -> Result<Repair, sqlx::Error> {
        let query = format!(
            "INSERT INTO repairs
                (customer_name, customer_email, product_model, serial_number,
                 issue_description, priority, estimated_cost, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Repair>(&query)
            .bind(&input.customer_name)
            .bind(&input.customer_email)
            .bind(&input.product_model)
            .bind(&input.serial_number)
            .bind(&input.issue_description)
            .bind(input.priority.as_deref().unwrap_or(DEFAULT_PRIORITY))
            .bind(input.estimated_cost)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Repair>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM repairs WHERE id = $1");
        sqlx::query_as::<_, Repair>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List repairs newest first, optionally by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Repair>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM repairs
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Repair>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRepair,
    ) -> Result<Option<Repair>, sqlx::Error> {
        let query = format!(
            "UPDATE repairs SET
                customer_name = COALESCE($1, customer_name),
                customer_email = COALESCE($2, customer_email),
                product_model = COALESCE($3, product_model),
                serial_number = COALESCE($4, serial_number),
                issue_description = COALESCE($5, issue_description),
                priority = COALESCE($6, priority),
                estimated_cost = COALESCE($7, estimated_cost),
                notes = COALESCE($8, notes)
             WHERE id = $9
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Repair>(&query)
            .bind(&input.customer_name)
            .bind(&input.customer_email)
            .bind(&input.product_model)
            .bind(&input.serial_number)
            .bind(&input.issue_description)
            .bind(&input.priority)
            .bind(input.estimated_cost)
            .bind(&input.notes)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Move a repair from `from` to `to`. The `from` guard makes a concurrent
    /// change lose instead of skipping a step; returns `None` in that case.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        from: RepairStatus,
        to: RepairStatus,
    ) -> Result<Option<Repair>, sqlx::Error> {
        let query = format!(
            "UPDATE repairs SET status = $1
             WHERE id = $2 AND status = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Repair>(&query)
            .bind(to.as_str())
            .bind(id)
            .bind(from.as_str())
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM repairs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
