//! Repository for the `workers` table.

use sqlx::PgPool;
use shopfloor_core::roles::ROLE_WORKER;
use shopfloor_core::types::DbId;

use crate::models::worker::{CreateWorker, UpdateWorker, Worker, WorkerLoadRow};

const COLUMNS: &str = "id, name, email, role, skills, is_active, created_at, updated_at";

/// Provides CRUD operations for workers.
pub struct WorkerRepo;

impl WorkerRepo {
    pub async fn create(pool: &PgPool, input: &CreateWorker) -> Result<Worker, sqlx::Error> {
        let query = format!(
            "INSERT INTO workers (name, email, role, skills)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Worker>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(input.role.as_deref().unwrap_or(ROLE_WORKER))
            .bind(&input.skills)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Worker>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workers WHERE id = $1");
        sqlx::query_as::<_, Worker>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List workers ordered by name; inactive workers only when asked.
    pub async fn list(pool: &PgPool, include_inactive: bool) -> Result<Vec<Worker>, sqlx::Error> {
        let query = if include_inactive {
            format!("SELECT {COLUMNS} FROM workers ORDER BY name, id")
        } else {
            format!("SELECT {COLUMNS} FROM workers WHERE is_active ORDER BY name, id")
        };
        sqlx::query_as::<_, Worker>(&query).fetch_all(pool).await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateWorker,
    ) -> Result<Option<Worker>, sqlx::Error> {
        let query = format!(
            "UPDATE workers SET
                name = COALESCE($1, name),
                email = COALESCE($2, email),
                role = COALESCE($3, role),
                skills = COALESCE($4, skills),
                is_active = COALESCE($5, is_active)
             WHERE id = $6
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Worker>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.role)
            .bind(&input.skills)
            .bind(input.is_active)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Mark a worker inactive. Returns `true` if a row was updated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE workers SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Snapshot every active worker with their count of open tasks.
    pub async fn load_snapshot(pool: &PgPool) -> Result<Vec<WorkerLoadRow>, sqlx::Error> {
        sqlx::query_as::<_, WorkerLoadRow>(
            "SELECT w.id, w.skills, w.is_active,
                    COUNT(t.id) FILTER (WHERE t.status IN ('pending', 'assigned', 'in_progress'))
                        AS open_tasks
             FROM workers w
             LEFT JOIN work_tasks t ON t.worker_id = w.id
             WHERE w.is_active
             GROUP BY w.id
             ORDER BY w.id",
        )
        .fetch_all(pool)
        .await
    }
}
