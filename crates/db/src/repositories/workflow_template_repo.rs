//! Repository for the `workflow_templates` table.

use sqlx::PgPool;
use shopfloor_core::types::DbId;
use shopfloor_core::workflow::{Stage, StageTransition};

use crate::models::workflow_template::WorkflowTemplate;

/// Column list for workflow_templates queries.
const COLUMNS: &str = "id, name, description, stages, stage_transitions, \
    is_active, is_default, created_at, updated_at";

/// Stage and transition arrays ready to be written together.
pub struct TemplateBody<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub stages: &'a [Stage],
    pub stage_transitions: &'a [StageTransition],
    pub is_active: bool,
    pub is_default: bool,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Provides CRUD operations for workflow templates.
pub struct WorkflowTemplateRepo;

impl WorkflowTemplateRepo {
    /// Insert a new template, returning the created row.
    ///
    /// When `is_default` is set the previous default is cleared in the same
    /// transaction.
    pub async fn create(
        pool: &PgPool,
        body: &TemplateBody<'_>,
    ) -> Result<WorkflowTemplate, sqlx::Error> {
        let stages = to_json(&body.stages)?;
        let transitions = to_json(&body.stage_transitions)?;

        let mut tx = pool.begin().await?;
        if body.is_default {
            sqlx::query("UPDATE workflow_templates SET is_default = FALSE WHERE is_default")
                .execute(&mut *tx)
                .await?;
        }
        let query = format!(
            "INSERT INTO workflow_templates
                (name, description, stages, stage_transitions, is_active, is_default)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let template = sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(body.name)
            .bind(body.description)
            .bind(&stages)
            .bind(&transitions)
            .bind(body.is_active)
            .bind(body.is_default)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(template)
    }

    /// Find a template by its primary key.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<WorkflowTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workflow_templates WHERE id = $1");
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the template marked as default, if any.
    pub async fn find_default(pool: &PgPool) -> Result<Option<WorkflowTemplate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_templates WHERE is_default AND is_active LIMIT 1"
        );
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .fetch_optional(pool)
            .await
    }

    /// List templates ordered by name. Inactive templates are hidden unless
    /// `include_inactive` is set.
    pub async fn list(
        pool: &PgPool,
        include_inactive: bool,
    ) -> Result<Vec<WorkflowTemplate>, sqlx::Error> {
        let query = if include_inactive {
            format!("SELECT {COLUMNS} FROM workflow_templates ORDER BY name")
        } else {
            format!("SELECT {COLUMNS} FROM workflow_templates WHERE is_active ORDER BY name")
        };
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .fetch_all(pool)
            .await
    }

    /// Replace every field of a template, returning the updated row.
    pub async fn replace(
        pool: &PgPool,
        id: DbId,
        body: &TemplateBody<'_>,
    ) -> Result<Option<WorkflowTemplate>, sqlx::Error> {
        let stages = to_json(&body.stages)?;
        let transitions = to_json(&body.stage_transitions)?;

        let mut tx = pool.begin().await?;
        if body.is_default {
            sqlx::query(
                "UPDATE workflow_templates SET is_default = FALSE WHERE is_default AND id <> $1",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
        let query = format!(
            "UPDATE workflow_templates SET
                name = $1,
                description = $2,
                stages = $3,
                stage_transitions = $4,
                is_active = $5,
                is_default = $6
             WHERE id = $7
             RETURNING {COLUMNS}"
        );
        let template = sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(body.name)
            .bind(body.description)
            .bind(&stages)
            .bind(&transitions)
            .bind(body.is_active)
            .bind(body.is_default)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(template)
    }

    /// Make `id` the only default template. Returns the updated row.
    pub async fn set_default(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<WorkflowTemplate>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("UPDATE workflow_templates SET is_default = FALSE WHERE is_default AND id <> $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let query = format!(
            "UPDATE workflow_templates SET is_default = TRUE WHERE id = $1 RETURNING {COLUMNS}"
        );
        let template = sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(template)
    }

    /// Delete a template by its ID. Returns `true` if a row was deleted.
    ///
    /// Batches that used it keep their stage but lose the template reference.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workflow_templates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
