//! Repository for the `automation_rules` and `automation_executions` tables.

use sqlx::PgPool;
use shopfloor_core::automation::{Action, Condition, Trigger};
use shopfloor_core::types::DbId;

use crate::models::automation::{AutomationExecution, AutomationRule};

const COLUMNS: &str = "id, name, description, trigger, conditions, actions, is_enabled, \
    created_at, updated_at";

const EXECUTION_COLUMNS: &str = "id, rule_id, event_type, batch_id, succeeded, error, created_at";

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Fully-specified rule contents for inserts and updates.
pub struct RuleBody<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub trigger: &'a Trigger,
    pub conditions: &'a [Condition],
    pub actions: &'a [Action],
    pub is_enabled: bool,
}

/// Provides CRUD for automation rules and the execution log.
pub struct AutomationRepo;

impl AutomationRepo {
    pub async fn create(pool: &PgPool, body: &RuleBody<'_>) -> Result<AutomationRule, sqlx::Error> {
        let query = format!(
            "INSERT INTO automation_rules
                (name, description, trigger, conditions, actions, is_enabled)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AutomationRule>(&query)
            .bind(body.name)
            .bind(body.description)
            .bind(to_json(body.trigger)?)
            .bind(to_json(body.conditions)?)
            .bind(to_json(body.actions)?)
            .bind(body.is_enabled)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AutomationRule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM automation_rules WHERE id = $1");
        sqlx::query_as::<_, AutomationRule>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<AutomationRule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM automation_rules ORDER BY name");
        sqlx::query_as::<_, AutomationRule>(&query)
            .fetch_all(pool)
            .await
    }

    /// Enabled rules in id order, the order the runner evaluates them in.
    pub async fn list_enabled(pool: &PgPool) -> Result<Vec<AutomationRule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM automation_rules WHERE is_enabled ORDER BY id");
        sqlx::query_as::<_, AutomationRule>(&query)
            .fetch_all(pool)
            .await
    }

    /// Replace a rule's contents, returning the updated row.
    pub async fn replace(
        pool: &PgPool,
        id: DbId,
        body: &RuleBody<'_>,
    ) -> Result<Option<AutomationRule>, sqlx::Error> {
        let query = format!(
            "UPDATE automation_rules SET
                name = $1,
                description = $2,
                trigger = $3,
                conditions = $4,
                actions = $5,
                is_enabled = $6
             WHERE id = $7
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AutomationRule>(&query)
            .bind(body.name)
            .bind(body.description)
            .bind(to_json(body.trigger)?)
            .bind(to_json(body.conditions)?)
            .bind(to_json(body.actions)?)
            .bind(body.is_enabled)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM automation_rules WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Executions
    // -----------------------------------------------------------------------

    pub async fn record_execution(
        pool: &PgPool,
        rule_id: DbId,
        event_type: &str,
        batch_id: Option<DbId>,
        error: Option<&str>,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO automation_executions (rule_id, event_type, batch_id, succeeded, error)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(rule_id)
        .bind(event_type)
        .bind(batch_id)
        .bind(error.is_none())
        .bind(error)
        .fetch_one(pool)
        .await
    }

    /// Executions of a rule, newest first.
    pub async fn list_executions(
        pool: &PgPool,
        rule_id: DbId,
        limit: i64,
    ) -> Result<Vec<AutomationExecution>, sqlx::Error> {
        let query = format!(
            "SELECT {EXECUTION_COLUMNS} FROM automation_executions
             WHERE rule_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, AutomationExecution>(&query)
            .bind(rule_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
