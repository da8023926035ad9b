//! Handlers for automation rules and their execution log.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use shopfloor_core::automation::validate_rule;
use shopfloor_core::error::CoreError;
use shopfloor_core::pagination::{clamp_limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use shopfloor_core::types::DbId;
use shopfloor_db::models::automation::{
    AutomationRule, CreateAutomationRule, UpdateAutomationRule,
};
use shopfloor_db::repositories::automation_repo::RuleBody;
use shopfloor_db::repositories::AutomationRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManager;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

async fn ensure_rule_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<AutomationRule> {
    AutomationRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound {
            entity: "AutomationRule",
            id,
        }))
}

// ---------------------------------------------------------------------------
// GET /automation/rules
// ---------------------------------------------------------------------------

pub async fn list_rules(
    _user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let rules = AutomationRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: rules }))
}

// ---------------------------------------------------------------------------
// POST /automation/rules
// ---------------------------------------------------------------------------

pub async fn create_rule(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Json(input): Json<CreateAutomationRule>,
) -> AppResult<impl IntoResponse> {
    validate_rule(&input.name, &input.trigger, &input.actions)?;

    let rule = AutomationRepo::create(
        &state.pool,
        &RuleBody {
            name: input.name.trim(),
            description: input.description.as_deref(),
            trigger: &input.trigger,
            conditions: &input.conditions,
            actions: &input.actions,
            is_enabled: input.is_enabled,
        },
    )
    .await?;

    tracing::info!(rule_id = rule.id, name = %rule.name, actor = %user.subject, "Automation rule created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: rule })))
}

// ---------------------------------------------------------------------------
// GET /automation/rules/{id}
// ---------------------------------------------------------------------------

pub async fn get_rule(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let rule = ensure_rule_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: rule }))
}

// ---------------------------------------------------------------------------
// PUT /automation/rules/{id}
// ---------------------------------------------------------------------------

/// Update a rule. Omitted fields keep their stored values; the merged rule
/// is validated as a whole before it is saved.
pub async fn update_rule(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAutomationRule>,
) -> AppResult<impl IntoResponse> {
    let existing = ensure_rule_exists(&state.pool, id).await?;
    let parsed = existing.parse().map_err(|e| {
        AppError::InternalError(format!("Stored automation rule {id} is malformed: {e}"))
    })?;

    let name = input.name.unwrap_or(parsed.name);
    let description = input.description.or(existing.description);
    let trigger = input.trigger.unwrap_or(parsed.trigger);
    let conditions = input.conditions.unwrap_or(parsed.conditions);
    let actions = input.actions.unwrap_or(parsed.actions);
    let is_enabled = input.is_enabled.unwrap_or(existing.is_enabled);

    validate_rule(&name, &trigger, &actions)?;

    let rule = AutomationRepo::replace(
        &state.pool,
        id,
        &RuleBody {
            name: name.trim(),
            description: description.as_deref(),
            trigger: &trigger,
            conditions: &conditions,
            actions: &actions,
            is_enabled,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "AutomationRule",
        id,
    }))?;

    tracing::info!(rule_id = id, is_enabled, actor = %user.subject, "Automation rule updated");

    Ok(Json(DataResponse { data: rule }))
}

// ---------------------------------------------------------------------------
// DELETE /automation/rules/{id}
// ---------------------------------------------------------------------------

pub async fn delete_rule(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !AutomationRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "AutomationRule",
            id,
        }));
    }
    tracing::info!(rule_id = id, actor = %user.subject, "Automation rule deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /automation/rules/{id}/executions
// ---------------------------------------------------------------------------

pub async fn list_executions(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    ensure_rule_exists(&state.pool, id).await?;
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let executions = AutomationRepo::list_executions(&state.pool, id, limit).await?;
    Ok(Json(DataResponse { data: executions }))
}
