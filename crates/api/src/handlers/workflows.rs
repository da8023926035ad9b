//! Handlers for the `/workflows` resource.
//!
//! Templates are saved wholesale: every create and replace validates the
//! full stage list and regenerates the transition chain from it. Any
//! transitions sent by the client are discarded.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use shopfloor_core::error::CoreError;
use shopfloor_core::types::DbId;
use shopfloor_core::workflow::{generate_transitions, validate_stages};
use shopfloor_db::models::workflow_template::{SaveWorkflowTemplate, WorkflowTemplate};
use shopfloor_db::repositories::workflow_template_repo::TemplateBody;
use shopfloor_db::repositories::WorkflowTemplateRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManager;
use crate::query::IncludeInactiveParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a template or return 404.
pub(crate) async fn ensure_template_exists(
    pool: &sqlx::PgPool,
    id: DbId,
) -> AppResult<WorkflowTemplate> {
    WorkflowTemplateRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "WorkflowTemplate",
                id,
            })
        })
}

const INACTIVE_DEFAULT: &str = "An inactive template cannot be the default";

fn validate_save(input: &SaveWorkflowTemplate) -> AppResult<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Template name is required".to_string(),
        )));
    }
    validate_stages(&input.stages)?;
    if input.is_default && !input.is_active {
        return Err(AppError::Core(CoreError::Conflict(INACTIVE_DEFAULT.to_string())));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GET /workflows
// ---------------------------------------------------------------------------

pub async fn list_templates(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    let templates = WorkflowTemplateRepo::list(&state.pool, params.include_inactive).await?;
    Ok(Json(DataResponse { data: templates }))
}

// ---------------------------------------------------------------------------
// POST /workflows
// ---------------------------------------------------------------------------

pub async fn create_template(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Json(input): Json<SaveWorkflowTemplate>,
) -> AppResult<impl IntoResponse> {
    validate_save(&input)?;
    let transitions = generate_transitions(&input.stages);

    let template = WorkflowTemplateRepo::create(
        &state.pool,
        &TemplateBody {
            name: input.name.trim(),
            description: input.description.as_deref(),
            stages: &input.stages,
            stage_transitions: &transitions,
            is_active: input.is_active,
            is_default: input.is_default,
        },
    )
    .await?;

    tracing::info!(
        template_id = template.id,
        stages = input.stages.len(),
        actor = %user.subject,
        "Workflow template created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: template })))
}

// ---------------------------------------------------------------------------
// GET /workflows/{id}
// ---------------------------------------------------------------------------

pub async fn get_template(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let template = ensure_template_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: template }))
}

// ---------------------------------------------------------------------------
// PUT /workflows/{id}
// ---------------------------------------------------------------------------

/// Replace the template's name, stages and flags. Transitions are
/// regenerated from the new stage list.
pub async fn replace_template(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SaveWorkflowTemplate>,
) -> AppResult<impl IntoResponse> {
    validate_save(&input)?;
    let transitions = generate_transitions(&input.stages);

    let template = WorkflowTemplateRepo::replace(
        &state.pool,
        id,
        &TemplateBody {
            name: input.name.trim(),
            description: input.description.as_deref(),
            stages: &input.stages,
            stage_transitions: &transitions,
            is_active: input.is_active,
            is_default: input.is_default,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "WorkflowTemplate",
        id,
    }))?;

    tracing::info!(template_id = id, actor = %user.subject, "Workflow template replaced");

    Ok(Json(DataResponse { data: template }))
}

// ---------------------------------------------------------------------------
// DELETE /workflows/{id}
// ---------------------------------------------------------------------------

/// Batches referencing the template keep their rows; their
/// `workflow_template_id` is cleared.
pub async fn delete_template(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !WorkflowTemplateRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "WorkflowTemplate",
            id,
        }));
    }
    tracing::info!(template_id = id, actor = %user.subject, "Workflow template deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// POST /workflows/{id}/default
// ---------------------------------------------------------------------------

pub async fn set_default_template(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let template = ensure_template_exists(&state.pool, id).await?;
    if !template.is_active {
        return Err(AppError::Core(CoreError::Conflict(INACTIVE_DEFAULT.to_string())));
    }

    let template = WorkflowTemplateRepo::set_default(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "WorkflowTemplate",
            id,
        }))?;

    tracing::info!(template_id = id, actor = %user.subject, "Default workflow template set");

    Ok(Json(DataResponse { data: template }))
}
