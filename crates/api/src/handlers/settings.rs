//! Handlers for `/settings`, plus the cached headphone model lookup used by
//! order sync.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use shopfloor_core::classification::default_headphone_models;
use shopfloor_core::settings::{parse_headphone_models, validate_setting, HEADPHONE_MODELS_KEY};
use shopfloor_db::models::setting::PutSetting;
use shopfloor_db::repositories::SettingRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManager;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Model names
// ---------------------------------------------------------------------------

/// Headphone model names for the classifier.
///
/// Served from the cache while fresh. On a miss the `headphone_models`
/// setting is read and cached; if it is missing, unreadable or invalid the
/// built-in defaults are returned and nothing is cached, so the next call
/// retries the database.
pub async fn headphone_models(state: &AppState) -> Vec<String> {
    if let Some(models) = state.model_cache.read().await.get(Instant::now()) {
        return models.to_vec();
    }

    let loaded = match SettingRepo::get(&state.pool, HEADPHONE_MODELS_KEY).await {
        Ok(Some(setting)) => parse_headphone_models(&setting.value).map_err(|e| e.to_string()),
        Ok(None) => Err("setting is missing".to_string()),
        Err(e) => Err(e.to_string()),
    };

    match loaded {
        Ok(models) => {
            state
                .model_cache
                .write()
                .await
                .store(models.clone(), Instant::now());
            models
        }
        Err(reason) => {
            tracing::warn!(%reason, "Falling back to built-in headphone models");
            default_headphone_models()
        }
    }
}

// ---------------------------------------------------------------------------
// GET /settings/{key}
// ---------------------------------------------------------------------------

pub async fn get_setting(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<impl IntoResponse> {
    let setting = SettingRepo::get(&state.pool, &key)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok(Json(DataResponse { data: setting }))
}

// ---------------------------------------------------------------------------
// PUT /settings/{key}
// ---------------------------------------------------------------------------

/// Create or overwrite a setting. Writing `headphone_models` drops the
/// cached model list so the next sync sees the new names.
pub async fn put_setting(
    RequireManager(user): RequireManager,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(input): Json<PutSetting>,
) -> AppResult<impl IntoResponse> {
    validate_setting(&key, &input.value)?;
    let setting = SettingRepo::put(&state.pool, &key, &input.value).await?;

    if key == HEADPHONE_MODELS_KEY {
        state.model_cache.write().await.invalidate();
    }

    tracing::info!(key = %key, actor = %user.subject, "Setting saved");

    Ok(Json(DataResponse { data: setting }))
}
