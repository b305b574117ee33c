use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::info;

use super::{
    types::{CheckTaskResponse, StartGlbRequest, StartGlbResponse},
    AppState,
};
use crate::{
    error::ApiError,
    pipeline,
    storage::{IMAGE_URL_PATH, MODEL_URL_PATH},
};

const PROMPT_REQUIRED: &str = "Prompt is required";
const TASK_ID_REQUIRED: &str = "taskId required";

pub async fn start_glb(
    State(state): State<AppState>,
    payload: Result<Json<StartGlbRequest>, JsonRejection>,
) -> Result<Json<StartGlbResponse>, ApiError> {
    let prompt = payload
        .ok()
        .and_then(|Json(req)| req.prompt)
        .filter(|p| !p.trim().is_empty())
        .ok_or(ApiError::BadRequest(PROMPT_REQUIRED))?;

    info!(prompt_len = prompt.len(), "starting glb generation");

    let started = pipeline::start_generation(
        state.images.as_ref(),
        state.models.as_ref(),
        &state.storage,
        &prompt,
    )
    .await
    .map_err(ApiError::pipeline("Failed to start GLB generation"))?;

    Ok(Json(StartGlbResponse {
        success: true,
        task_id: started.task_id,
        image_path: IMAGE_URL_PATH,
    }))
}

pub async fn check_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<CheckTaskResponse>, ApiError> {
    let task_id = task_id.trim();
    if task_id.is_empty() {
        return Err(ApiError::BadRequest(TASK_ID_REQUIRED));
    }

    let status = pipeline::check_task(state.models.as_ref(), &state.storage, task_id)
        .await
        .map_err(ApiError::pipeline("Failed to check task"))?;

    Ok(Json(CheckTaskResponse {
        status: status.status,
        glb_url: status.model_url,
        glb_path: MODEL_URL_PATH,
        progress: status.progress,
    }))
}

pub async fn missing_task_id() -> ApiError {
    ApiError::BadRequest(TASK_ID_REQUIRED)
}
