use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::{
    pipeline::{ImageGenerator, ModelService},
    storage::StorageService,
};

pub mod handlers;
pub mod types;

use handlers::{check_task, missing_task_id, start_glb};

#[derive(Clone)]
pub struct AppState {
    pub images: Arc<dyn ImageGenerator>,
    pub models: Arc<dyn ModelService>,
    pub storage: StorageService,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/start-glb", post(start_glb))
        .route("/api/check-task/{task_id}", get(check_task))
        // No id segment at all; the param route above never matches these.
        .route("/api/check-task", get(missing_task_id))
        .route("/api/check-task/", get(missing_task_id))
}

/// The JSON API plus the public directory, which serves `index.html` at `/`
/// and the generated `/room.png` and `/model.glb`.
pub fn app(state: AppState) -> Router {
    let public = ServeDir::new(state.storage.root());

    router()
        .fallback_service(public)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}
