use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Outbound call that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ImageGeneration,
    Upload,
    TaskCreation,
    TaskStatus,
    ModelDownload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ImageGeneration => "Image generation",
            Stage::Upload => "Upload",
            Stage::TaskCreation => "Task creation",
            Stage::TaskStatus => "Task status",
            Stage::ModelDownload => "Model download",
        })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} failed: {body}")]
    Upstream { stage: Stage, body: String },

    #[error("No {0} returned")]
    Missing(&'static str),

    #[error("invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether the message is meant for the caller, as opposed to
    /// transport or local failures that are only logged.
    fn is_client_visible(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Missing(_))
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{context}: {source}")]
    Pipeline {
        context: &'static str,
        #[source]
        source: PipelineError,
    },
}

impl ApiError {
    pub fn pipeline(context: &'static str) -> impl FnOnce(PipelineError) -> Self {
        move |source| Self::Pipeline { context, source }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Pipeline { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(msg) => (*msg).to_string(),
            Self::Pipeline { source, .. } if source.is_client_visible() => source.to_string(),
            Self::Pipeline { context, .. } => (*context).to_string(),
        }
    }
}

/// Joins an error and all of its causes with `": "`. A cause whose message
/// the chain already ends with is skipped, so `#[error("..: {0}")]` wrappers
/// are not printed twice.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = err.to_string();
    let mut cause = err.source();
    while let Some(err) = cause {
        let msg = err.to_string();
        if !chain.ends_with(&msg) {
            chain.push_str(": ");
            chain.push_str(&msg);
        }
        cause = err.source();
    }
    chain
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %error_chain(&self), "request failed");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
