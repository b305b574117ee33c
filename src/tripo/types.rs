use serde::{Deserialize, Serialize};

use crate::pipeline::TaskStatus;

/// Every Tripo response wraps its payload in `{ "code": .., "data": { .. } }`.
/// A missing `data` key deserialises as `None`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub data: Option<UploadData>,
    #[serde(default)]
    pub image_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadData {
    #[serde(default)]
    pub image_token: Option<String>,
}

impl UploadResponse {
    pub fn into_token(self) -> Option<String> {
        self.data
            .and_then(|d| d.image_token)
            .or(self.image_token)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTaskRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub file: TaskFile<'a>,
}

#[derive(Debug, Serialize)]
pub struct TaskFile<'a> {
    #[serde(rename = "type")]
    pub file_type: &'a str,
    pub file_token: &'a str,
}

impl<'a> CreateTaskRequest<'a> {
    pub fn image_to_model(file_token: &'a str, file_type: &'a str) -> Self {
        Self {
            kind: "image_to_model",
            file: TaskFile {
                file_type,
                file_token,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskCreated {
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskDetail {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub output: Option<TaskOutput>,
}

#[derive(Debug, Deserialize)]
pub struct TaskOutput {
    #[serde(default)]
    pub pbr_model: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl From<Envelope<TaskDetail>> for TaskStatus {
    fn from(envelope: Envelope<TaskDetail>) -> Self {
        let Some(detail) = envelope.data else {
            return TaskStatus::default();
        };

        let model_url = detail
            .output
            .and_then(|out| out.pbr_model.or(out.model))
            .filter(|url| !url.is_empty());

        TaskStatus {
            status: detail.status,
            model_url,
            progress: detail.progress.map(|p| p.clamp(0.0, 100.0).round() as u8),
        }
    }
}

/// Tripo names file types by extension; anything unrecognised is sent as `jpg`.
pub fn file_type_for(mime_type: &str) -> &'static str {
    match mime_type.trim().to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Multipart file name for the uploaded image, with an extension matching
/// the file type sent on task creation.
pub fn upload_file_name(mime_type: &str) -> String {
    format!("room.{}", file_type_for(mime_type))
}
