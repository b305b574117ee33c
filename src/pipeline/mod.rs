use async_trait::async_trait;
use tracing::info;

use crate::{error::PipelineError, storage::StorageService};

#[cfg(test)]
pub mod fakes;

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Latest state of a remote conversion task. `status` is `None` when the
/// upstream response did not carry one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStatus {
    pub status: Option<String>,
    pub model_url: Option<String>,
    pub progress: Option<u8>,
}

impl TaskStatus {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Prompt to image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, PipelineError>;
}

/// Image to 3D model, as an asynchronous remote task.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Returns the upload token referencing the stored image.
    async fn upload_image(&self, bytes: Vec<u8>, mime_type: &str) -> Result<String, PipelineError>;

    /// Returns the remote task id.
    async fn create_task(&self, file_token: &str, mime_type: &str) -> Result<String, PipelineError>;

    async fn task_status(&self, task_id: &str) -> Result<TaskStatus, PipelineError>;

    async fn download_model(&self, url: &str) -> Result<Vec<u8>, PipelineError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedTask {
    pub task_id: String,
}

/// Generate an image, store it, upload it, and open a conversion task.
///
/// The image is read back from disk before upload so the uploaded bytes are
/// exactly what `/room.png` serves.
pub async fn start_generation(
    images: &dyn ImageGenerator,
    models: &dyn ModelService,
    storage: &StorageService,
    prompt: &str,
) -> Result<StartedTask, PipelineError> {
    let image = images.generate_image(prompt).await?;
    let path = storage.write_image(&image.bytes).await?;
    info!(path = %path.display(), bytes = image.bytes.len(), "image saved");

    let stored = storage.read_image().await?;
    let token = models.upload_image(stored, &image.mime_type).await?;
    let task_id = models.create_task(&token, &image.mime_type).await?;

    Ok(StartedTask { task_id })
}

/// Poll a task once. On success with a model URL, download the model over
/// the fixed model file; any other state leaves the file alone.
pub async fn check_task(
    models: &dyn ModelService,
    storage: &StorageService,
    task_id: &str,
) -> Result<TaskStatus, PipelineError> {
    let status = models.task_status(task_id).await?;
    info!(
        task_id,
        status = status.status.as_deref().unwrap_or("unknown"),
        "task polled"
    );

    if status.is_success() {
        if let Some(url) = status.model_url.as_deref() {
            let bytes = models.download_model(url).await?;
            let path = storage.write_model(&bytes).await?;
            info!(path = %path.display(), bytes = bytes.len(), "model saved");
        }
    }

    Ok(status)
}
