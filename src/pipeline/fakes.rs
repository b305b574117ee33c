//! In-memory collaborators that record every call.

use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;

use super::{GeneratedImage, ImageGenerator, ModelService, TaskStatus};
use crate::error::{PipelineError, Stage};

pub struct FakeImages {
    result: Mutex<Option<Result<GeneratedImage, PipelineError>>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeImages {
    pub fn returning(bytes: &[u8], mime_type: &str) -> Self {
        Self::with(Ok(GeneratedImage {
            bytes: bytes.to_vec(),
            mime_type: mime_type.to_string(),
        }))
    }

    pub fn failing(err: PipelineError) -> Self {
        Self::with(Err(err))
    }

    fn with(result: Result<GeneratedImage, PipelineError>) -> Self {
        Self {
            result: Mutex::new(Some(result)),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, PipelineError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Err(PipelineError::Missing("image")))
    }
}

#[derive(Default)]
pub struct FakeModels {
    fail_at: Option<Stage>,
    status: TaskStatus,
    uploaded: Mutex<Vec<Vec<u8>>>,
    created: Mutex<Vec<(String, String)>>,
    polled: Mutex<Vec<String>>,
    downloads: Mutex<Vec<String>>,
}

impl FakeModels {
    pub const MODEL_BYTES: &'static [u8] = b"glTF-binary";

    pub fn with_status(status: TaskStatus) -> Self {
        Self::default().reporting(status)
    }

    pub fn reporting(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Makes `stage` answer with a non-OK upstream response.
    pub fn failing_at(stage: Stage) -> Self {
        Self {
            fail_at: Some(stage),
            ..Self::default()
        }
    }

    fn fail_if(&self, stage: Stage) -> Result<(), PipelineError> {
        if self.fail_at == Some(stage) {
            return Err(PipelineError::Upstream {
                stage,
                body: "upstream said no".into(),
            });
        }
        Ok(())
    }

    pub fn uploaded(&self) -> Vec<Vec<u8>> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<(String, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn polled(&self) -> Vec<String> {
        self.polled.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelService for FakeModels {
    async fn upload_image(&self, bytes: Vec<u8>, _mime_type: &str) -> Result<String, PipelineError> {
        self.fail_if(Stage::Upload)?;
        let mut uploaded = self.uploaded.lock().unwrap();
        uploaded.push(bytes);
        Ok(format!("token-{}", uploaded.len()))
    }

    async fn create_task(&self, file_token: &str, mime_type: &str) -> Result<String, PipelineError> {
        self.fail_if(Stage::TaskCreation)?;
        let mut created = self.created.lock().unwrap();
        created.push((file_token.to_string(), mime_type.to_string()));
        Ok(format!("task-{}", created.len()))
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatus, PipelineError> {
        self.polled.lock().unwrap().push(task_id.to_string());
        self.fail_if(Stage::TaskStatus)?;
        Ok(self.status.clone())
    }

    async fn download_model(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        self.downloads.lock().unwrap().push(url.to_string());
        self.fail_if(Stage::ModelDownload)?;
        Ok(Self::MODEL_BYTES.to_vec())
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL, for
/// pointing the real HTTP clients at a scripted upstream.
pub async fn serve_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service()).await.unwrap();
    });
    format!("http://{addr}")
}
