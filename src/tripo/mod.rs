use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{multipart, Response, Url};
use tracing::{debug, info};

use crate::{
    error::{PipelineError, Stage},
    pipeline::{ModelService, TaskStatus},
};

pub mod types;

use types::{
    file_type_for, upload_file_name, CreateTaskRequest, Envelope, TaskCreated, TaskDetail,
    UploadResponse,
};

/// Tripo 3D OpenAPI client: image upload, image-to-model tasks, and
/// fetching finished models.
#[derive(Clone)]
pub struct TripoClient {
    client: reqwest::Client,
    api_key: String,
    base_url: Url,
}

impl TripoClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid Tripo base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("Tripo base URL cannot carry a path: {base_url}");
        }

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url,
        })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

async fn ensure_ok(response: Response, stage: Stage) -> Result<Response, PipelineError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PipelineError::Upstream { stage, body })
}

#[async_trait]
impl ModelService for TripoClient {
    async fn upload_image(&self, bytes: Vec<u8>, mime_type: &str) -> Result<String, PipelineError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(upload_file_name(mime_type))
            .mime_str(mime_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint(&["upload", "sts"]))
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .multipart(form)
            .send()
            .await?;
        let response = ensure_ok(response, Stage::Upload).await?;

        let parsed: UploadResponse = response.json().await?;
        let token = parsed.into_token().ok_or(PipelineError::Missing("fileToken"))?;
        debug!("image uploaded");
        Ok(token)
    }

    async fn create_task(&self, file_token: &str, mime_type: &str) -> Result<String, PipelineError> {
        let body = CreateTaskRequest::image_to_model(file_token, file_type_for(mime_type));

        let response = self
            .client
            .post(self.endpoint(&["task"]))
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .json(&body)
            .send()
            .await?;
        let response = ensure_ok(response, Stage::TaskCreation).await?;

        let parsed: Envelope<TaskCreated> = response.json().await?;
        let task_id = parsed
            .data
            .and_then(|d| d.task_id)
            .filter(|id| !id.is_empty())
            .ok_or(PipelineError::Missing("taskId"))?;

        info!(%task_id, "tripo task created");
        Ok(task_id)
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatus, PipelineError> {
        let response = self
            .client
            .get(self.endpoint(&["task", task_id]))
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .send()
            .await?;
        let response = ensure_ok(response, Stage::TaskStatus).await?;

        let parsed: Envelope<TaskDetail> = response.json().await?;
        Ok(parsed.into())
    }

    async fn download_model(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        let response = self.client.get(url).send().await?;
        let response = ensure_ok(response, Stage::ModelDownload).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
