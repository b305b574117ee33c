use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    error::{PipelineError, Stage},
    pipeline::{GeneratedImage, ImageGenerator},
};

const DEFAULT_MIME_TYPE: &str = "image/png";

/// Client for the Gemini `generateContent` endpoint, used with an
/// image-capable model.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, PipelineError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [
                    { "parts": [ { "text": prompt } ] }
                ]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Upstream {
                stage: Stage::ImageGeneration,
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let image = decode_inline_image(parsed)?;
        debug!(
            bytes = image.bytes.len(),
            mime_type = %image.mime_type,
            "image generated"
        );
        Ok(image)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

/// Picks the last inline part of the first candidate; text parts are ignored.
fn decode_inline_image(response: GenerateContentResponse) -> Result<GeneratedImage, PipelineError> {
    let inline = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().filter_map(|p| p.inline_data).last())
        .filter(|inline| !inline.data.trim().is_empty())
        .ok_or(PipelineError::Missing("image"))?;

    let bytes = STANDARD.decode(inline.data.trim())?;
    let mime_type = inline
        .mime_type
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

    Ok(GeneratedImage { bytes, mime_type })
}
