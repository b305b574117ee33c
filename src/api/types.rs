use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct StartGlbRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGlbResponse {
    pub success: bool,
    pub task_id: String,
    pub image_path: &'static str,
}

/// `status` serialises as `null` when the upstream reported none.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTaskResponse {
    pub status: Option<String>,
    pub glb_url: Option<String>,
    pub glb_path: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}
