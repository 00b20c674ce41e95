//! Request/response payloads for the Ollama and Stable Diffusion HTTP APIs.

use serde::{Deserialize, Serialize};

/// Request body for Ollama `/api/chat`.
#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaMessage>,
    pub stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OllamaMessage {
    pub role: String,
    pub content: String,
}

/// Non-streaming response from Ollama `/api/chat`.
#[derive(Debug, Deserialize)]
pub struct OllamaChatResponse {
    pub message: Option<OllamaMessage>,
    #[serde(default)]
    pub done: bool,
}

/// Request body for AUTOMATIC1111 `/sdapi/v1/txt2img`.
#[derive(Debug, Serialize)]
pub struct Txt2ImgRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub cfg_scale: f32,
    pub sampler_name: String,
    pub seed: i64,
    pub denoising_strength: f32,
}

#[derive(Debug, Deserialize)]
pub struct Txt2ImgResponse {
    #[serde(default)]
    pub images: Vec<String>,
}
