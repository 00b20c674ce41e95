//! AI backend integration for descriptions and sprite images
//!
//! Each capability is a trait with a real client (Ollama for text, a Stable
//! Diffusion AUTOMATIC1111 server for images) and a mock that rotates through
//! canned data for local development.

pub mod client;
pub mod mock;
pub mod ollama;
pub mod stable_diffusion;
pub mod types;

pub use client::LocalHttpClient;
pub use mock::{MockImageClient, MockTextClient};
pub use ollama::OllamaChatClient;
pub use stable_diffusion::StableDiffusionClient;

use crate::Result;
use async_trait::async_trait;

/// Prompt in, free-form text out.
#[async_trait]
pub trait TextGenerationService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
    async fn is_available(&self) -> bool;
    fn name(&self) -> &'static str;
}

/// Dimensions and layout of a requested sprite image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSpec {
    pub width: u32,
    pub height: u32,
    pub spritesheet: bool,
    pub frame_count: u32,
}

impl ImageSpec {
    pub fn single(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            spritesheet: false,
            frame_count: 1,
        }
    }

    pub fn with_spritesheet(mut self, frame_count: u32) -> Self {
        self.spritesheet = true;
        self.frame_count = frame_count;
        self
    }

    /// Width of the full image; spritesheets lay frames out horizontally.
    pub fn output_width(&self) -> u32 {
        if self.spritesheet && self.frame_count > 1 {
            self.width.saturating_mul(self.frame_count)
        } else {
            self.width
        }
    }
}

/// Prompt in, base64-encoded PNG out.
///
/// `Ok(None)` means the backend answered but produced no image.
#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn generate_image(&self, prompt: &str, spec: &ImageSpec) -> Result<Option<String>>;
    async fn is_available(&self) -> bool;
    fn name(&self) -> &'static str;
}
