use super::client::LocalHttpClient;
use super::types::{Txt2ImgRequest, Txt2ImgResponse};
use super::{ImageGenerationService, ImageSpec};
use crate::image::downscale_base64_png;
use crate::prompts::{self, Lora};
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Diffusion output is rendered at this multiple of the sprite size and then
/// sampled back down.
pub const UPSCALE_FACTOR: u32 = 8;

const STEPS: u32 = 50;
const CFG_SCALE: f32 = 15.0;
const SAMPLER: &str = "Euler a";
const DENOISING_STRENGTH: f32 = 0.4;

/// Image generation through an AUTOMATIC1111-compatible Stable Diffusion server.
pub struct StableDiffusionClient {
    http: LocalHttpClient,
    lora: Option<Lora>,
}

impl StableDiffusionClient {
    pub fn new(base_url: String) -> Result<Self> {
        Ok(Self {
            http: LocalHttpClient::new("Stable Diffusion", base_url, Duration::from_secs(300))?,
            lora: None,
        })
    }

    pub fn with_lora(mut self, lora: Option<Lora>) -> Self {
        self.lora = lora;
        self
    }

    pub fn build_request(&self, prompt: &str, spec: &ImageSpec) -> Txt2ImgRequest {
        let width = spec.output_width();
        Txt2ImgRequest {
            prompt: prompts::enhance_for_pixel_art(
                prompt,
                self.lora.as_ref(),
                spec.spritesheet,
                spec.frame_count,
            ),
            negative_prompt: prompts::SD_NEGATIVE.to_string(),
            steps: STEPS,
            width: width.saturating_mul(UPSCALE_FACTOR),
            height: spec.height.saturating_mul(UPSCALE_FACTOR),
            cfg_scale: CFG_SCALE,
            sampler_name: SAMPLER.to_string(),
            seed: -1,
            denoising_strength: DENOISING_STRENGTH,
        }
    }

    async fn txt2img(&self, prompt: &str, spec: &ImageSpec) -> Result<Option<String>> {
        let request = self.build_request(prompt, spec);
        let response: Txt2ImgResponse = self.http.post_ok("/sdapi/v1/txt2img", &request).await?;

        let Some(image) = response.images.into_iter().next() else {
            tracing::warn!("Stable Diffusion response missing 'images' or empty array");
            return Ok(None);
        };

        let width = spec.output_width();
        match downscale_base64_png(image.clone(), width, spec.height).await {
            Ok(scaled) => Ok(Some(scaled)),
            Err(e) => {
                tracing::warn!("Could not downscale generated image, returning as-is: {}", e);
                Ok(Some(image))
            }
        }
    }
}

#[async_trait]
impl ImageGenerationService for StableDiffusionClient {
    async fn generate_image(&self, prompt: &str, spec: &ImageSpec) -> Result<Option<String>> {
        if spec.spritesheet && spec.frame_count > 1 {
            tracing::info!(
                "Generating spritesheet with {} frames ({}x{})",
                spec.frame_count,
                spec.output_width(),
                spec.height
            );
        } else {
            tracing::info!("Generating single sprite image ({}x{})", spec.width, spec.height);
        }

        match self.txt2img(prompt, spec).await {
            Ok(Some(image)) => {
                tracing::info!(
                    "Generated image with Stable Diffusion ({} base64 chars)",
                    image.len()
                );
                Ok(Some(image))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::warn!("Stable Diffusion at {} failed: {}", self.http.base_url, e);
                Ok(None)
            }
        }
    }

    async fn is_available(&self) -> bool {
        self.http.probe("/sdapi/v1/options").await
    }

    fn name(&self) -> &'static str {
        "stable-diffusion"
    }
}
