//! Pixel-art agent orchestration.
//!
//! Each operation is a linear pipeline: render prompt, call the text backend,
//! parse, stamp, and (for `generate`) try to attach an image. Text failures are
//! fatal to the request; image failures only downgrade `image_status`.

use crate::ai::{ImageGenerationService, ImageSpec, TextGenerationService};
use crate::image::TRANSPARENT_PIXEL_PNG;
use crate::models::{Config, GenerationRequest, GenerationResponse, ImageStatus};
use crate::{parser, prompts, Error, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Behavioural switches for [`PixelArtAgent`], taken from [`Config`].
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub max_iterations: usize,
    pub default_style: String,
    pub image_enabled: bool,
    pub image_placeholder: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AgentSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_iterations: config.max_iterations,
            default_style: config.default_style.clone(),
            image_enabled: config.image_enabled,
            image_placeholder: config.image_placeholder,
        }
    }
}

pub struct PixelArtAgent {
    text: Box<dyn TextGenerationService>,
    image: Box<dyn ImageGenerationService>,
    settings: AgentSettings,
}

impl PixelArtAgent {
    pub fn new(
        text: Box<dyn TextGenerationService>,
        image: Box<dyn ImageGenerationService>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            text,
            image,
            settings,
        }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn text_provider(&self) -> &dyn TextGenerationService {
        self.text.as_ref()
    }

    pub fn image_provider(&self) -> &dyn ImageGenerationService {
        self.image.as_ref()
    }

    /// Describe an asset and, when possible, render it.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        info!(
            "Generating pixel art for asset type: {}, style: {}",
            request.asset_type_or_default(),
            request.style_or_default()
        );

        let prompt = prompts::build_generation_prompt(request);
        let text = self.text.generate(&prompt).await?;
        debug!("Text backend response ({} chars)", text.len());

        let mut response = parser::parse_response(&text, request, &self.settings.default_style);
        response.generated_at = Utc::now();
        response.prompt = prompt;

        self.attach_image(&mut response, request).await;
        Ok(response)
    }

    /// Run [`generate`](Self::generate) up to `max_iterations` times.
    pub async fn generate_variations(
        &self,
        request: &GenerationRequest,
        count: usize,
    ) -> Result<Vec<GenerationResponse>> {
        let runs = count.min(self.settings.max_iterations);
        info!(
            "Generating {} variations (requested {}) for asset type: {}",
            runs,
            count,
            request.asset_type_or_default()
        );

        let mut variations = Vec::with_capacity(runs);
        for _ in 0..runs {
            variations.push(self.generate(request).await?);
        }
        Ok(variations)
    }

    /// Revise a description from user feedback. Never renders an image.
    pub async fn refine(
        &self,
        request: &GenerationRequest,
        feedback: &str,
    ) -> Result<GenerationResponse> {
        info!("Refining pixel art with feedback: {}", feedback);

        let prompt = prompts::build_refinement_prompt(request, feedback);
        let text = self.text.generate(&prompt).await?;

        let mut response = parser::parse_response(&text, request, &self.settings.default_style);
        response.generated_at = Utc::now();
        response.prompt = prompt;
        Ok(response)
    }

    async fn attach_image(&self, response: &mut GenerationResponse, request: &GenerationRequest) {
        if !self.settings.image_enabled {
            debug!("Image generation is disabled");
            response.image_status = Some(ImageStatus::TextOnly);
            return;
        }

        let image = match self.render_image(response, request).await {
            Ok(image) => image,
            Err(e) => {
                debug!("Image generation skipped: {}", e);
                None
            }
        };

        let image = image.or_else(|| {
            self.settings.image_placeholder.then(|| {
                warn!("No image from backend, attaching placeholder");
                TRANSPARENT_PIXEL_PNG.to_string()
            })
        });

        match image {
            Some(data) => {
                info!("Image generated successfully");
                response.image_data = Some(data);
                response.image_status = Some(ImageStatus::Generated);
            }
            None => {
                debug!("Image generation not available - text description only");
                response.image_status = Some(ImageStatus::TextOnly);
            }
        }
    }

    async fn render_image(
        &self,
        response: &GenerationResponse,
        request: &GenerationRequest,
    ) -> Result<Option<String>> {
        let (width, height) = parse_dimensions(request.size_or_default())?;

        let mut spec = ImageSpec::single(width, height);
        if request.spritesheet {
            let frames = u32::try_from(response.specifications.frame_count).unwrap_or(u32::MAX);
            spec = spec.with_spritesheet(frames);
        }

        let prompt = prompts::build_image_prompt(request);
        debug!(
            "Attempting to generate image with dimensions: {}x{}",
            width, height
        );

        let image = self.image.generate_image(&prompt, &spec).await?;
        Ok(image.filter(|data| !data.is_empty()))
    }
}

/// Largest accepted sprite side, in pixels.
pub const MAX_SPRITE_DIMENSION: u32 = 1024;

/// Parse a `"WxH"` size string. A missing height repeats the width.
pub fn parse_dimensions(size: &str) -> Result<(u32, u32)> {
    let invalid = || Error::InvalidSize(size.to_string());
    let mut parts = size.split('x');

    let width: u32 = parts
        .next()
        .map(str::trim)
        .ok_or_else(invalid)?
        .parse()
        .map_err(|_| invalid())?;

    let height = match parts.next().map(str::trim) {
        Some(h) if !h.is_empty() => h.parse().map_err(|_| invalid())?,
        _ => width,
    };

    if width == 0 || height == 0 {
        return Err(invalid());
    }
    if width > MAX_SPRITE_DIMENSION || height > MAX_SPRITE_DIMENSION {
        return Err(invalid());
    }
    Ok((width, height))
}
