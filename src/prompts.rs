//! Prompt templates for the text and image backends.

use crate::models::GenerationRequest;

pub const GENERATION: &str = include_str!("../data/prompts/generation.txt");
pub const REFINEMENT: &str = include_str!("../data/prompts/refinement.txt");
pub const SD_STYLE_PREFIX: &str = include_str!("../data/prompts/sd_style_prefix.txt");
pub const SD_SPRITESHEET: &str = include_str!("../data/prompts/sd_spritesheet.txt");
pub const SD_STYLE_SUFFIX: &str = include_str!("../data/prompts/sd_style_suffix.txt");
pub const SD_NEGATIVE: &str = include_str!("../data/prompts/sd_negative.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// Substitution is a single pass over the template, so placeholder-looking
/// text inside a value is inserted verbatim. Unknown placeholders are kept.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match vars.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => result.push_str(value),
                    None => {
                        result.push_str("{{");
                        result.push_str(key);
                        result.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Prompt asking the text backend for a full asset description.
pub fn build_generation_prompt(request: &GenerationRequest) -> String {
    render(
        GENERATION,
        &[
            ("assetType", request.asset_type_or_default()),
            ("description", request.description_or_default()),
            ("style", request.style_or_default()),
            ("colorPalette", request.color_palette_or_default()),
            ("size", request.size_or_default()),
            ("additionalContext", request.additional_context_or_default()),
        ],
    )
}

/// Prompt asking the text backend to revise a description given user feedback.
pub fn build_refinement_prompt(request: &GenerationRequest, feedback: &str) -> String {
    render(
        REFINEMENT,
        &[
            ("assetType", request.asset_type_or_default()),
            ("description", request.description_or_default()),
            ("style", request.style_or_default()),
            ("feedback", feedback),
        ],
    )
}

/// Compact prompt handed to the image backend.
pub fn build_image_prompt(request: &GenerationRequest) -> String {
    format!(
        "{} {}, {} style",
        request.asset_type_or_default(),
        request.description_or_default(),
        request.style_or_default()
    )
}

/// LoRA overlay token accepted by AUTOMATIC1111-style backends.
#[derive(Debug, Clone, PartialEq)]
pub struct Lora {
    pub model: String,
    pub strength: f64,
}

impl Lora {
    pub fn trigger(&self) -> String {
        format!("<lora:{}:{:.1}> ", self.model, self.strength)
    }
}

/// Wrap an image prompt with the pixel-art reinforcement tokens used for
/// Stable Diffusion.
pub fn enhance_for_pixel_art(
    prompt: &str,
    lora: Option<&Lora>,
    spritesheet: bool,
    frame_count: u32,
) -> String {
    let mut enhanced = String::new();

    if let Some(lora) = lora {
        enhanced.push_str(&lora.trigger());
    }

    enhanced.push_str(SD_STYLE_PREFIX);

    if spritesheet && frame_count > 1 {
        enhanced.push_str(&render(
            SD_SPRITESHEET,
            &[("frames", &frame_count.to_string())],
        ));
    }

    enhanced.push_str(prompt);
    enhanced.push_str(SD_STYLE_SUFFIX);
    enhanced
}
