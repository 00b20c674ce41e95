//! Heuristic extraction of structured fields from free-form model output.

use crate::models::{GenerationRequest, GenerationResponse, SpriteSpecification};
use chrono::Utc;

pub const DEFAULT_COLORS: [&str; 6] = [
    "#2C3E50", "#E74C3C", "#ECF0F1", "#3498DB", "#F39C12", "#27AE60",
];

pub const SPRITE_LAYERS: [&str; 4] = ["background", "base", "details", "highlights"];

pub const ORIENTATION: &str = "front-facing";

/// Canonical animation name followed by the keywords that indicate it.
const ANIMATION_KEYWORDS: [(&str, &[&str]); 6] = [
    ("idle", &["idle"]),
    ("walk", &["walk", "walking"]),
    ("run", &["run", "running"]),
    ("jump", &["jump", "jumping"]),
    ("attack", &["attack", "attacking"]),
    ("death", &["death", "dying"]),
];

fn is_hex_color(token: &str) -> bool {
    match token.as_bytes() {
        [b'#', digits @ ..] => digits.len() == 6 && digits.iter().all(u8::is_ascii_hexdigit),
        _ => false,
    }
}

/// Whitespace-delimited `#RRGGBB` tokens in order of appearance, or
/// [`DEFAULT_COLORS`] when there are none.
pub fn extract_colors(text: &str) -> Vec<String> {
    let colors: Vec<String> = text
        .split_whitespace()
        .filter(|token| is_hex_color(token))
        .map(str::to_string)
        .collect();

    if colors.is_empty() {
        DEFAULT_COLORS.iter().map(|c| c.to_string()).collect()
    } else {
        colors
    }
}

/// Canonical animation names mentioned anywhere in the text, each at most once.
pub fn extract_animations(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();

    ANIMATION_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(name, _)| name.to_string())
        .collect()
}

pub fn build_specification(
    request: &GenerationRequest,
    animations: &[String],
) -> SpriteSpecification {
    SpriteSpecification {
        size: request.size_or_default().to_string(),
        asset_type: request.asset_type.clone(),
        frame_count: animations.len().max(1),
        orientation: ORIENTATION.to_string(),
        layers: SPRITE_LAYERS.iter().map(|l| l.to_string()).collect(),
    }
}

/// Turn raw model output into a response.
///
/// The returned value carries an empty `prompt` and no image; callers stamp
/// those afterwards.
pub fn parse_response(
    text: &str,
    request: &GenerationRequest,
    default_style: &str,
) -> GenerationResponse {
    let suggested_colors = extract_colors(text);
    let animation_suggestions = extract_animations(text);
    let specifications = build_specification(request, &animation_suggestions);

    GenerationResponse {
        detailed_description: text.to_string(),
        suggested_colors,
        specifications,
        animation_suggestions,
        style: request
            .style
            .clone()
            .unwrap_or_else(|| default_style.to_string()),
        generated_at: Utc::now(),
        prompt: String::new(),
        image_data: None,
        image_status: None,
    }
}
