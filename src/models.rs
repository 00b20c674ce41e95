//! Data models and structures
//!
//! Defines the request/response payloads exchanged with REST clients and the
//! immutable runtime configuration captured at startup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_ASSET_TYPE: &str = "sprite";
pub const DEFAULT_DESCRIPTION: &str = "a game character";
pub const DEFAULT_STYLE: &str = "16-bit pixel art";
pub const DEFAULT_COLOR_PALETTE: &str = "vibrant";
pub const DEFAULT_SIZE: &str = "32x32";
pub const DEFAULT_ADDITIONAL_CONTEXT: &str = "none";

/// Description of the asset a client wants designed.
///
/// Every field is optional; absent values fall back to the `DEFAULT_*`
/// constants when prompts are rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_palette: Option<String>,
    /// Sprite size as `"WxH"`, e.g. `"32x32"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
    /// Ask the image backend for a horizontal strip of animation frames.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub spritesheet: bool,
}

impl GenerationRequest {
    pub fn asset_type_or_default(&self) -> &str {
        self.asset_type.as_deref().unwrap_or(DEFAULT_ASSET_TYPE)
    }

    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION)
    }

    pub fn style_or_default(&self) -> &str {
        self.style.as_deref().unwrap_or(DEFAULT_STYLE)
    }

    pub fn color_palette_or_default(&self) -> &str {
        self.color_palette.as_deref().unwrap_or(DEFAULT_COLOR_PALETTE)
    }

    pub fn size_or_default(&self) -> &str {
        self.size.as_deref().unwrap_or(DEFAULT_SIZE)
    }

    pub fn additional_context_or_default(&self) -> &str {
        self.additional_context
            .as_deref()
            .unwrap_or(DEFAULT_ADDITIONAL_CONTEXT)
    }

    /// Request served by the example endpoint.
    pub fn example() -> Self {
        Self {
            asset_type: Some("character".to_string()),
            description: Some("A brave knight with a sword and shield".to_string()),
            style: Some("16-bit".to_string()),
            color_palette: Some("medieval".to_string()),
            size: Some("32x32".to_string()),
            additional_context: Some("Should have idle and attack animations".to_string()),
            spritesheet: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageStatus {
    Generated,
    TextOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteSpecification {
    pub size: String,
    pub asset_type: Option<String>,
    pub frame_count: usize,
    pub orientation: String,
    pub layers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// Raw text returned by the text backend.
    pub detailed_description: String,
    pub suggested_colors: Vec<String>,
    pub specifications: SpriteSpecification,
    pub animation_suggestions: Vec<String>,
    pub style: String,
    pub generated_at: DateTime<Utc>,
    /// Exact prompt sent to the text backend.
    pub prompt: String,
    /// Base64-encoded PNG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_status: Option<ImageStatus>,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub use_mock: bool,
    pub chat_mock: bool,
    pub image_mock: bool,
    pub mock_responses_file: Option<PathBuf>,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub image_api_url: String,
    pub lora_model: Option<String>,
    pub lora_strength: f64,
    pub image_enabled: bool,
    pub image_placeholder: bool,
    pub max_iterations: usize,
    pub default_style: String,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_mock: true,
            chat_mock: true,
            image_mock: true,
            mock_responses_file: None,
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2".to_string(),
            image_api_url: "http://localhost:7860".to_string(),
            lora_model: None,
            lora_strength: 0.8,
            image_enabled: true,
            image_placeholder: false,
            max_iterations: 3,
            default_style: "pixel-art".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        load_dotenv(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults
    /// for keys that are unset.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            use_mock: parse_flag(&var, "PIXELART_USE_MOCK", defaults.use_mock)?,
            chat_mock: parse_flag(&var, "PIXELART_CHAT_MOCK", defaults.chat_mock)?,
            image_mock: parse_flag(&var, "PIXELART_IMAGE_MOCK", defaults.image_mock)?,
            mock_responses_file: var("PIXELART_MOCK_RESPONSES_FILE").map(PathBuf::from),
            ollama_base_url: var("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            ollama_model: var("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            image_api_url: var("PIXELART_IMAGE_API_URL").unwrap_or(defaults.image_api_url),
            lora_model: var("PIXELART_IMAGE_LORA"),
            lora_strength: parse_number(
                &var,
                "PIXELART_IMAGE_LORA_STRENGTH",
                defaults.lora_strength,
            )?,
            image_enabled: parse_flag(&var, "PIXELART_IMAGE_ENABLED", defaults.image_enabled)?,
            image_placeholder: parse_flag(
                &var,
                "PIXELART_IMAGE_PLACEHOLDER",
                defaults.image_placeholder,
            )?,
            max_iterations: parse_number(&var, "PIXELART_MAX_ITERATIONS", defaults.max_iterations)?,
            default_style: var("PIXELART_DEFAULT_STYLE").unwrap_or(defaults.default_style),
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_number(&var, "PORT", defaults.port)?,
        })
    }

    /// Whether the text capability should be served by the mock provider.
    pub fn mock_chat(&self) -> bool {
        self.use_mock || self.chat_mock
    }

    /// Whether the image capability should be served by the mock provider.
    pub fn mock_image(&self) -> bool {
        self.use_mock || self.image_mock
    }
}

/// A missing `.env` file is fine; an unreadable or malformed one is not.
fn load_dotenv<T>(result: dotenvy::Result<T>) -> crate::Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn parse_flag<V>(var: &V, key: &str, default: bool) -> crate::Result<bool>
where
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(crate::Error::Config(format!(
                "{} must be a boolean, got '{}'",
                key, value
            ))),
        },
    }
}

fn parse_number<V, T>(var: &V, key: &str, default: T) -> crate::Result<T>
where
    V: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| {
            crate::Error::Config(format!("{} must be a number, got '{}'", key, value))
        }),
    }
}
