//! Startup wiring: choose provider variants from configuration once and hand
//! them to the agent.

use crate::ai::{
    ImageGenerationService, MockImageClient, MockTextClient, OllamaChatClient,
    StableDiffusionClient, TextGenerationService,
};
use crate::models::Config;
use crate::prompts::Lora;
use crate::service::{AgentSettings, PixelArtAgent};
use crate::Result;
use tracing::{info, warn};

/// Injectable provider bundle used to construct the agent in tests/harnesses.
pub struct AppServices {
    pub text: Box<dyn TextGenerationService>,
    pub image: Box<dyn ImageGenerationService>,
}

impl AppServices {
    /// Select the mock or real variant of each capability.
    pub fn from_config(config: &Config) -> Result<Self> {
        let text: Box<dyn TextGenerationService> = if config.mock_chat() {
            info!("Using MOCK text provider for AI responses");
            match &config.mock_responses_file {
                Some(path) => {
                    info!("Loading mock responses from {}", path.display());
                    Box::new(MockTextClient::from_file(path)?)
                }
                None => Box::new(MockTextClient::new()),
            }
        } else {
            info!(
                "Using REAL Ollama text provider (model: {}, url: {})",
                config.ollama_model, config.ollama_base_url
            );
            Box::new(OllamaChatClient::new(
                config.ollama_base_url.clone(),
                config.ollama_model.clone(),
            )?)
        };

        let image: Box<dyn ImageGenerationService> = if config.mock_image() {
            info!("Using MOCK image provider for image generation");
            Box::new(MockImageClient::new())
        } else {
            info!(
                "Using REAL Stable Diffusion image provider (url: {})",
                config.image_api_url
            );
            let lora = config.lora_model.clone().map(|model| Lora {
                model,
                strength: config.lora_strength,
            });
            Box::new(StableDiffusionClient::new(config.image_api_url.clone())?.with_lora(lora))
        };

        Ok(Self { text, image })
    }
}

/// Build the agent described by `config`.
pub fn build_agent(config: &Config) -> Result<PixelArtAgent> {
    let services = AppServices::from_config(config)?;
    Ok(with_services(services, AgentSettings::from(config)))
}

pub fn with_services(services: AppServices, settings: AgentSettings) -> PixelArtAgent {
    PixelArtAgent::new(services.text, services.image, settings)
}

/// Log whether each configured backend answers.
pub async fn check_providers(agent: &PixelArtAgent) {
    let text = agent.text_provider();
    if text.is_available().await {
        info!("Text provider '{}' is available", text.name());
    } else {
        warn!(
            "Text provider '{}' is not reachable; generation requests will fail",
            text.name()
        );
    }

    let image = agent.image_provider();
    if image.is_available().await {
        info!("Image provider '{}' is available", image.name());
    } else {
        warn!(
            "Image provider '{}' is not reachable; responses will be text-only",
            image.name()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_config_defaults_to_mocks() {
        let services = AppServices::from_config(&Config::default()).unwrap();
        assert_eq!(services.text.name(), "mock-text");
        assert_eq!(services.image.name(), "mock-image");
    }

    #[test]
    fn test_from_config_selects_real_providers() {
        let config = Config {
            use_mock: false,
            chat_mock: false,
            image_mock: false,
            lora_model: Some("pixel".to_string()),
            ..Config::default()
        };
        let services = AppServices::from_config(&config).unwrap();
        assert_eq!(services.text.name(), "ollama");
        assert_eq!(services.image.name(), "stable-diffusion");
    }

    #[test]
    fn test_global_mock_flag_overrides_capability_flags() {
        let config = Config {
            use_mock: true,
            chat_mock: false,
            image_mock: false,
            ..Config::default()
        };
        let services = AppServices::from_config(&config).unwrap();
        assert_eq!(services.text.name(), "mock-text");
        assert_eq!(services.image.name(), "mock-image");
    }

    #[tokio::test]
    async fn test_build_agent_with_mock_responses_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r##"["A slime #00FF00 that can jump"]"##).unwrap();

        let config = Config {
            mock_responses_file: Some(file.path().to_path_buf()),
            max_iterations: 1,
            ..Config::default()
        };
        let agent = build_agent(&config).unwrap();
        assert_eq!(agent.settings().max_iterations, 1);

        let response = agent.generate(&Default::default()).await.unwrap();
        assert_eq!(response.suggested_colors, vec!["#00FF00"]);
        assert_eq!(response.animation_suggestions, vec!["jump"]);
    }

    #[test]
    fn test_build_agent_missing_mock_file_fails() {
        let config = Config {
            mock_responses_file: Some("/nonexistent/mock.json".into()),
            ..Config::default()
        };
        assert!(build_agent(&config).is_err());
    }
}
