use super::client::LocalHttpClient;
use super::types::{OllamaChatRequest, OllamaChatResponse, OllamaMessage};
use super::TextGenerationService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Text generation through a local Ollama server.
pub struct OllamaChatClient {
    http: LocalHttpClient,
    model: String,
}

impl OllamaChatClient {
    pub fn new(base_url: String, model: String) -> Result<Self> {
        Ok(Self {
            http: LocalHttpClient::new("Ollama", base_url, Duration::from_secs(120))?,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerationService for OllamaChatClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            "Calling Ollama model {} with prompt ({} chars)",
            self.model,
            prompt.len()
        );

        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
        };

        let response: OllamaChatResponse = self.http.post("/api/chat", &request).await?;

        let content = response
            .message
            .map(|message| message.content)
            .ok_or_else(|| Error::AiProvider("No response from Ollama chat API".to_string()))?;

        tracing::debug!("Ollama response received ({} chars)", content.len());
        Ok(content)
    }

    async fn is_available(&self) -> bool {
        self.http.probe("/api/tags").await
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_parses_chat_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3.2",
                "stream": false,
                "messages": [{ "role": "user", "content": "describe a slime" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3.2",
                "message": { "role": "assistant", "content": "A green slime #22AA44" },
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaChatClient::new(server.uri(), "llama3.2".to_string()).unwrap();
        let text = client.generate("describe a slime").await.unwrap();
        assert_eq!(text, "A green slime #22AA44");
    }

    #[tokio::test]
    async fn test_generate_api_error_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not found"))
            .mount(&server)
            .await;

        let client = OllamaChatClient::new(server.uri(), "missing".to_string()).unwrap();
        let err = client.generate("anything").await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_generate_missing_message_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3.2",
                "done": true
            })))
            .mount(&server)
            .await;

        let client = OllamaChatClient::new(server.uri(), "llama3.2".to_string()).unwrap();
        assert!(client.generate("anything").await.is_err());
    }

    #[tokio::test]
    async fn test_generate_blank_content_is_returned() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3.2",
                "message": { "role": "assistant", "content": "  " },
                "done": true
            })))
            .mount(&server)
            .await;

        let client = OllamaChatClient::new(server.uri(), "llama3.2".to_string()).unwrap();
        assert_eq!(client.generate("anything").await.unwrap(), "  ");
    }

    #[tokio::test]
    async fn test_is_available_checks_tags_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": []
            })))
            .mount(&server)
            .await;

        let client = OllamaChatClient::new(server.uri(), "llama3.2".to_string()).unwrap();
        assert!(client.is_available().await);
        assert_eq!(client.name(), "ollama");
    }
}
