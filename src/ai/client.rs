use crate::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// JSON-over-HTTP client for self-hosted model servers.
pub struct LocalHttpClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    service: &'static str,
}

impl LocalHttpClient {
    pub fn new(service: &'static str, base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new_with_client(service, base_url, client))
    }

    pub fn new_with_client(service: &'static str, base_url: String, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        self.post_accepting(path, request, |status| status.is_success())
            .await
    }

    /// Like [`post`](Self::post), but only a `200 OK` counts as success.
    pub async fn post_ok<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        self.post_accepting(path, request, |status| status == StatusCode::OK)
            .await
    }

    async fn post_accepting<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
        accept: fn(StatusCode) -> bool,
    ) -> Result<Resp> {
        let response = self
            .client
            .post(self.url(path))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to {}: {}", self.service, e);
                e
            })?;

        if !accept(response.status()) {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("{} API error (status {}): {}", self.service, status, error_text);
            return Err(Error::AiProvider(format!(
                "{} API error (status {}): {}",
                self.service, status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", self.service, e);
            tracing::debug!("Unparsable {} body: {}", self.service, body);
            Error::AiProvider(format!("Failed to parse {} response: {}", self.service, e))
        })
    }

    /// `true` when a GET on `path` answers with a 2xx status.
    pub async fn probe(&self, path: &str) -> bool {
        match self.client.get(self.url(path)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("{} not available: {}", self.service, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: String) -> LocalHttpClient {
        LocalHttpClient::new("Test", base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_strips_trailing_slash() {
        let http = client("http://localhost:7860/".to_string());
        assert_eq!(http.url("/sdapi/v1/txt2img"), "http://localhost:7860/sdapi/v1/txt2img");
    }

    #[tokio::test]
    async fn test_post_sends_json_and_parses_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(body_json(serde_json::json!({ "ping": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "pong": 1
            })))
            .mount(&server)
            .await;

        let response: Value = client(server.uri())
            .post("/echo", &serde_json::json!({ "ping": true }))
            .await
            .unwrap();
        assert_eq!(response["pong"], 1);
    }

    #[tokio::test]
    async fn test_post_non_success_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fail"))
            .respond_with(ResponseTemplate::new(503).set_body_string("loading model"))
            .mount(&server)
            .await;

        let err = client(server.uri())
            .post::<_, Value>("/fail", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_post_ok_rejects_other_2xx() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/accepted"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "pong": 1
            })))
            .mount(&server)
            .await;

        let http = client(server.uri());
        let lenient: Value = http
            .post("/accepted", &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(lenient["pong"], 1);

        let err = http
            .post_ok::<_, Value>("/accepted", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("202"));
    }

    #[tokio::test]
    async fn test_post_malformed_body_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(server.uri())
            .post::<_, Value>("/garbage", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_probe() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/up"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let http = client(server.uri());
        assert!(http.probe("/up").await);
        assert!(!http.probe("/down").await);
    }
}
