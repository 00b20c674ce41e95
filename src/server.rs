//! REST surface for the pixel-art agent.

use crate::image::decode_base64;
use crate::models::{GenerationRequest, GenerationResponse};
use crate::service::PixelArtAgent;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<PixelArtAgent>,
}

impl AppState {
    pub fn new(agent: PixelArtAgent) -> Self {
        Self {
            agent: Arc::new(agent),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/pixelart/generate", post(generate))
        .route("/api/pixelart/generate/variations", post(generate_variations))
        .route("/api/pixelart/refine", post(refine))
        .route("/api/pixelart/health", get(health))
        .route("/api/pixelart/example", get(example))
        .route(
            "/api/pixelart/image/:response_id",
            get(download_image).post(download_posted_image),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Failure surfaced to REST clients.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(context: &str, err: crate::Error) -> Self {
        tracing::error!("{}: {}", context, err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{}: {}", context, err),
        }
    }

    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    tracing::info!(
        "Received request to generate pixel art: {}",
        request.asset_type_or_default()
    );
    state
        .agent
        .generate(&request)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Error generating pixel art", e))
}

fn default_count() -> usize {
    3
}

#[derive(Debug, Deserialize)]
pub struct VariationsQuery {
    #[serde(default = "default_count")]
    pub count: usize,
}

pub async fn generate_variations(
    State(state): State<AppState>,
    Query(query): Query<VariationsQuery>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<Vec<GenerationResponse>>, ApiError> {
    tracing::info!("Received request to generate {} variations", query.count);
    state
        .agent
        .generate_variations(&request, query.count)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Error generating variations", e))
}

#[derive(Debug, Deserialize)]
pub struct RefineQuery {
    pub feedback: String,
}

pub async fn refine(
    State(state): State<AppState>,
    Query(query): Query<RefineQuery>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    tracing::info!("Received request to refine pixel art with feedback");
    state
        .agent
        .refine(&request, &query.feedback)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Error refining pixel art", e))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "service": "Pixel Art Agent",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn example() -> Json<GenerationRequest> {
    Json(GenerationRequest::example())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub image_data: String,
}

pub async fn download_image(
    Path(response_id): Path<String>,
    Query(payload): Query<ImagePayload>,
) -> Result<Response, ApiError> {
    // Unescaped '+' in base64 arrives as a space after query decoding.
    png_attachment(&response_id, &payload.image_data.replace(' ', "+"))
}

pub async fn download_posted_image(
    Path(response_id): Path<String>,
    Json(payload): Json<ImagePayload>,
) -> Result<Response, ApiError> {
    png_attachment(&response_id, &payload.image_data)
}

fn png_attachment(response_id: &str, image_data: &str) -> Result<Response, ApiError> {
    let bytes = decode_base64(image_data).map_err(|e| {
        tracing::error!("Error downloading image: {}", e);
        ApiError::bad_request(format!("Invalid image data: {}", e))
    })?;

    let filename: String = response_id
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"pixel-art-{}.png\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockImageClient, MockTextClient};
    use crate::service::AgentSettings;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router(text: MockTextClient) -> Router {
        router(AppState::new(PixelArtAgent::new(
            Box::new(text),
            Box::new(MockImageClient::new()),
            AgentSettings::default(),
        )))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router(MockTextClient::new())
            .oneshot(Request::get("/api/pixelart/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "UP");
        assert_eq!(json["service"], "Pixel Art Agent");
    }

    #[tokio::test]
    async fn test_generate_failure_is_500() {
        let response = test_router(MockTextClient::new().with_failure(true))
            .oneshot(
                Request::post("/api/pixelart/generate")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("Error generating pixel art"));
    }

    #[tokio::test]
    async fn test_refine_requires_feedback() {
        let response = test_router(MockTextClient::new())
            .oneshot(
                Request::post("/api/pixelart/refine")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_png_attachment_sanitizes_filename() {
        let response = png_attachment("../etc\"id", crate::image::TRANSPARENT_PIXEL_PNG).unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"pixel-art-etcid.png\""
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    }

    #[test]
    fn test_png_attachment_rejects_bad_base64() {
        assert!(png_attachment("abc", "%%%").is_err());
    }
}
