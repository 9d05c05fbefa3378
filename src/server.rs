//! REST endpoints for classification and health.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::classify::{BatchClassifier, BatchOutcome, ClassifyRequest};
use crate::config::{ClassifierConfig, LlmSettings, ServerConfig};
use crate::error::{ApiError, ConfigError};
use crate::llm::{LlmBackend, LlmConfig, create_provider};

/// Application state shared across handlers.
///
/// Immutable; every request builds its own provider from the caller's key.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmSettings,
    pub classifier: ClassifierConfig,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            llm: config.llm.clone(),
            classifier: config.classifier.clone(),
        }
    }

    fn llm_config(&self, api_key: String) -> LlmConfig {
        LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: secrecy::SecretString::from(api_key),
            model: self.llm.model.clone(),
            base_url: self.llm.base_url.clone(),
            timeout: self.llm.timeout,
        }
    }
}

/// Build the API routes without middleware.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/classify", post(classify))
        .with_state(state)
}

/// Build the full application: routes plus tracing and CORS layers.
pub fn build_app(config: &ServerConfig) -> Result<Router, ConfigError> {
    let origin =
        HeaderValue::from_str(&config.frontend_url).map_err(|e| ConfigError::InvalidValue {
            key: "FRONTEND_URL".to_string(),
            message: e.to_string(),
        })?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Ok(api_routes(AppState::from_config(config)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    ))
}

/// Bind the configured address and serve until the process exits.
pub async fn serve(config: ServerConfig) -> crate::error::Result<()> {
    let app = build_app(&config)?;
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(
        addr = %config.bind_addr(),
        frontend = %config.frontend_url,
        model = %config.llm.model,
        "Mail classifier listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mail-classifier"
    }))
}

// ── Classification ──────────────────────────────────────────────────────

/// POST /api/classify
///
/// Body: `{ "emails": [...], "openaiKey": "..." }`. Responds with the batch
/// outcome, or `{ "error": ... }` with 400/401/429/500.
async fn classify(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BatchOutcome>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected classify body");
        ApiError::InvalidRequest(rejection.body_text())
    })?;

    let request = ClassifyRequest::from_json(&body).inspect_err(|e| {
        warn!(error = %e, "Invalid classify request");
    })?;

    let llm = create_provider(&state.llm_config(request.openai_key)).map_err(|e| {
        warn!(error = %e, "Could not create LLM provider");
        ApiError::from(e)
    })?;

    let classifier = BatchClassifier::new(llm, state.classifier.clone());
    Ok(Json(classifier.classify_batch(request.emails).await))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            frontend_url: "http://localhost:5173".to_string(),
            classifier: ClassifierConfig {
                inter_item_delay: Duration::ZERO,
                ..ClassifierConfig::default()
            },
            // Nothing listens here; validation tests never reach the provider.
            llm: LlmSettings {
                base_url: "http://127.0.0.1:9/v1".to_string(),
                timeout: Duration::from_secs(1),
                ..LlmSettings::default()
            },
            ..ServerConfig::default()
        }
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let app = build_app(&test_config()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/classify")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn empty_batch_is_bad_request() {
        let (status, json) = send(post_json(json!({"emails": [], "openaiKey": "sk"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("required"));
    }

    #[tokio::test]
    async fn missing_key_is_bad_request() {
        let (status, json) = send(post_json(json!({"emails": [{"id": "1"}]}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "OpenAI API key is required");
    }

    #[tokio::test]
    async fn oversized_batch_is_bad_request() {
        let emails: Vec<Value> = (0..51).map(|i| json!({"id": i.to_string()})).collect();
        let (status, json) = send(post_json(json!({"emails": emails, "openaiKey": "sk"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("Maximum 50"));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/classify")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, json) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn unsendable_key_is_unauthorized() {
        let (status, json) = send(post_json(
            json!({"emails": [{"id": "1"}], "openaiKey": "sk-\nbroken"}),
        ))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Invalid provider key");
    }

    #[tokio::test]
    async fn id_less_batch_never_calls_provider() {
        let (status, json) = send(post_json(
            json!({"emails": [{"subject": "no id"}], "openaiKey": "sk-test"}),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["classifications"].as_array().unwrap().is_empty());
        assert_eq!(json["errors"][0]["id"], "unknown");
        assert_eq!(json["errors"][0]["error"], "Email missing ID");
        assert_eq!(json["summary"]["total"], 1);
        assert_eq!(json["summary"]["failed"], 1);
    }

    #[tokio::test]
    async fn cors_allows_frontend_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/classify")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let app = build_app(&test_config()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:5173"
        );
        assert_eq!(response.headers()["access-control-allow-credentials"], "true");
    }

    #[test]
    fn invalid_frontend_url_is_config_error() {
        let config = ServerConfig {
            frontend_url: "http://bad\norigin".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            build_app(&config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
