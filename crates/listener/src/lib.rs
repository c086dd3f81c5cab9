//! Atelier HTTP surface.
//!
//! A small axum router in front of [`nodes::PipelineExecutor`]:
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | `GET` | `/health` | | `{"status":"ok"}` |
//! | `GET` | `/api/personas` | | `{"personas":[...]}` |
//! | `POST` | `/api/pipeline` | `{"topic":"..."}` | [`pipeline::PipelineResult`] |
//! | `POST` | `/api/agents/{persona}` | `{"input":"..."}` | [`pipeline::LogEntry`] |
//! | `POST` | `/api/studio` | `{"topic":"...","style":"..."}` | [`pipeline::StudioResult`] |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Routing, request decoding and status mapping live here.
//! Proposal, gallery and user CRUD belong to a separate service.

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use nodes::PipelineExecutor;
use pipeline::{AtelierError, LogEntry, PipelineResult, StudioResult};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Shared state accessible from handlers.
#[derive(Clone)]
pub struct AppState {
    executor: Arc<PipelineExecutor>,
}

/// Builds the router.
pub fn router(executor: Arc<PipelineExecutor>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/personas", get(personas_handler))
        .route("/api/pipeline", post(pipeline_handler))
        .route("/api/agents/{persona}", post(consult_handler))
        .route("/api/studio", post(studio_handler))
        .with_state(AppState { executor })
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    executor: Arc<PipelineExecutor>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, router(executor))
        .with_graceful_shutdown(shutdown)
        .await
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /api/pipeline`.
#[derive(Debug, Deserialize)]
pub struct PipelineRequest {
    /// Exhibition topic.
    pub topic: String,
}

/// Body of `POST /api/agents/{persona}`.
#[derive(Debug, Deserialize)]
pub struct ConsultRequest {
    /// Text handed to the persona.
    pub input: String,
}

/// Body of `POST /api/studio`.
#[derive(Debug, Deserialize)]
pub struct StudioRequest {
    /// What to paint.
    pub topic: String,
    /// Painting style, e.g. `인상주의`.
    pub style: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct PersonasResponse {
    personas: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error half of every handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<AtelierError> for ApiError {
    fn from(err: AtelierError) -> Self {
        let status = match &err {
            AtelierError::UnknownPersona { .. } => StatusCode::NOT_FOUND,
            AtelierError::StepFailed { .. } => StatusCode::BAD_GATEWAY,
            AtelierError::ConfigurationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl ApiError {
    fn blank(field: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("{field} must not be empty"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = self.status.as_u16(), error = %self.message, "request failed");
        }
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /health
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /api/personas
async fn personas_handler(State(state): State<AppState>) -> Json<PersonasResponse> {
    let personas = state
        .executor
        .catalog()
        .names()
        .map(ToString::to_string)
        .collect();
    Json(PersonasResponse { personas })
}

/// POST /api/pipeline
async fn pipeline_handler(
    State(state): State<AppState>,
    Json(req): Json<PipelineRequest>,
) -> Result<Json<PipelineResult>, ApiError> {
    if req.topic.trim().is_empty() {
        return Err(ApiError::blank("topic"));
    }
    Ok(Json(state.executor.run(&req.topic).await?))
}

/// POST /api/agents/{persona}
async fn consult_handler(
    State(state): State<AppState>,
    Path(persona): Path<String>,
    Json(req): Json<ConsultRequest>,
) -> Result<Json<LogEntry>, ApiError> {
    Ok(Json(state.executor.consult(&persona, &req.input).await?))
}

/// POST /api/studio
async fn studio_handler(
    State(state): State<AppState>,
    Json(req): Json<StudioRequest>,
) -> Result<Json<StudioResult>, ApiError> {
    if req.topic.trim().is_empty() {
        return Err(ApiError::blank("topic"));
    }
    if req.style.trim().is_empty() {
        return Err(ApiError::blank("style"));
    }
    Ok(Json(state.executor.studio(&req.topic, &req.style).await?))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use nodes::{ExecutorConfig, PersonaAgent};
    use pipeline::{
        CompletionError, ErrorPolicy, ImageRenderer, PersonaCatalog, RenderError,
        TextCompletionClient,
    };
    use tower::ServiceExt;

    use super::*;

    struct EchoClient {
        fail: bool,
    }

    #[async_trait]
    impl TextCompletionClient for EchoClient {
        async fn generate(&self, _role_text: &str, input_text: &str) -> Result<String, CompletionError> {
            if self.fail {
                return Err(CompletionError::Api {
                    status: 503,
                    message: "overloaded".into(),
                });
            }
            Ok(format!("echo: {input_text}"))
        }
    }

    struct NoImage;

    #[async_trait]
    impl ImageRenderer for NoImage {
        async fn render(&self, _prompt_text: &str) -> Result<PathBuf, RenderError> {
            Err(RenderError::Status { status: 500 })
        }
    }

    fn app_with(fail: bool, error_policy: ErrorPolicy) -> Router {
        let executor = PipelineExecutor::new(
            PersonaAgent::new(Arc::new(EchoClient { fail })),
            Arc::new(NoImage),
            Arc::new(PersonaCatalog::builtin()),
            ExecutorConfig {
                error_policy,
                ..ExecutorConfig::default()
            },
        );
        router(Arc::new(executor))
    }

    fn app() -> Router {
        app_with(false, ErrorPolicy::default())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn personas_endpoint_lists_catalog() {
        let req = Request::builder().uri("/api/personas").body(Body::empty()).unwrap();
        let resp = app().oneshot(req).await.unwrap();
        let json = body_json(resp).await;
        let names = json["personas"].as_array().unwrap();
        assert_eq!(names.len(), 10);
        assert!(names.contains(&serde_json::json!("Docent")));
    }

    #[tokio::test]
    async fn pipeline_endpoint_returns_full_result() {
        let resp = app()
            .oneshot(post_json("/api/pipeline", serde_json::json!({"topic": "사이버펑크 서울"})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["topic"], "사이버펑크 서울");
        assert_eq!(json["final_plan"], "echo: 사이버펑크 서울");
        assert!(json["image_path"].is_null());
        assert_eq!(json["logs"].as_array().unwrap().len(), 6);
        assert_eq!(json["logs"][0]["agent"], "Planner");
        assert_eq!(json["logs"][5]["agent"], "CommunityManager");
    }

    #[tokio::test]
    async fn pipeline_endpoint_keeps_topic_as_submitted() {
        let resp = app()
            .oneshot(post_json("/api/pipeline", serde_json::json!({"topic": "  고흐의 재림 "})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["topic"], "  고흐의 재림 ");
    }

    #[tokio::test]
    async fn pipeline_endpoint_rejects_blank_topic() {
        let resp = app()
            .oneshot(post_json("/api/pipeline", serde_json::json!({"topic": "   "})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "topic must not be empty");
    }

    #[tokio::test]
    async fn pipeline_endpoint_passes_errors_through_by_default() {
        let resp = app_with(true, ErrorPolicy::default())
            .oneshot(post_json("/api/pipeline", serde_json::json!({"topic": "고흐의 재림"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["final_plan"], "Error: provider returned 503: overloaded");
    }

    #[tokio::test]
    async fn halted_pipeline_maps_to_bad_gateway() {
        let resp = app_with(true, ErrorPolicy::Halt)
            .oneshot(post_json("/api/pipeline", serde_json::json!({"topic": "고흐의 재림"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().starts_with("Planner step failed"));
    }

    #[tokio::test]
    async fn consult_endpoint_returns_log_entry() {
        let resp = app()
            .oneshot(post_json("/api/agents/AgendaManager", serde_json::json!({"input": "긴 토론"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["agent"], "AgendaManager");
        assert_eq!(json["message"], "echo: 긴 토론");
    }

    #[tokio::test]
    async fn consult_endpoint_rejects_unknown_persona() {
        let resp = app()
            .oneshot(post_json("/api/agents/Sommelier", serde_json::json!({"input": "wine"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn studio_endpoint_returns_prompt_and_image_path() {
        let resp = app()
            .oneshot(post_json(
                "/api/studio",
                serde_json::json!({"topic": "밤의 항구", "style": "인상주의"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["final_prompt"], "echo: 밤의 항구");
        assert_eq!(json["style"], "인상주의");
        assert!(json["image_path"].is_null());
    }

    #[tokio::test]
    async fn studio_endpoint_rejects_blank_style() {
        let resp = app()
            .oneshot(post_json("/api/studio", serde_json::json!({"topic": "밤의 항구", "style": " "})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "style must not be empty");
    }

    #[tokio::test]
    async fn studio_prompt_failure_maps_to_bad_gateway() {
        let resp = app_with(true, ErrorPolicy::default())
            .oneshot(post_json(
                "/api/studio",
                serde_json::json!({"topic": "밤의 항구", "style": "수채화"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().starts_with("StyledPromptMaker step failed"));
    }
}
