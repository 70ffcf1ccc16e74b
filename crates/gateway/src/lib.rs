//! WebSocket gateway for DevSquad.
//!
//! Two endpoints, JSON-over-text frames:
//!
//! - `GET /ws/agent` — single-agent task execution
//!   (`execute_task` / `user_input` / `cancel`)
//! - `GET /ws/team`  — multi-persona conversation (`message` / `ping`)
//!
//! Server frames are [`RuntimeEvent`] objects tagged with a `type` field.
//! Every failure class reaches the client as an `error` event; runtime
//! errors additionally terminate the session. Each connection is one
//! async task — sessions are isolated and share nothing but the store.

pub mod ws;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tracing::info;

use devsquad_config::AppConfig;
use devsquad_runtime::{AgentExecutor, PersonaRegistry};
use devsquad_store::{InMemoryStore, ProjectStore, SqliteStore};

/// Shared gateway state.
pub struct GatewayState {
    pub executor: Arc<AgentExecutor>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the gateway router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws/agent", get(ws::agent_ws_handler))
        .route("/ws/team", get(ws::team_ws_handler))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Wire up the store, backend, tools, and personas from configuration.
pub async fn build_executor(config: AppConfig) -> Result<Arc<AgentExecutor>, devsquad_core::Error> {
    let store: Arc<dyn ProjectStore> = match config.store.backend.as_str() {
        "memory" => Arc::new(InMemoryStore::new()),
        _ => Arc::new(SqliteStore::new(&config.store.path).await?),
    };

    let backend = Arc::new(devsquad_llm::build_backend(&config.llm)?);
    let tools = Arc::new(devsquad_tools::default_registry(store.clone()));
    let personas = Arc::new(PersonaRegistry::defaults());

    Ok(Arc::new(AgentExecutor::new(
        store, backend, tools, personas, config,
    )))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let executor = build_executor(config).await?;
    let state = Arc::new(GatewayState { executor });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use devsquad_core::llm::{Generation, GenerationRequest, LlmBackend};
    use devsquad_core::LlmError;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct NullBackend;

    #[async_trait::async_trait]
    impl LlmBackend for NullBackend {
        fn name(&self) -> &str {
            "null"
        }
        async fn generate(&self, _r: GenerationRequest) -> Result<Generation, LlmError> {
            Ok(Generation {
                text: "ok".into(),
                usage: None,
                model: "null".into(),
            })
        }
    }

    fn test_state() -> SharedState {
        let store: Arc<dyn ProjectStore> = Arc::new(InMemoryStore::new());
        let executor = Arc::new(AgentExecutor::new(
            store.clone(),
            Arc::new(NullBackend),
            Arc::new(devsquad_tools::default_registry(store)),
            Arc::new(PersonaRegistry::defaults()),
            AppConfig::default(),
        ));
        Arc::new(GatewayState { executor })
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn ws_upgrade_required_on_agent_endpoint() {
        // A plain GET without the upgrade headers is rejected.
        let app = build_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ws/agent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn memory_store_config_builds_executor() {
        let mut config = AppConfig::default();
        config.store.backend = "memory".into();
        let executor = build_executor(config).await.unwrap();
        assert!(executor.store().agents().await.unwrap().is_empty());
    }
}
