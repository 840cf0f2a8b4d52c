//! HTTP surface: `POST /api/compile` and `GET /health`.

use crate::config::GatewayConfig;
use crate::core::service::CompileService;
use crate::core::translator::{ResponseTranslator, TranslatedResponse};
use crate::domain::model::{CompilationFailure, CompilationOutcome, RawCompileRequest};
use crate::domain::ports::Compiler;
use crate::utils::error::GatewayError;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState<C: Compiler> {
    service: Arc<CompileService<C>>,
    started_at: Instant,
}

impl<C: Compiler> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            started_at: self.started_at,
        }
    }
}

impl IntoResponse for TranslatedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime: f64,
    pub timestamp: String,
}

/// Handler: GET /health
async fn handle_health<C: Compiler + 'static>(
    State(state): State<AppState<C>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime: state.started_at.elapsed().as_secs_f64(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Handler: POST /api/compile
async fn handle_compile<C: Compiler + 'static>(
    State(state): State<AppState<C>>,
    payload: Result<Json<RawCompileRequest>, JsonRejection>,
) -> TranslatedResponse {
    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            tracing::info!("Unreadable compile request body: {}", rejection.body_text());
            let err = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                GatewayError::payload_too_large("Request body is too large")
            } else {
                GatewayError::invalid_input(rejection.body_text())
            };
            let outcome = CompilationOutcome::Failure(CompilationFailure::from(err));
            return state.service.translator().translate(outcome);
        }
    };

    state.service.handle(raw).await
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(cors::Any);

    if origins.is_empty() {
        return layer.allow_origin(cors::Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

fn panic_response(
    translator: ResponseTranslator,
) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone {
    move |err: Box<dyn Any + Send + 'static>| {
        let detail = if let Some(message) = err.downcast_ref::<String>() {
            message.clone()
        } else if let Some(message) = err.downcast_ref::<&str>() {
            message.to_string()
        } else {
            "handler panicked".to_string()
        };

        tracing::error!("Request handler panicked: {}", detail);
        translator.internal_fault(&detail).into_response()
    }
}

pub fn router<C: Compiler + 'static>(service: CompileService<C>, config: &GatewayConfig) -> Router {
    let translator = *service.translator();
    let state = AppState {
        service: Arc::new(service),
        started_at: Instant::now(),
    };

    Router::new()
        .route("/health", get(handle_health::<C>))
        .route("/api/compile", post(handle_compile::<C>))
        .layer(DefaultBodyLimit::max(config.limits.max_request_body_bytes))
        .layer(CatchPanicLayer::custom(panic_response(translator)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server.cors_origins))
        .with_state(state)
}

/// Resolves on SIGINT or SIGTERM; axum then stops accepting and drains in-flight requests.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
