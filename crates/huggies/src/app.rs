//! HTTP application: MCP transports, widget assets, and health.

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use huggiesconf::HuggiesConfig;
use skybridge::{Implementation, McpState, SessionManager, WidgetResolver};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::knowledge::KnowledgeBase;
use crate::{tools, widgets};

pub const SERVER_NAME: &str = "huggies";

const INSTRUCTIONS: &str = "Huggies helper tools. Search FAQs, recommend diaper sizes, \
                            find nearby retailers, list offers, and suggest baby names. \
                            Each result renders as an inline widget.";

/// Shared state behind the non-MCP routes.
#[derive(Clone)]
pub struct AppState {
    pub mcp: Arc<McpState>,
    pub start_time: Instant,
}

impl AppState {
    pub fn sessions(&self) -> &Arc<SessionManager> {
        self.mcp.sessions()
    }

    pub fn widgets(&self) -> &Arc<WidgetResolver> {
        self.mcp.widgets()
    }
}

/// Wire tables, tools, widgets, and sessions together.
pub fn build_state(config: &HuggiesConfig, kb: KnowledgeBase) -> Result<AppState> {
    let registry = tools::registry(Arc::new(kb)).context("Failed to register tools")?;

    let resolver = widgets::resolver(&config.widgets.assets_dir, config.widgets.base_url_trimmed());
    for (id, e) in resolver.preload() {
        tracing::warn!(widget = %id, error = %e, "Widget not available at startup");
    }

    let mcp = McpState::with_sessions(
        Arc::new(registry),
        Arc::new(resolver),
        SessionManager::new_shared(),
        Implementation::new(SERVER_NAME, env!("CARGO_PKG_VERSION")).with_title("Huggies"),
    )
    .with_instructions(INSTRUCTIONS);

    Ok(AppState {
        mcp: Arc::new(mcp),
        start_time: Instant::now(),
    })
}

/// Health check endpoint
pub async fn handle_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let uptime = state.start_time.elapsed();

    Json(serde_json::json!({
        "status": "healthy",
        "uptime_secs": uptime.as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions().stats(),
        "tools": state.mcp.registry().len(),
        "widgets": state.widgets().stats(),
    }))
}

/// Widget fetch by filename: `<id>.html` or a bundle file.
///
/// A cache miss reads disk under the resolver's entry lock, so the fetch runs
/// on the blocking pool rather than a runtime worker.
pub async fn handle_asset(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    let widgets = Arc::clone(state.widgets());
    let name = filename.clone();
    let fetched = match tokio::task::spawn_blocking(move || widgets.fetch(&name)).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::error!(filename = %filename, error = %e, "Asset fetch task failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match fetched {
        Ok(asset) => (
            [(header::CONTENT_TYPE, asset.content_type)],
            asset.content.clone(),
        )
            .into_response(),
        Err(e) => {
            tracing::debug!(filename = %filename, error = %e, "Asset not found");
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
    }
}

/// The full router: MCP transports plus assets and health, with CORS open
/// to browser-hosted clients.
pub fn router(state: AppState) -> Router {
    let mcp_router = skybridge::router(Arc::clone(&state.mcp));

    let app_router = Router::new()
        .route("/health", get(handle_health))
        .route("/assets/{filename}", get(handle_asset))
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .merge(mcp_router)
        .merge(app_router)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
