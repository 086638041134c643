//! Admin HTTP server
//!
//! Routes:
//! - `{rest_prefix}/schemas...` JSON channel, bearer token required
//! - `/admin-ajax` form channel, bearer token and per-action nonce required
//! - `/render` public head fragment for a URL

mod ajax;
mod error;
mod links;
mod rest;

pub use error::*;
pub use links::*;
pub use rest::AJAX_NONCE_ACTION;

use crate::admin::{Authorizer, SchemaService};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::meta::MetaDb;
use crate::render::HeadRenderer;
use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    response::Html,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: SchemaService,
    pub renderer: HeadRenderer,
    pub authorizer: Arc<Authorizer>,
    /// Absolute URL of the schemas collection, for Link headers
    pub collection_url: String,
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl AppState {
    pub fn new(db: MetaDb, config: &Config) -> Self {
        let collection_url = format!(
            "{}{}/schemas",
            config.api.public_url.trim_end_matches('/'),
            config.api.rest_prefix.trim_end_matches('/')
        );

        Self {
            service: SchemaService::new(db, config),
            renderer: HeadRenderer::new(config),
            authorizer: Arc::new(Authorizer::new(&config.admin)),
            collection_url,
            default_per_page: config.api.default_per_page,
            max_per_page: config.api.max_per_page,
        }
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<String> {
        let user = self.authorizer.authorize(bearer_token(headers))?;
        Ok(user.name.clone())
    }
}

/// Token from an `Authorization: Bearer ...` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Build the full router
pub fn router(state: AppState, rest_prefix: &str) -> Router {
    let rest = Router::new()
        .route("/schemas", get(rest::list_schemas).post(rest::create_schema))
        .route("/schemas/bulk-apply", post(rest::bulk_apply))
        .route(
            "/schemas/{id}",
            get(rest::get_schema)
                .put(rest::update_schema)
                .delete(rest::delete_schema),
        )
        .route("/schemas/{id}/toggle", post(rest::toggle_schema))
        .route("/nonce", get(rest::create_nonce));

    let prefix = rest_prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        Router::new().merge(rest)
    } else {
        Router::new().nest(prefix, rest)
    };

    app.route("/admin-ajax", post(ajax::dispatch))
        .route("/render", get(render_head))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RenderQuery {
    url: String,
    #[serde(default)]
    item: Option<i64>,
}

/// `GET /render?url=..&item=..`
async fn render_head(
    State(state): State<AppState>,
    Query(query): Query<RenderQuery>,
) -> std::result::Result<Html<String>, ApiError> {
    let request = crate::resolve::RenderRequest::new(query.url, query.item);
    let html = state
        .renderer
        .render_head(state.service.db(), &request)
        .await?;
    Ok(Html(html))
}

/// Listen on `api.bind` until interrupted
pub async fn serve(config: &Config, db: MetaDb) -> Result<()> {
    let state = AppState::new(db, config);
    let app = router(state, &config.api.rest_prefix);

    let listener = tokio::net::TcpListener::bind(&config.api.bind).await?;
    info!(
        "Listening on http://{} (REST under {})",
        listener.local_addr()?,
        config.api.rest_prefix
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .map_err(|e| Error::Other(format!("Server error: {}", e)))?;

    Ok(())
}
