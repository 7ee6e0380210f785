//! HTTP surface for docx-template: upload a template plus a placeholder map,
//! get the filled document back as PDF or DOCX.

pub mod config;
pub mod error;
pub mod handlers;

use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::Config;
pub use handlers::AppState;

use handlers::{build_handler, health_handler, root_handler};

/// Build the router. `/.well-known` is served from `static_dir` when it exists.
pub fn app(state: AppState, static_dir: &Path, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/build", post(build_handler));

    if static_dir.is_dir() {
        info!("Serving /.well-known from {:?}", static_dir);
        router = router.nest_service("/.well-known", ServeDir::new(static_dir));
    } else {
        warn!("Static directory {:?} not found, /.well-known disabled", static_dir);
    }

    router
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
