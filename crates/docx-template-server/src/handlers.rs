//! HTTP handlers.
//!
//! Implements:
//! - GET / - Liveness probe
//! - GET /health - Health check with the converters currently installed
//! - POST /build - Fill an uploaded template and return PDF or DOCX

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docx_template_core::pipeline::build_with_options;
use docx_template_core::{parse_placeholder_map, ConversionChain, PackageOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, ServerError};

pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<ConversionChain>,
    pub package_options: PackageOptions,
}

impl AppState {
    pub fn new(chain: ConversionChain, package_options: PackageOptions) -> Self {
        Self {
            chain: Arc::new(chain),
            package_options,
        }
    }
}

/// GET / - Liveness probe.
pub async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub converters: Vec<String>,
}

/// GET /health - Health check endpoint.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        converters: state.chain.available().into_iter().map(String::from).collect(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pdf,
    Docx,
}

impl OutputFormat {
    fn parse(value: Option<&str>) -> Result<Self> {
        match value.map(str::to_ascii_lowercase).as_deref() {
            None | Some("pdf") => Ok(OutputFormat::Pdf),
            Some("docx") => Ok(OutputFormat::Docx),
            Some(other) => Err(ServerError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BuildQuery {
    pub format: Option<String>,
}

/// POST /build - Fill the uploaded template.
///
/// Multipart fields:
/// - `template`: the .docx file
/// - `placeholders_json`: JSON object mapping placeholders to values
pub async fn build_handler(
    State(state): State<AppState>,
    Query(query): Query<BuildQuery>,
    mut multipart: Multipart,
) -> Result<Response> {
    let format = OutputFormat::parse(query.format.as_deref())?;
    let build_id = Uuid::new_v4();

    let mut template = None;
    let mut placeholders_json = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("template") => template = Some(field.bytes().await?),
            Some("placeholders_json") => placeholders_json = Some(field.text().await?),
            other => debug!("Ignoring form field {:?}", other),
        }
    }

    let template = template.ok_or(ServerError::MissingField("template"))?;
    let placeholders_json = placeholders_json.ok_or(ServerError::MissingField("placeholders_json"))?;
    let map = parse_placeholder_map(&placeholders_json)?;

    info!(
        %build_id,
        "Building {:?} from {} byte template with {} placeholder(s)",
        format,
        template.len(),
        map.len()
    );

    let chain = match format {
        OutputFormat::Pdf => Arc::clone(&state.chain),
        OutputFormat::Docx => Arc::new(ConversionChain::disabled()),
    };
    let options = state.package_options.clone();
    let output = tokio::task::spawn_blocking(move || {
        build_with_options(&template, &map, &options, &chain)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("build task failed: {}", e)))??;

    match format {
        OutputFormat::Docx => Ok(attachment(DOCX_MEDIA_TYPE, "resume.docx", output.document)),
        OutputFormat::Pdf => {
            let pdf = output.pdf.ok_or(ServerError::PdfUnavailable)?;
            info!(%build_id, "Returning {} byte PDF", pdf.len());
            Ok(attachment(PDF_MEDIA_TYPE, "resume.pdf", pdf))
        }
    }
}

fn attachment(content_type: &'static str, filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}
