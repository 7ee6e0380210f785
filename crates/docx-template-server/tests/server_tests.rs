use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use docx_template_core::convert::{Backend, BackendKind, ConversionChain, Locator, DEFAULT_TIMEOUT};
use docx_template_core::PackageOptions;
use docx_template_server::{app, AppState};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tower::ServiceExt;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const BOUNDARY: &str = "docx-template-test-boundary";
const MAX_UPLOAD: usize = 1024 * 1024;

const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:tbl><w:tr><w:tc><w:p><w:r><w:t>{{NA</w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>ME}}</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:body></w:document>"#;

fn template() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(DOCUMENT_XML.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

fn offline_app(static_dir: &Path) -> Router {
    let chain = ConversionChain::new(
        vec![Backend::new(
            "docx2pdf",
            BackendKind::Docx2Pdf,
            Locator::Installed(vec![PathBuf::from("/nonexistent/docx2pdf")]),
        )],
        DEFAULT_TIMEOUT,
    );
    app(AppState::new(chain, PackageOptions::default()), static_dir, MAX_UPLOAD)
}

fn multipart(template: Option<&[u8]>, placeholders_json: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(bytes) = template {
        write!(
            body,
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"template\"; filename=\"template.docx\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .unwrap();
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(json) = placeholders_json {
        write!(
            body,
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"placeholders_json\"\r\n\r\n{json}\r\n"
        )
        .unwrap();
    }
    write!(body, "--{BOUNDARY}--\r\n").unwrap();
    body
}

fn build_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn read_body(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn error_code(response: axum::response::Response) -> String {
    let body: serde_json::Value = serde_json::from_slice(&read_body(response).await).unwrap();
    body["code"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn root_reports_ok() {
    let dir = TempDir::new().unwrap();
    let response = offline_app(dir.path())
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn health_lists_no_converters_when_offline() {
    let dir = TempDir::new().unwrap();
    let response = offline_app(dir.path())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(body["healthy"], true);
    assert_eq!(body["converters"], serde_json::json!([]));
}

#[tokio::test]
async fn build_returns_filled_docx() {
    let dir = TempDir::new().unwrap();
    let body = multipart(Some(&template()), Some(r#"{"{{NAME}}": "Ana"}"#));
    let response = offline_app(dir.path())
        .oneshot(build_request("/build?format=docx", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"resume.docx\""
    );

    let bytes = read_body(response).await;
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    assert!(xml.contains(r#"<w:r><w:t xml:space="preserve">Ana</w:t></w:r>"#));
    assert!(xml.contains(r#"<w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve"></w:t></w:r>"#));
}

#[tokio::test]
async fn pdf_request_without_converter_is_a_server_error() {
    let dir = TempDir::new().unwrap();
    let body = multipart(Some(&template()), Some(r#"{"{{NAME}}": "Ana"}"#));
    let response = offline_app(dir.path())
        .oneshot(build_request("/build", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(body["error"], "PDF not found; check conversion step.");
    assert_eq!(body["code"], "PDF_UNAVAILABLE");
}

#[tokio::test]
async fn missing_map_is_a_bad_request() {
    let dir = TempDir::new().unwrap();
    let response = offline_app(dir.path())
        .oneshot(build_request("/build?format=docx", multipart(Some(&template()), None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "MISSING_FIELD");
}

#[tokio::test]
async fn malformed_inputs_are_unprocessable() {
    let dir = TempDir::new().unwrap();

    let bad_map = multipart(Some(&template()), Some("[1, 2]"));
    let response = offline_app(dir.path())
        .oneshot(build_request("/build?format=docx", bad_map))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bad_template = multipart(Some(b"not a zip"), Some("{}"));
    let response = offline_app(dir.path())
        .oneshot(build_request("/build?format=docx", bad_template))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(response).await, "INVALID_TEMPLATE");
}

#[tokio::test]
async fn unknown_format_is_rejected() {
    let dir = TempDir::new().unwrap();
    let body = multipart(Some(&template()), Some("{}"));
    let response = offline_app(dir.path())
        .oneshot(build_request("/build?format=odt", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "UNKNOWN_FORMAT");
}

#[tokio::test]
async fn serves_manifest_from_static_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("ai-plugin.json"), r#"{"name_for_model":"resume"}"#).unwrap();

    let response = offline_app(dir.path())
        .oneshot(
            Request::get("/.well-known/ai-plugin.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_body(response).await, br#"{"name_for_model":"resume"}"#.to_vec());
}
