use axum::{body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use rustytcx::build_app;
use rustytcx::config::AppConfig;
use tower::ServiceExt;

const BOUNDARY: &str = "rustytcx-boundary";

fn multipart_request(uri: &str, file: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"run.tcx\"\r\n\
          Content-Type: application/octet-stream\r\n\r\n",
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn fixture_bytes() -> Vec<u8> {
    std::fs::read("tests/fixtures/run.tcx").expect("fixture should be present")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn landing_page_responds() {
    let app = build_app(&AppConfig::default());
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Upload a TCX file"));
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let app = build_app(&AppConfig::default());
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", "multipart/form-data; boundary=--boundary")
        .body(Body::from("----boundary--"))
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn valid_upload_renders_summary() {
    let app = build_app(&AppConfig::default());
    let response = app
        .oneshot(multipart_request("/upload", &fixture_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("TCX parsed"));
    assert!(html.contains("6:13 min/km"));
    assert!(html.contains("HR Time in Zones"));
}

#[tokio::test]
async fn unparseable_upload_reports_failure() {
    let app = build_app(&AppConfig::default());
    let response = app
        .oneshot(multipart_request("/upload", b"<not-a-tcx/>"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Could not parse TCX"));
}

#[tokio::test]
async fn api_upload_returns_metrics_json() {
    let app = build_app(&AppConfig::default());
    let response = app
        .oneshot(multipart_request("/api/upload", &fixture_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["metrics"]["duration_sec"], 600.0);
    assert_eq!(json["metrics"]["distance_m"], 1609.34);
    assert_eq!(json["metrics"]["hr_drift"], 0.1379);
    assert_eq!(json["autofill"]["duration_min"], 10);
    assert_eq!(json["time_in_zones"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn api_upload_rejects_unparseable_file() {
    let app = build_app(&AppConfig::default());
    let response = app
        .oneshot(multipart_request("/api/upload", b"garbage"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["error"], "Could not parse TCX");
}

#[tokio::test]
async fn uploads_over_the_body_limit_are_refused() {
    let config = AppConfig {
        max_upload_bytes: 64,
        ..AppConfig::default()
    };
    let app = build_app(&config);
    let response = app
        .oneshot(multipart_request("/upload", &fixture_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body_text(response).await.starts_with("Failed to read uploaded file"));
}
