//! REST endpoint tests driven through the router with `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use trellis::api::{ApiState, create_router};
use trellis::classify::{DimensionRoots, SplitClassifier};
use trellis::config::ServerConfig;
use trellis::oracle::ClassificationOracle;

use crate::support::{sample_snapshot, FailingOracle, ScriptedOracle};

const BOUNDARY: &str = "trellis-test-boundary";

fn router_with(oracle: Arc<dyn ClassificationOracle>) -> Router {
    router_with_config(oracle, ServerConfig::default())
}

fn router_with_config(oracle: Arc<dyn ClassificationOracle>, config: ServerConfig) -> Router {
    let snapshot = sample_snapshot();
    let classifier = Arc::new(
        SplitClassifier::new(
            snapshot.clone(),
            oracle,
            &DimensionRoots::default(),
            Duration::from_secs(3600),
        )
        .unwrap(),
    );
    let state = Arc::new(ApiState::new(snapshot, classifier, &config));
    create_router(state, &config)
}

/// Multipart body with a file part and an optional name part.
fn upload_body(
    file_name: &str,
    content_type: &str,
    content: &[u8],
    name: Option<&str>,
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
    if let Some(name) = name {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"name\"\r\n\r\n\
                 {name}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn classify_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/classify")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_classify_endpoint_returns_classification() {
    let oracle = ScriptedOracle::new(
        "Integer Multiplication",
        &["Procedural Fluency"],
        &["Visual Representation"],
    );
    let router = router_with(oracle.clone());

    let body = upload_body(
        "worksheet.pdf",
        "application/pdf",
        b"7 x 8 = ?",
        Some("worksheet-7"),
    );
    let response = router.oneshot(classify_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(
        json["classification"]["areas"][0]["name"],
        "IntegerMultiplication"
    );
    assert_eq!(
        json["classification"]["abilities"][0]["natural_name"],
        "Procedural Fluency"
    );
    assert!(json["expansion"]["areas"].is_array());
    assert_eq!(oracle.uploads(), 1);
}

#[tokio::test]
async fn test_classify_shares_cache_across_requests() {
    let oracle = ScriptedOracle::new("Geometry", &[], &[]);
    let router = router_with(oracle.clone());

    for _ in 0..2 {
        let body = upload_body(
            "shapes.pdf",
            "application/pdf",
            b"triangles",
            Some("shapes"),
        );
        let response = router
            .clone()
            .oneshot(classify_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(oracle.uploads(), 1, "second request must hit the cache");
}

#[tokio::test]
async fn test_classify_falls_back_to_file_name() {
    let oracle = ScriptedOracle::new("Geometry", &[], &[]);
    let router = router_with(oracle.clone());

    // No name part; the multipart file name keys the cache instead.
    for _ in 0..2 {
        let body = upload_body("shapes.pdf", "application/pdf", b"triangles", None);
        let response = router
            .clone()
            .oneshot(classify_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(oracle.uploads(), 1);
}

#[tokio::test]
async fn test_classify_without_file_part_is_rejected() {
    let router = router_with(ScriptedOracle::new("Geometry", &[], &[]));

    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"name\"\r\n\r\n\
         only-a-name\r\n\
         --{BOUNDARY}--\r\n"
    )
    .into_bytes();
    let response = router.oneshot(classify_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["code"], "invalid_upload");
    assert!(json["error"].as_str().unwrap().contains("missing file part"));
}

#[tokio::test]
async fn test_classify_rejects_unlisted_mime_type() {
    let oracle = ScriptedOracle::new("Geometry", &[], &[]);
    let router = router_with(oracle.clone());

    let body = upload_body("archive.zip", "application/zip", b"PK", None);
    let response = router.oneshot(classify_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["code"], "invalid_upload");
    assert!(json["error"].as_str().unwrap().contains("application/zip"));
    assert_eq!(oracle.uploads(), 0, "rejected uploads never reach the oracle");
}

#[tokio::test]
async fn test_classify_rejects_empty_file() {
    let router = router_with(ScriptedOracle::new("Geometry", &[], &[]));

    let body = upload_body("empty.pdf", "application/pdf", b"", None);
    let response = router.oneshot(classify_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["code"], "invalid_upload");
}

#[tokio::test]
async fn test_classify_rejects_body_over_size_limit() {
    let oracle = ScriptedOracle::new("Geometry", &[], &[]);
    let config = ServerConfig {
        max_upload_bytes: 512,
        ..ServerConfig::default()
    };
    let router = router_with_config(oracle.clone(), config);

    let body = upload_body("big.pdf", "application/pdf", &[0u8; 4096], None);
    let response = router.oneshot(classify_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json = json_body(response).await;
    assert_eq!(json["code"], "payload_too_large");
    assert_eq!(oracle.uploads(), 0, "oversized bodies never reach the oracle");
}

#[tokio::test]
async fn test_oracle_failure_maps_to_bad_gateway() {
    let router = router_with(Arc::new(FailingOracle));

    let body = upload_body("worksheet.pdf", "application/pdf", b"7 x 8", None);
    let response = router.oneshot(classify_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = json_body(response).await;
    assert_eq!(json["code"], "oracle_unavailable");
}

#[tokio::test]
async fn test_unmatched_answer_maps_to_bad_gateway() {
    let router = router_with(ScriptedOracle::new("Alchemy", &[], &[]));

    let body = upload_body("weird.pdf", "application/pdf", b"?", None);
    let response = router.oneshot(classify_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = json_body(response).await;
    assert_eq!(json["code"], "unmatched_term");
    assert!(json["error"].as_str().unwrap().contains("Alchemy"));
}

#[tokio::test]
async fn test_ontology_endpoint_serves_dimension_trees() {
    let router = router_with(ScriptedOracle::new("Geometry", &[], &[]));

    let request = Request::builder()
        .uri("/ontology")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let areas = json["taxonomy"]["areas"].as_array().unwrap();
    assert_eq!(areas[0]["name"], "Mathematics");
    let children: Vec<&str> = areas[0]["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect();
    assert_eq!(children, vec!["Arithmetic", "Geometry"]);
    assert_eq!(json["taxonomy"]["scopes"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_health_endpoint() {
    let router = router_with(ScriptedOracle::new("Geometry", &[], &[]));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "trellis");
    assert!(!json["version"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint_exports_prometheus() {
    let oracle = ScriptedOracle::new("Geometry", &[], &[]);
    let router = router_with(oracle);

    let body = upload_body("shapes.pdf", "application/pdf", b"triangles", None);
    router
        .clone()
        .oneshot(classify_request(body))
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("trellis_classifications_total"), "got: {text}");
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let router = router_with(ScriptedOracle::new("Geometry", &[], &[]));

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/classify")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    let allowed = response
        .headers()
        .get("access-control-allow-origin")
        .map(|v| v.to_str().unwrap().to_string());
    assert_eq!(allowed.as_deref(), Some("*"));
}
