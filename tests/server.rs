use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use storemap::server::router;
use storemap::{DataLoader, DataSource, Dataset};

fn fixture() -> &'static Dataset {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/stores.csv");
    let dataset = DataLoader::new(DataSource::Local(path)).load().unwrap().clone();
    Box::leak(Box::new(dataset))
}

async fn get(uri: &str) -> (StatusCode, String) {
    let response = router(fixture())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 4 * 1024 * 1024)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn index_serves_the_html_dashboard() {
    let (status, body) = get("/?analysis=ownership-analysis&question=2").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("<!DOCTYPE html>"));
    assert!(body.contains("Starbucks Store Location Analysis Dashboard"));
    assert!(body.contains("Ownership Type Analysis"));
    assert!(body.contains("Top 10 Cities by Store Count"));
    assert!(body.contains("<svg"));
}

#[tokio::test]
async fn api_returns_the_page_as_json() {
    let (status, body) = get("/api/page?analysis=location-analysis&question=4").await;
    assert_eq!(status, StatusCode::OK);

    let page: serde_json::Value = serde_json::from_str(&body).unwrap();
    let sections = page["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["header"], "Location Analysis");
    assert_eq!(sections[0]["blocks"][0]["content"]["kind"], "geo_scatter");
    assert_eq!(sections[1]["header"], "Question Analysis");
    assert_eq!(sections[1]["blocks"][1]["content"]["kind"], "bar");
}

#[tokio::test]
async fn placeholder_question_renders_the_section_only() {
    let (status, body) = get("/api/page?question=none").await;
    assert_eq!(status, StatusCode::OK);

    let page: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(page["sections"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_selectors_are_bad_requests() {
    let (status, body) = get("/api/page?question=42").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("42"));

    let (status, _) = get("/?analysis=sales").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
