use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use issue_labeler::web::{build_router, AppState};
use issue_labeler::{load_issues, ClassifierBuilder, IssueLabeler};

const SAMPLE_DATA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/corefx-issues-sample.tsv");

fn trained_state() -> AppState {
    let issues = load_issues(SAMPLE_DATA).unwrap();
    let classifier = ClassifierBuilder::new().fit(&issues).unwrap();
    AppState::new(IssueLabeler::from_classifier(classifier))
}

fn form_post(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_get_renders_empty_form() {
    let app = build_router(trained_state());
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("name=\"Input.Title\""));
    assert!(!html.contains("Predicted area:"));
}

#[tokio::test]
async fn test_post_renders_prediction() {
    let state = trained_state();
    let app = build_router(state);
    let response = app
        .oneshot(form_post(
            "Input.Title=Crash+on+startup&Input.Description=App+throws+NullReferenceException+on+launch",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("value=\"Crash on startup\""));
    assert!(html.contains("Predicted area: <strong>area-System."));
}

#[tokio::test]
async fn test_post_without_fields_still_renders() {
    let app = build_router(trained_state());
    let response = app.oneshot(form_post("")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Predicted area:"));
}

#[tokio::test]
async fn test_starter_mode_renders_page_without_prediction() {
    let app = build_router(AppState::starter());
    let response = app
        .oneshot(form_post("Input.Title=HttpClient+hangs&Input.Description=proxy"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("value=\"HttpClient hangs\""));
    assert!(!html.contains("Predicted area:"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = build_router(AppState::starter());
    let response = app
        .oneshot(Request::builder().uri("/api/predict").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
