// HTTP API tests against the router, driven with tower's oneshot.
//
// Each test builds a fresh in-memory store, so tests are independent.

#![cfg(all(feature = "web", feature = "sqlite"))]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use reviewlens::config::Config;
use reviewlens::db::models::NewApp;
use reviewlens::db::Database;
use reviewlens::topics::Review;
use reviewlens::web::{build_router, AppState};

fn test_config() -> Config {
    Config {
        db_path: ":memory:".to_string(),
        lexicon_path: PathBuf::from("/nonexistent/lexicon.tsv"),
        chart_font: None,
        n_topics: 5,
        n_top_words: 10,
    }
}

async fn app_with(reviews: &[&str]) -> (Router, Arc<dyn Database>) {
    let db = reviewlens::db::in_memory().unwrap();
    db.upsert_app(&NewApp {
        app_id: "com.example".to_string(),
        app_name: "Example".to_string(),
        download_count: 500,
    })
    .await
    .unwrap();
    let reviews: Vec<Review> = reviews
        .iter()
        .map(|text| Review::new(4.0, *text, "2024-06-01"))
        .collect();
    db.insert_reviews("com.example", &reviews, false).await.unwrap();

    let router = build_router(AppState {
        db: db.clone(),
        config: Arc::new(test_config()),
    });
    (router, db)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn topic_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/apps/topic-modeling")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _) = app_with(&[]).await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn list_and_get_apps() {
    let (app, _) = app_with(&["좋은 앱", "느리다"]).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/apps").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let apps = body_json(response).await;
    assert_eq!(apps.as_array().unwrap().len(), 1);
    assert_eq!(apps[0]["app_id"], "com.example");
    assert_eq!(apps[0]["review_count"], 2);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/apps/com.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["app_info"]["app_name"], "Example");
    assert_eq!(detail["reviews"][1]["review_content"], "느리다");
}

#[tokio::test]
async fn unknown_app_is_not_found() {
    let (app, _) = app_with(&[]).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/apps/com.missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "App not found");
}

#[tokio::test]
async fn delete_app_then_not_found() {
    let (app, db) = app_with(&["좋은 앱"]).await;
    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri("/api/apps/com.example")
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["message"].is_string());
    assert_eq!(db.count_reviews().await.unwrap(), 0);

    let response = app.oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn topic_modeling_success() {
    let (app, _) = app_with(&["정말 좋은 앱입니다", "너무 나쁜 경험이었다", "그냥 보통이에요"]).await;
    let response = app
        .oneshot(topic_request(r#"{"app_id": "com.example"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["n_topics"], 2);
    assert_eq!(result["total_reviews"], 3);
    assert!(result["chart"].is_null());
    assert_eq!(result["doc_topics"].as_array().unwrap().len(), 3);
    assert!(result["doc_topics"][0]["review_preview"].is_string());
}

#[tokio::test]
async fn topic_modeling_unknown_app() {
    let (app, _) = app_with(&[]).await;
    let response = app
        .oneshot(topic_request(r#"{"app_id": "com.missing"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn topic_modeling_too_few_reviews_is_bad_request() {
    let (app, _) = app_with(&["좋은 앱", ""]).await;
    let response = app
        .oneshot(topic_request(r#"{"app_id": "com.example"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("found 1"), "{error}");
}

#[tokio::test]
async fn topic_modeling_without_adjectives_is_bad_request() {
    let (app, _) = app_with(&["보통", "그냥 그래", "음", "별로", "글쎄", "모름"]).await;
    let response = app
        .oneshot(topic_request(r#"{"app_id": "com.example"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("adjectives"), "{error}");
}

#[tokio::test]
async fn topic_modeling_rejects_zero_topics() {
    let (app, _) = app_with(&["좋은 앱"]).await;
    let response = app
        .oneshot(topic_request(r#"{"app_id": "com.example", "n_topics": 0}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
