//! Record writes through the HTTP API and their effect on the neglect index.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use ndris_domains::testing::{MockAggregates, MockIndexStore};
use ndris_domains::NeglectIndexEngine;
use ndris_server::{build_router, AppState};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    sqlx::migrate!("../../migrations").run(&pool).await.ok()?;
    Some(pool)
}

fn district(label: &str) -> String {
    format!("{label}-{}", &Uuid::new_v4().simple().to_string()[..8])
}

/// Real record stores, in-memory index so refreshes can be counted.
fn app(pool: PgPool, store: Arc<MockIndexStore>, refresh_on_write: bool) -> Router {
    let engine = NeglectIndexEngine::new(Arc::new(MockAggregates::new()), store);
    build_router(
        Arc::new(AppState {
            engine,
            pool,
            refresh_on_write,
        }),
        &[],
    )
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn grievance(district: &str) -> serde_json::Value {
    serde_json::json!({
        "category": "water",
        "district": district,
        "description": "No drinking water supply for two weeks"
    })
}

#[tokio::test]
async fn create_and_delete_refresh_the_district() {
    let Some(pool) = test_pool().await else {
        eprintln!("DATABASE_TEST_URL not set, skipping");
        return;
    };
    let store = Arc::new(MockIndexStore::new());
    let app = app(pool, store.clone(), true);
    let d = district("Rautahat");

    let (status, created) = send(&app, Method::POST, "/api/grievances", Some(grievance(&d))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(store.upsert_calls(), 1);

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = send(&app, Method::GET, &format!("/api/grievances/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["district"], d.as_str());

    let (status, _) = send(&app, Method::DELETE, &format!("/api/grievances/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(store.upsert_calls(), 2);

    let (status, _) = send(&app, Method::GET, &format!("/api/grievances/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn moving_a_record_refreshes_old_and_new_district() {
    let Some(pool) = test_pool().await else {
        eprintln!("DATABASE_TEST_URL not set, skipping");
        return;
    };
    let store = Arc::new(MockIndexStore::new());
    let app = app(pool, store.clone(), true);
    let from = district("Bara");
    let to = district("Parsa");

    let (_, created) = send(
        &app,
        Method::POST,
        "/api/policies",
        Some(serde_json::json!({
            "policy_name": "School meal programme",
            "sector": "education",
            "district": from,
            "effectiveness_score": 6
        })),
    )
    .await;
    let id = created["id"].as_str().unwrap();
    assert_eq!(store.upsert_calls(), 1);

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/api/policies/{id}"),
        Some(serde_json::json!({ "district": to, "effectiveness_score": 8 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["district"], to.as_str());
    assert_eq!(updated["effectiveness_score"], 8);
    assert_eq!(updated["policy_name"], "School meal programme");
    assert_eq!(store.upsert_calls(), 3);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn failed_refresh_does_not_fail_the_write() {
    let Some(pool) = test_pool().await else {
        eprintln!("DATABASE_TEST_URL not set, skipping");
        return;
    };
    let d = district("Saptari");
    let store = Arc::new(MockIndexStore::new().failing_upserts_for(&d));
    let app = app(pool, store.clone(), true);

    let (status, created) = send(&app, Method::POST, "/api/grievances", Some(grievance(&d))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(store.upsert_calls(), 1);
    assert!(store.is_empty());

    let id = created["id"].as_str().unwrap();
    let (status, _) = send(&app, Method::DELETE, &format!("/api/grievances/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn refresh_disabled_leaves_index_untouched() {
    let Some(pool) = test_pool().await else {
        eprintln!("DATABASE_TEST_URL not set, skipping");
        return;
    };
    let store = Arc::new(MockIndexStore::new());
    let app = app(pool, store.clone(), false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/disasters",
        Some(serde_json::json!({
            "title": "Koshi flood",
            "disaster_type": "flood",
            "district": district("Sunsari"),
            "year": 2008,
            "impact_level": 9
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(store.upsert_calls(), 0);
}
