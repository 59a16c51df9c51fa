//! Integration tests covering the full in-process system: HTTP surface,
//! aggregator, gateway, channel and the three entity services.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, Arc<api::System>) {
    let system = api::build_system(&api::config::Config::default());
    let app = api::create_app(system.clone(), get_metrics_handle());
    (app, system)
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn aggregate_body(product_id: i32, recommendations: i32, reviews: i32) -> serde_json::Value {
    serde_json::json!({
        "productId": product_id,
        "name": format!("Name {product_id}"),
        "weight": product_id,
        "recommendations": (1..=recommendations).map(|id| serde_json::json!({
            "recommendationId": id, "author": format!("Author {id}"), "rate": id, "content": format!("Content {id}")
        })).collect::<Vec<_>>(),
        "reviews": (1..=reviews).map(|id| serde_json::json!({
            "reviewId": id, "author": format!("Author {id}"), "subject": format!("Subject {id}"), "content": format!("Content {id}")
        })).collect::<Vec<_>>(),
    })
}

async fn post_aggregate(app: &axum::Router, body: serde_json::Value) -> StatusCode {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/product-composite")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

async fn delete_aggregate(app: &axum::Router, product_id: i32) -> StatusCode {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/product-composite/{product_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn health_reports_all_components_up() {
    let (app, _) = setup();

    let (status, json) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "UP");
    assert_eq!(json["components"]["product"], "UP");
    assert_eq!(json["components"]["recommendation"], "UP");
    assert_eq!(json["components"]["review"], "UP");
}

#[tokio::test]
async fn malformed_key_is_a_bad_request() {
    let (app, _) = setup();

    let (status, json) = get_json(&app, "/product-composite/no-integer").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["path"], "/product-composite/no-integer");
    assert_eq!(json["status"], 400);
    assert_eq!(json["message"], "Type mismatch.");
}

#[tokio::test]
async fn invalid_product_id_is_unprocessable() {
    let (app, _) = setup();

    let (status, json) = get_json(&app, "/product-composite/-1").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["message"], "Invalid productId: -1");
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let (app, _) = setup();

    let (status, json) = get_json(&app, "/product-composite/13").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "No product found for productId: 13");
    assert_eq!(json["path"], "/product-composite/13");
}

#[tokio::test]
async fn created_aggregate_becomes_readable_once_events_settle() {
    let (app, system) = setup();

    assert_eq!(
        post_aggregate(&app, aggregate_body(1, 3, 2)).await,
        StatusCode::ACCEPTED
    );
    system.channel.quiesce().await;

    assert_eq!(system.product_repository.count().await, 1);
    assert_eq!(system.recommendation_repository.count_for_product(1).await, 3);
    assert_eq!(system.review_repository.count_for_product(1).await, 2);

    let (status, json) = get_json(&app, "/product-composite/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["productId"], 1);
    assert_eq!(json["name"], "Name 1");
    assert_eq!(json["recommendations"].as_array().unwrap().len(), 3);
    assert_eq!(json["recommendations"][2]["recommendationId"], 3);
    assert_eq!(json["reviews"].as_array().unwrap().len(), 2);
    assert!(json["serviceAddresses"]["composite"].as_str().unwrap().contains(":7000"));
    assert!(json["serviceAddresses"]["product"].as_str().unwrap().contains(":7001"));

    // Entity services answer directly as well.
    let (status, product) = get_json(&app, "/product/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["productId"], 1);

    let (status, recommendations) = get_json(&app, "/recommendation?productId=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recommendations.as_array().unwrap().len(), 3);

    let (status, reviews) = get_json(&app, "/review?productId=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_create_is_accepted_but_leaves_one_record_set() {
    let (app, system) = setup();

    assert_eq!(
        post_aggregate(&app, aggregate_body(1, 3, 2)).await,
        StatusCode::ACCEPTED
    );
    // The duplicate is rejected at the consumers, invisibly to this caller.
    assert_eq!(
        post_aggregate(&app, aggregate_body(1, 3, 2)).await,
        StatusCode::ACCEPTED
    );
    system.channel.quiesce().await;

    assert_eq!(system.product_repository.count().await, 1);
    assert_eq!(system.recommendation_repository.count_for_product(1).await, 3);
    assert_eq!(system.review_repository.count_for_product(1).await, 2);
}

#[tokio::test]
async fn delete_is_idempotent_across_all_three_stores() {
    let (app, system) = setup();

    post_aggregate(&app, aggregate_body(1, 3, 2)).await;
    system.channel.quiesce().await;

    assert_eq!(delete_aggregate(&app, 1).await, StatusCode::ACCEPTED);
    system.channel.quiesce().await;
    assert_eq!(system.product_repository.count().await, 0);
    assert_eq!(system.recommendation_repository.count_for_product(1).await, 0);
    assert_eq!(system.review_repository.count_for_product(1).await, 0);

    let (status, _) = get_json(&app, "/product-composite/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Second delete matches nothing and still succeeds.
    assert_eq!(delete_aggregate(&app, 1).await, StatusCode::ACCEPTED);
    system.channel.quiesce().await;
    assert_eq!(system.product_repository.count().await, 0);
}

#[tokio::test]
async fn unreachable_collection_source_degrades_to_empty_list() {
    let (app, system) = setup();

    post_aggregate(&app, aggregate_body(1, 3, 2)).await;
    system.channel.quiesce().await;

    system.transport.set_down("recommendation");

    let (status, json) = get_json(&app, "/product-composite/1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["recommendations"].as_array().unwrap().is_empty());
    assert_eq!(json["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(json["serviceAddresses"]["recommendation"], "");

    let (_, health) = get_json(&app, "/health").await;
    assert_eq!(health["status"], "DOWN");
    assert_eq!(health["components"]["recommendation"], "DOWN");
    assert_eq!(health["components"]["product"], "UP");
}

#[tokio::test]
async fn unreachable_root_source_fails_the_whole_read() {
    let (app, system) = setup();

    post_aggregate(&app, aggregate_body(1, 1, 1)).await;
    system.channel.quiesce().await;

    system.transport.set_down("product");

    let (status, json) = get_json(&app, "/product-composite/1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], 500);
}

#[tokio::test]
async fn recreate_after_delete_succeeds() {
    let (app, system) = setup();

    post_aggregate(&app, aggregate_body(1, 1, 1)).await;
    system.channel.quiesce().await;
    delete_aggregate(&app, 1).await;
    system.channel.quiesce().await;

    assert_eq!(
        post_aggregate(&app, aggregate_body(1, 2, 2)).await,
        StatusCode::ACCEPTED
    );
    system.channel.quiesce().await;

    let (status, json) = get_json(&app, "/product-composite/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["recommendations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn metrics_endpoint_renders_prometheus_text() {
    let (app, _) = setup();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
