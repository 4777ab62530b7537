mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use order_placement_api::routes::build_router;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{create_product, setup_state, stock_of};

async fn send(app: axum::Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

fn post_order(body: String) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri("/api/orders")
        .header("content-type", "application/json")
        .body(Body::from(body))?)
}

#[tokio::test]
async fn health_check_returns_ok() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let request = Request::builder().uri("/health").body(Body::empty())?;

    let (status, body) = send(build_router(state), request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Health check");
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn checkout_endpoint_creates_orders() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product = create_product(&state, "Paneer", 100, 5).await?;

    let payload = json!({
        "user_id": "42",
        "total_amount": "200",
        "items": [{ "product_id": product, "quantity": 2, "price": 100 }]
    });
    let (status, body) = send(build_router(state.clone()), post_order(payload.to_string())?).await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["order_ids"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["generated_order_numbers"][0], body["order_number"]);
    assert_eq!(stock_of(&state, product).await?, 3);
    Ok(())
}

#[tokio::test]
async fn missing_total_amount_is_unprocessable() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let payload = json!({ "user_id": 1, "product_id": 1 });

    let (status, body) = send(build_router(state), post_order(payload.to_string())?).await?;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing required: total_amount");
    assert!(body.get("retry_count").is_none());
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_reports_retry_counters() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product = create_product(&state, "Ghee", 500, 1).await?;
    let payload = json!({
        "user_id": 1,
        "total_amount": 1000,
        "product_id": product,
        "quantity": 2
    });

    let request = post_order(payload.to_string())?;
    let (status, body) = send(build_router(state.clone()), request).await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["retry_count"], 0);
    assert_eq!(body["max_retries"], 5);
    assert_eq!(stock_of(&state, product).await?, 1);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() -> anyhow::Result<()> {
    let state = setup_state().await?;

    let (status, body) = send(build_router(state), post_order("{not json".into())?).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let request = Request::builder().uri("/api/nowhere").body(Body::empty())?;

    let (status, body) = send(build_router(state), request).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");
    Ok(())
}
