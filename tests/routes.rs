mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::Fixture;
use order_desk::{lifecycle::OrderStatus, routes::orders, store::OrderStore};
use tower::ServiceExt;

#[tokio::test]
async fn create_order_accepts_a_missing_body() -> anyhow::Result<()> {
    let fx = Fixture::new().await;
    let app = orders::router().with_state(fx.state.clone());

    let response = app
        .oneshot(Request::post("/").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let orders = fx.store.list_orders(&[], true).await?;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].user_id, None);
    assert_eq!(orders[0].status, OrderStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn create_order_still_reads_a_json_body() -> anyhow::Result<()> {
    let fx = Fixture::new().await;
    let app = orders::router().with_state(fx.state.clone());
    let body = serde_json::json!({ "user_id": fx.customer.user_id }).to_string();

    let response = app
        .oneshot(
            Request::post("/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let orders = fx.store.list_orders(&[], true).await?;
    assert_eq!(orders[0].user_id, Some(fx.customer.user_id));
    Ok(())
}
