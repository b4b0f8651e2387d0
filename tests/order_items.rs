mod common;

use common::{Fixture, insert_user};
use order_desk::{
    dto::orders::{AddItemRequest, CancelOrderRequest},
    error::AppError,
    models::OrderItem,
    services::{inventory::InventoryLedger, order_item_service, order_service},
};
use rust_decimal::Decimal;
use uuid::Uuid;

fn sum(lines: &[OrderItem]) -> Decimal {
    lines.iter().map(|line| line.billable_amount).sum()
}

fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

#[test]
fn line_amount_applies_gst_on_top_of_price() {
    assert_eq!(
        order_item_service::line_amount(Decimal::from(100), Decimal::from(18), 2),
        Decimal::from(236)
    );
    assert_eq!(
        order_item_service::line_amount(dec("19.99"), Decimal::from(5), 3),
        dec("62.97")
    );
    assert_eq!(
        order_item_service::line_amount(Decimal::from(50), Decimal::ZERO, 1),
        Decimal::from(50)
    );
}

#[test]
fn line_amount_rounds_half_cents_away_from_zero() {
    // 0.10 * 1.05 = 0.105
    assert_eq!(
        order_item_service::line_amount(dec("0.10"), Decimal::from(5), 1),
        dec("0.11")
    );
}

#[tokio::test]
async fn adding_an_item_prices_the_line_and_moves_stock() -> anyhow::Result<()> {
    let fx = Fixture::new().await;
    let item = fx.item(100, 18, 10).await;
    let order = fx.cart(None).await;

    let resp = order_item_service::add_item(
        &fx.state,
        &fx.customer,
        AddItemRequest {
            order_id: order.id,
            item_id: item.id,
            quantity: 2,
        },
    )
    .await?;
    assert_eq!(resp.message, "Item added to order");
    let line = resp.data.expect("line");
    assert_eq!(line.billable_amount, Decimal::from(236));
    assert_eq!(line.quantity, 2);
    assert_eq!(line.order_id, order.id);

    let order = fx.stored_order(order.id).await;
    assert_eq!(order.billable_amount, Decimal::from(236));

    let item = fx.stored_item(item.id).await;
    assert_eq!((item.stock, item.sold), (8, 2));
    Ok(())
}

#[tokio::test]
async fn quantity_above_stock_is_rejected_without_side_effects() {
    let fx = Fixture::new().await;
    let item = fx.item(100, 18, 3).await;
    let order = fx.cart(None).await;

    let err = order_item_service::add_item(
        &fx.state,
        &fx.customer,
        AddItemRequest {
            order_id: order.id,
            item_id: item.id,
            quantity: 4,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidRequest(msg) if msg.contains("stock")));

    assert!(fx.lines(order.id).await.is_empty());
    assert_eq!(fx.stored_order(order.id).await.billable_amount, Decimal::ZERO);
    let item = fx.stored_item(item.id).await;
    assert_eq!((item.stock, item.sold), (3, 0));
}

#[tokio::test]
async fn quantity_must_be_positive() {
    let fx = Fixture::new().await;
    let item = fx.item(10, 0, 5).await;
    let order = fx.cart(None).await;

    for quantity in [0, -1] {
        let err = order_item_service::add_item(
            &fx.state,
            &fx.customer,
            AddItemRequest {
                order_id: order.id,
                item_id: item.id,
                quantity,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }
    assert!(fx.lines(order.id).await.is_empty());
}

#[tokio::test]
async fn unknown_item_or_order_is_not_found() {
    let fx = Fixture::new().await;
    let item = fx.item(10, 0, 5).await;
    let order = fx.cart(None).await;

    let err = order_item_service::add_item(
        &fx.state,
        &fx.customer,
        AddItemRequest {
            order_id: order.id,
            item_id: Uuid::new_v4(),
            quantity: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = order_item_service::add_item(
        &fx.state,
        &fx.customer,
        AddItemRequest {
            order_id: Uuid::new_v4(),
            item_id: item.id,
            quantity: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    assert_eq!(fx.stored_item(item.id).await.stock, 5);
}

#[tokio::test]
async fn lines_are_frozen_once_the_order_leaves_pending() -> anyhow::Result<()> {
    let fx = Fixture::new().await;
    let item = fx.item(10, 0, 5).await;
    let order = fx.cart(Some(fx.customer.user_id)).await;
    let line = fx.add(order.id, item.id, 1).await;

    order_service::cancel_order(
        &fx.state,
        &fx.customer,
        order.id,
        CancelOrderRequest {
            cancellation_reason: "changed my mind".into(),
        },
    )
    .await?;

    let err = order_item_service::add_item(
        &fx.state,
        &fx.customer,
        AddItemRequest {
            order_id: order.id,
            item_id: item.id,
            quantity: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::PreconditionFailed(msg) if msg == "order confirmed already"));

    let err = order_item_service::remove_item(&fx.state, &fx.customer, order.id, line.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PreconditionFailed(_)));
    assert_eq!(fx.lines(order.id).await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn order_total_tracks_the_sum_of_its_lines() -> anyhow::Result<()> {
    let fx = Fixture::new().await;
    let silver = fx.item(100, 18, 10).await;
    let gold = fx.item(250, 3, 10).await;
    let order = fx.cart(None).await;

    fx.add(order.id, silver.id, 2).await;
    let gold_line = fx.add(order.id, gold.id, 1).await;
    fx.add(order.id, silver.id, 1).await;

    let lines = fx.lines(order.id).await;
    assert_eq!(lines.len(), 3);
    assert_eq!(fx.stored_order(order.id).await.billable_amount, sum(&lines));

    order_item_service::remove_item(&fx.state, &fx.customer, order.id, gold_line.id).await?;
    let lines = fx.lines(order.id).await;
    assert_eq!(lines.len(), 2);
    assert_eq!(fx.stored_order(order.id).await.billable_amount, sum(&lines));
    assert_eq!(sum(&lines), Decimal::from(354));
    Ok(())
}

#[tokio::test]
async fn add_then_remove_restores_counters_and_total() -> anyhow::Result<()> {
    let fx = Fixture::new().await;
    let item = fx.item(40, 12, 7).await;
    let order = fx.cart(None).await;
    let before = fx.stored_item(item.id).await;

    let line = fx.add(order.id, item.id, 3).await;
    let during = fx.stored_item(item.id).await;
    assert_eq!(during.stock + during.sold, before.stock + before.sold);

    let resp = order_item_service::remove_item(&fx.state, &fx.customer, order.id, line.id).await?;
    assert_eq!(resp.message, "Order item deleted");

    let after = fx.stored_item(item.id).await;
    assert_eq!((after.stock, after.sold), (before.stock, before.sold));
    assert_eq!(fx.stored_order(order.id).await.billable_amount, Decimal::ZERO);
    assert!(fx.lines(order.id).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn removing_a_line_through_another_order_is_not_found() {
    let fx = Fixture::new().await;
    let item = fx.item(10, 0, 5).await;
    let first = fx.cart(None).await;
    let second = fx.cart(None).await;
    let line = fx.add(first.id, item.id, 2).await;

    let err = order_item_service::remove_item(&fx.state, &fx.customer, second.id, line.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    assert_eq!(fx.lines(first.id).await.len(), 1);
    assert_eq!(fx.stored_order(first.id).await.billable_amount, Decimal::from(20));
    assert_eq!(fx.stored_item(item.id).await.stock, 3);
}

#[tokio::test]
async fn release_drift_is_audited_and_does_not_fail_the_removal() -> anyhow::Result<()> {
    let fx = Fixture::new().await;
    let item = fx.item(10, 0, 5).await;
    let order = fx.cart(None).await;
    let line = fx.add(order.id, item.id, 2).await;

    // Someone zeroed `sold` behind the ledger's back.
    assert!(fx.store.set_item_counters(item.id, 3, 0).await);

    order_item_service::remove_item(&fx.state, &fx.customer, order.id, line.id).await?;

    assert!(fx.lines(order.id).await.is_empty());
    assert_eq!(fx.stored_order(order.id).await.billable_amount, Decimal::ZERO);
    let item_after = fx.stored_item(item.id).await;
    assert_eq!((item_after.stock, item_after.sold), (3, 0));

    let audit = fx.store.audit_entries().await;
    let drift = audit
        .iter()
        .find(|entry| entry.action == "inventory_drift")
        .expect("drift audit row");
    let metadata = drift.metadata.as_ref().expect("drift metadata");
    assert_eq!(metadata["op"], "release");
    assert_eq!(metadata["item_id"], serde_json::json!(item.id));
    assert!(audit.iter().any(|entry| entry.action == "order_item_remove"));
    Ok(())
}

#[tokio::test]
async fn line_snapshot_ignores_later_catalog_edits() {
    let fx = Fixture::new().await;
    let mut item = fx.item(75, 18, 9).await;
    let order = fx.cart(None).await;
    let line = fx.add(order.id, item.id, 1).await;

    assert_eq!(line.metadata.name, item.name);
    assert_eq!(line.metadata.price, Decimal::from(75));

    item.name = "Renamed coin".into();
    item.price = Decimal::from(999);
    fx.store.insert_item(item).await;

    let stored = fx.lines(order.id).await.remove(0);
    assert_ne!(stored.metadata.name, "Renamed coin");
    assert_eq!(stored.metadata.price, Decimal::from(75));
    assert_eq!(stored.billable_amount, line.billable_amount);
}

#[tokio::test]
async fn only_the_owner_or_an_admin_edits_lines() -> anyhow::Result<()> {
    let fx = Fixture::new().await;
    let item = fx.item(10, 0, 5).await;
    let order = fx.cart(Some(fx.customer.user_id)).await;
    let line = fx.add(order.id, item.id, 1).await;
    let stranger = insert_user(&fx.store, "user").await;

    let err = order_item_service::add_item(
        &fx.state,
        &stranger,
        AddItemRequest {
            order_id: order.id,
            item_id: item.id,
            quantity: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = order_item_service::remove_item(&fx.state, &stranger, order.id, line.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(fx.lines(order.id).await.len(), 1);
    assert_eq!(fx.stored_item(item.id).await.stock, 4);

    order_item_service::add_item(
        &fx.state,
        &fx.admin,
        AddItemRequest {
            order_id: order.id,
            item_id: item.id,
            quantity: 2,
        },
    )
    .await?;
    assert_eq!(fx.lines(order.id).await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn anyone_may_fill_an_anonymous_cart() -> anyhow::Result<()> {
    let fx = Fixture::new().await;
    let item = fx.item(10, 0, 5).await;
    let order = fx.cart(None).await;
    let stranger = insert_user(&fx.store, "user").await;

    let line = order_item_service::add_item(
        &fx.state,
        &stranger,
        AddItemRequest {
            order_id: order.id,
            item_id: item.id,
            quantity: 1,
        },
    )
    .await?
    .data
    .expect("line");
    order_item_service::remove_item(&fx.state, &fx.customer, order.id, line.id).await?;
    assert!(fx.lines(order.id).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn reserve_drift_is_audited_and_leaves_counters_alone() {
    let fx = Fixture::new().await;
    let item = fx.item(10, 0, 2).await;
    let ledger = InventoryLedger::new(&fx.store);

    assert!(!ledger.reserve(item.id, 3).await);
    assert!(!ledger.reserve(Uuid::new_v4(), 1).await);

    let stored = fx.stored_item(item.id).await;
    assert_eq!((stored.stock, stored.sold), (2, 0));

    let drift: Vec<_> = fx
        .store
        .audit_entries()
        .await
        .into_iter()
        .filter(|entry| entry.action == "inventory_drift")
        .collect();
    assert_eq!(drift.len(), 2);
    let metadata = drift[0].metadata.as_ref().expect("drift metadata");
    assert_eq!(metadata["op"], "reserve");
    assert_eq!(metadata["item_id"], serde_json::json!(item.id));

    assert!(ledger.reserve(item.id, 2).await);
    let stored = fx.stored_item(item.id).await;
    assert_eq!((stored.stock, stored.sold), (0, 2));
}
