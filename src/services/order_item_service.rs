use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::AddItemRequest,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin},
    models::{ItemSnapshot, OrderItem},
    response::{ApiResponse, Meta},
    services::inventory::InventoryLedger,
    state::AppState,
    store::NewOrderItem,
};

/// `price * quantity * (1 + gst / 100)`, rounded to cents.
pub fn line_amount(price: Decimal, gst: Decimal, quantity: i32) -> Decimal {
    let base = price * Decimal::from(quantity);
    let tax = base * gst / Decimal::ONE_HUNDRED;
    (base + tax).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddItemRequest,
) -> AppResult<ApiResponse<OrderItem>> {
    let store = state.store.as_ref();
    let AddItemRequest {
        order_id,
        item_id,
        quantity,
    } = payload;

    if quantity < 1 {
        return Err(AppError::InvalidRequest(
            "quantity must be at least 1".into(),
        ));
    }

    let item = store.find_item(item_id).await?.ok_or(AppError::NotFound)?;
    if quantity > item.stock {
        return Err(AppError::InvalidRequest(
            "requested quantity exceeds available stock".into(),
        ));
    }

    let order = store.find_order(order_id).await?.ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, order.user_id)?;
    if !order.status.is_editable() {
        return Err(AppError::PreconditionFailed(
            "order confirmed already".into(),
        ));
    }

    let amount = line_amount(item.price, item.gst, quantity);
    let line = store
        .create_order_item(NewOrderItem {
            order_id,
            item_id,
            quantity,
            billable_amount: amount,
            metadata: ItemSnapshot::from(&item),
        })
        .await?;

    if store.adjust_order_total(order_id, amount).await? == 0 {
        return Err(AppError::NotFound);
    }

    InventoryLedger::new(store).reserve(item_id, quantity).await;

    tracing::debug!(%order_id, %item_id, quantity, %amount, "order item added");
    log_audit(
        store,
        Some(user.user_id),
        "order_item_add",
        Some("order_items"),
        Some(serde_json::json!({
            "order_id": order_id,
            "order_item_id": line.id,
            "quantity": quantity,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Item added to order",
        line,
        Some(Meta::empty()),
    ))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    order_item_id: Uuid,
) -> AppResult<ApiResponse<OrderItem>> {
    let store = state.store.as_ref();

    let order = store.find_order(order_id).await?.ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, order.user_id)?;
    if !order.status.is_editable() {
        return Err(AppError::PreconditionFailed(
            "order confirmed already".into(),
        ));
    }

    let line = store
        .find_order_item(order_id, order_item_id)
        .await?
        .ok_or(AppError::NotFound)?;

    // The total only moves once this request has actually removed the row.
    if store.delete_order_item(order_id, order_item_id).await? == 0 {
        return Err(AppError::NotFound);
    }
    store
        .adjust_order_total(order_id, -line.billable_amount)
        .await?;

    InventoryLedger::new(store)
        .release(line.item_id, line.quantity)
        .await;

    tracing::debug!(%order_id, %order_item_id, "order item removed");
    log_audit(
        store,
        Some(user.user_id),
        "order_item_remove",
        Some("order_items"),
        Some(serde_json::json!({
            "order_id": order_id,
            "order_item_id": order_item_id,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order item deleted",
        line,
        Some(Meta::empty()),
    ))
}
