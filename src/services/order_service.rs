use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        CancelOrderRequest, ConfirmOrderRequest, CreateOrderRequest, DeliveredOrder,
        MarkDeliveredRequest, MarkPaidRequest, MarkShippedRequest, OrderList, OrderWithItems,
        Reconciliation, ShippedOrder,
    },
    error::{AppError, AppResult},
    lifecycle::{OrderStatus, Transition},
    middleware::auth::{AuthUser, ensure_admin, ensure_owner_or_admin},
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::inventory::InventoryLedger,
    state::AppState,
    store::{NewDeliveryDetails, NewShippingDetails, OrderPatch, OrderStore},
};

pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let store = state.store.as_ref();
    if let Some(user_id) = payload.user_id {
        ensure_user_exists(store, user_id).await?;
    }

    let order = store.create_order(payload.user_id).await?;

    log_audit(
        store,
        order.user_id,
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await;

    Ok(ApiResponse::success("Order created", order, Some(Meta::empty())))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;

    let statuses = query
        .status
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<OrderStatus>()
                .map_err(|e| AppError::InvalidRequest(e.to_string()))
        })
        .collect::<AppResult<Vec<_>>>()?;
    let newest_first = query.sort_order.unwrap_or_default() == SortOrder::Desc;

    let orders = state.store.list_orders(&statuses, newest_first).await?;
    let meta = Meta::with_total(orders.len() as i64);

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderWithItems>> {
    let store = state.store.as_ref();
    let order = store.find_order(id).await?.ok_or(AppError::NotFound)?;
    let items = store.list_order_items(order.id).await?;
    let meta = Meta::with_total(items.len() as i64);

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems { order, items },
        Some(meta),
    ))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let store = state.store.as_ref();

    let order = store.find_order(id).await?.ok_or(AppError::NotFound)?;
    let lines = store.list_order_items(id).await?;

    if store.delete_order(id).await? == 0 {
        return Err(AppError::NotFound);
    }

    // Units of an order that never left the warehouse go back on the shelf.
    if !has_left_warehouse(&order) {
        let ledger = InventoryLedger::new(store);
        for line in &lines {
            ledger.release(line.item_id, line.quantity).await;
        }
    }

    log_audit(
        store,
        Some(user.user_id),
        "order_delete",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id, "status": order.status })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn confirm_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ConfirmOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let store = state.store.as_ref();

    if let Some(owner) = payload.user_id {
        if owner != user.user_id && !user.is_admin() {
            return Err(AppError::Forbidden);
        }
        ensure_user_exists(store, owner).await?;
    }

    let order = load_for_transition(store, user, id).await?;
    ensure_owner_or_admin(user, order.user_id)?;
    let next = next_status(&order, Transition::Confirm)?;

    let items = store.list_order_items(id).await?;
    if items.is_empty() {
        return Err(AppError::PreconditionFailed("order invalid".into()));
    }

    let patch = OrderPatch {
        user_id: payload.user_id,
        ..OrderPatch::status(next)
    };
    let order = commit_transition(store, user, &order, Transition::Confirm, patch).await?;

    Ok(ApiResponse::success(
        "Order confirmed",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

pub async fn mark_paid(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: MarkPaidRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let store = state.store.as_ref();

    let order = load_for_transition(store, user, id).await?;
    let next = next_status(&order, Transition::MarkPaid)?;
    if payload.billable_amount_paid < Decimal::ZERO {
        return Err(AppError::InvalidRequest("invalid payment amount".into()));
    }

    let patch = OrderPatch {
        billable_amount_paid: Some(payload.billable_amount_paid),
        ..OrderPatch::status(next)
    };
    let order = commit_transition(store, user, &order, Transition::MarkPaid, patch).await?;

    Ok(ApiResponse::success("Order paid", order, Some(Meta::empty())))
}

pub async fn mark_shipped(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: MarkShippedRequest,
) -> AppResult<ApiResponse<ShippedOrder>> {
    ensure_admin(user)?;
    require_field("shipping_name", &payload.shipping_name)?;
    require_field("tracking_id", &payload.tracking_id)?;
    let store = state.store.as_ref();

    let order = load_for_transition(store, user, id).await?;
    let next = next_status(&order, Transition::MarkShipped)?;

    let shipping_id = Uuid::new_v4();
    let patch = OrderPatch {
        shipping_id: Some(shipping_id),
        ..OrderPatch::status(next)
    };
    let order = commit_transition(store, user, &order, Transition::MarkShipped, patch).await?;

    let shipping_details = match store
        .create_shipping_details(NewShippingDetails {
            id: shipping_id,
            order_id: id,
            user_id: user.user_id,
            shipping_name: payload.shipping_name,
            tracking_id: payload.tracking_id,
            shipping_date: payload.shipping_date,
        })
        .await
    {
        Ok(record) => Some(record),
        Err(err) => {
            record_sub_record_drift(store, id, "shipping_details", shipping_id, &err).await;
            None
        }
    };

    Ok(ApiResponse::success(
        "Order shipped",
        ShippedOrder {
            order,
            shipping_details,
        },
        Some(Meta::empty()),
    ))
}

pub async fn mark_delivered(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: MarkDeliveredRequest,
) -> AppResult<ApiResponse<DeliveredOrder>> {
    ensure_admin(user)?;
    require_field("delivery_person_name", &payload.delivery_person_name)?;
    require_field("tracking_id", &payload.tracking_id)?;
    let store = state.store.as_ref();

    let order = load_for_transition(store, user, id).await?;
    let next = next_status(&order, Transition::MarkDelivered)?;

    let delivery_id = Uuid::new_v4();
    let patch = OrderPatch {
        delivery_id: Some(delivery_id),
        ..OrderPatch::status(next)
    };
    let order = commit_transition(store, user, &order, Transition::MarkDelivered, patch).await?;

    let delivery_details = match store
        .create_delivery_details(NewDeliveryDetails {
            id: delivery_id,
            order_id: id,
            user_id: user.user_id,
            delivery_person_name: payload.delivery_person_name,
            tracking_id: payload.tracking_id,
            delivery_date: payload.delivery_date,
        })
        .await
    {
        Ok(record) => Some(record),
        Err(err) => {
            record_sub_record_drift(store, id, "delivery_details", delivery_id, &err).await;
            None
        }
    };

    Ok(ApiResponse::success(
        "Order delivered",
        DeliveredOrder {
            order,
            delivery_details,
        },
        Some(Meta::empty()),
    ))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CancelOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    require_field("cancellation_reason", &payload.cancellation_reason)?;
    let store = state.store.as_ref();

    let order = load_for_transition(store, user, id).await?;
    ensure_owner_or_admin(user, order.user_id)?;
    let next = next_status(&order, Transition::Cancel)?;

    let patch = OrderPatch {
        cancellation_reason: Some(Some(payload.cancellation_reason)),
        ..OrderPatch::status(next)
    };
    let order = commit_transition(store, user, &order, Transition::Cancel, patch).await?;

    Ok(ApiResponse::success("Order cancelled", order, Some(Meta::empty())))
}

pub async fn restore_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let store = state.store.as_ref();

    let order = load_for_transition(store, user, id).await?;
    let next = next_status(&order, Transition::Restore)?;

    let patch = OrderPatch {
        cancellation_reason: Some(None),
        ..OrderPatch::status(next)
    };
    let order = commit_transition(store, user, &order, Transition::Restore, patch).await?;

    Ok(ApiResponse::success("Order restored", order, Some(Meta::empty())))
}

/// Recomputes `billable_amount` from the order's current lines and writes
/// it back. Repairs drift left behind by partially applied sequences.
pub async fn reconcile_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Reconciliation>> {
    ensure_admin(user)?;
    let store = state.store.as_ref();

    let order = store.find_order(id).await?.ok_or(AppError::NotFound)?;
    let items = store.list_order_items(id).await?;
    let expected: Decimal = items.iter().map(|line| line.billable_amount).sum();
    let previous_amount = order.billable_amount;
    let drift = expected - previous_amount;

    let order = if drift.is_zero() {
        order
    } else {
        tracing::warn!(order_id = %id, %previous_amount, %expected, "repairing order total");
        if store.set_order_total(id, expected).await? == 0 {
            return Err(AppError::NotFound);
        }
        log_audit(
            store,
            Some(user.user_id),
            "order_reconcile",
            Some("orders"),
            Some(serde_json::json!({
                "order_id": id,
                "previous_amount": previous_amount,
                "billable_amount": expected,
            })),
        )
        .await;
        store.find_order(id).await?.ok_or(AppError::NotFound)?
    };

    Ok(ApiResponse::success(
        "Order reconciled",
        Reconciliation {
            order,
            items,
            previous_amount,
            drift,
        },
        Some(Meta::empty()),
    ))
}

/// A shipment link survives cancel and restore, the current status does not.
fn has_left_warehouse(order: &Order) -> bool {
    order.shipping_id.is_some() || order.status.has_dispatched()
}

async fn ensure_user_exists(store: &dyn OrderStore, user_id: Uuid) -> AppResult<()> {
    match store.find_user(user_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound),
    }
}

async fn load_for_transition(
    store: &dyn OrderStore,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<Order> {
    ensure_user_exists(store, user.user_id).await?;
    store.find_order(id).await?.ok_or(AppError::NotFound)
}

fn next_status(order: &Order, transition: Transition) -> AppResult<OrderStatus> {
    order
        .status
        .apply(transition)
        .map_err(|reason| AppError::PreconditionFailed(reason.into()))
}

fn require_field(name: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidRequest(format!("{name} is required")));
    }
    Ok(())
}

/// Writes the transition only if the order still has the status it was
/// validated against, then returns the stored row.
async fn commit_transition(
    store: &dyn OrderStore,
    user: &AuthUser,
    order: &Order,
    transition: Transition,
    patch: OrderPatch,
) -> AppResult<Order> {
    let next = patch.status;
    if store.update_order_fields(order.id, order.status, patch).await? == 0 {
        return match store.find_order(order.id).await? {
            None => Err(AppError::NotFound),
            Some(_) => Err(AppError::PreconditionFailed(
                "order status changed concurrently".into(),
            )),
        };
    }

    tracing::info!(order_id = %order.id, from = %order.status, to = %next, "order status changed");
    log_audit(
        store,
        Some(user.user_id),
        transition.action(),
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "from": order.status, "to": next })),
    )
    .await;

    store.find_order(order.id).await?.ok_or(AppError::NotFound)
}

async fn record_sub_record_drift(
    store: &dyn OrderStore,
    order_id: Uuid,
    resource: &str,
    record_id: Uuid,
    err: &AppError,
) {
    tracing::warn!(%order_id, resource, %record_id, error = %err, "sub-record insert failed");
    log_audit(
        store,
        None,
        "sub_record_drift",
        Some(resource),
        Some(serde_json::json!({
            "order_id": order_id,
            "record_id": record_id,
            "detail": err.to_string(),
        })),
    )
    .await;
}
