use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        AddItemRequest, CancelOrderRequest, ConfirmOrderRequest, CreateOrderRequest,
        DeliveredOrder, MarkDeliveredRequest, MarkPaidRequest, MarkShippedRequest, OrderWithItems,
        OrderList, Reconciliation, ShippedOrder,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{order_item_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/items", post(add_item))
        .route("/{id}", get(get_order).delete(delete_order))
        .route("/{order_id}/items/{order_item_id}", delete(remove_item))
        .route("/{id}/confirm", patch(confirm_order))
        .route("/{id}/pay", patch(mark_paid))
        .route("/{id}/ship", patch(mark_shipped))
        .route("/{id}/deliver", patch(mark_delivered))
        .route("/{id}/cancel", patch(cancel_order))
        .route("/{id}/restore", patch(restore_order))
        .route("/{id}/reconcile", post(reconcile_order))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(
        ("status" = Option<String>, Query, description = "Comma-separated statuses to keep"),
        ("sort_order" = Option<String>, Query, description = "Sort by last update: asc, desc (default)")
    ),
    responses(
        (status = 200, description = "Orders, most recently updated first", body = ApiResponse<OrderList>),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body(content = CreateOrderRequest, description = "Optional, an order may start anonymous"),
    responses(
        (status = 201, description = "Create an empty pending order", body = ApiResponse<Order>),
        (status = 404, description = "Referenced user does not exist"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Option<Json<CreateOrderRequest>>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let payload = payload.map(|Json(body)| body).unwrap_or_default();
    let resp = order_service::create_order(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its line items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = order_service::delete_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Line item added", body = ApiResponse<OrderItem>),
        (status = 400, description = "Invalid quantity"),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order or item not found"),
        (status = 409, description = "Order is no longer editable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Order Items"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<Json<ApiResponse<OrderItem>>> {
    let resp = order_item_service::add_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{order_id}/items/{order_item_id}",
    params(
        ("order_id" = Uuid, Path, description = "Order ID"),
        ("order_item_id" = Uuid, Path, description = "Order item ID"),
    ),
    responses(
        (status = 200, description = "Line item removed", body = ApiResponse<OrderItem>),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is no longer editable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Order Items"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((order_id, order_item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<OrderItem>>> {
    let resp = order_item_service::remove_item(&state, &user, order_id, order_item_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/confirm",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = ConfirmOrderRequest,
    responses(
        (status = 200, description = "Order booked", body = ApiResponse<OrderWithItems>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order cannot be confirmed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Order Lifecycle"
)]
pub async fn confirm_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::confirm_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/pay",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = MarkPaidRequest,
    responses(
        (status = 200, description = "Order paid", body = ApiResponse<Order>),
        (status = 400, description = "Invalid payment amount"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order must be booked"),
    ),
    security(("bearer_auth" = [])),
    tag = "Order Lifecycle"
)]
pub async fn mark_paid(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkPaidRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::mark_paid(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/ship",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = MarkShippedRequest,
    responses(
        (status = 200, description = "Order shipped", body = ApiResponse<ShippedOrder>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order must be paid"),
    ),
    security(("bearer_auth" = [])),
    tag = "Order Lifecycle"
)]
pub async fn mark_shipped(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkShippedRequest>,
) -> AppResult<Json<ApiResponse<ShippedOrder>>> {
    let resp = order_service::mark_shipped(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/deliver",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = MarkDeliveredRequest,
    responses(
        (status = 200, description = "Order delivered", body = ApiResponse<DeliveredOrder>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order must be shipped"),
    ),
    security(("bearer_auth" = [])),
    tag = "Order Lifecycle"
)]
pub async fn mark_delivered(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkDeliveredRequest>,
) -> AppResult<Json<ApiResponse<DeliveredOrder>>> {
    let resp = order_service::mark_delivered(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order already cancelled or delivered"),
    ),
    security(("bearer_auth" = [])),
    tag = "Order Lifecycle"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::cancel_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/restore",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order back to pending", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is not cancelled"),
    ),
    security(("bearer_auth" = [])),
    tag = "Order Lifecycle"
)]
pub async fn restore_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::restore_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/reconcile",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order total recomputed from its lines", body = ApiResponse<Reconciliation>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Order Lifecycle"
)]
pub async fn reconcile_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Reconciliation>>> {
    let resp = order_service::reconcile_order(&state, &user, id).await?;
    Ok(Json(resp))
}
