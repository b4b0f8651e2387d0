use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{DeliveryDetails, Order, OrderItem, ShippingDetails};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Orders may start anonymous and get an owner on confirmation.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ConfirmOrderRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkPaidRequest {
    pub billable_amount_paid: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkShippedRequest {
    pub shipping_name: String,
    pub tracking_id: String,
    pub shipping_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkDeliveredRequest {
    pub delivery_person_name: String,
    pub tracking_id: String,
    pub delivery_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub cancellation_reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShippedOrder {
    pub order: Order,
    /// `None` when the order moved to `shipped` but the record insert failed.
    pub shipping_details: Option<ShippingDetails>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveredOrder {
    pub order: Order,
    pub delivery_details: Option<DeliveryDetails>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Reconciliation {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub previous_amount: Decimal,
    /// Line total minus the stored total before repair; zero when consistent.
    pub drift: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
