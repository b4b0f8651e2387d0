//! Persistence seam for the order aggregate.
//!
//! Every method is a single atomic row operation. Multi-step sequences
//! (line insert, order total, inventory) are composed by the services and
//! are not wrapped in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::AppResult,
    lifecycle::OrderStatus,
    models::{DeliveryDetails, Item, ItemSnapshot, Order, OrderItem, ShippingDetails, User},
};

pub mod memory;
pub mod sea;

pub use memory::MemoryStore;
pub use sea::SeaOrmStore;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub billable_amount: Decimal,
    pub metadata: ItemSnapshot,
}

/// Fields a status transition writes onto an order. `None` leaves the
/// column untouched. `status_date` and `updated_at` are always stamped.
#[derive(Debug, Clone)]
pub struct OrderPatch {
    pub status: OrderStatus,
    pub user_id: Option<Uuid>,
    pub billable_amount_paid: Option<Decimal>,
    pub shipping_id: Option<Uuid>,
    pub delivery_id: Option<Uuid>,
    /// `Some(None)` clears the stored reason.
    pub cancellation_reason: Option<Option<String>>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status,
            user_id: None,
            billable_amount_paid: None,
            shipping_id: None,
            delivery_id: None,
            cancellation_reason: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewShippingDetails {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub shipping_name: String,
    pub tracking_id: String,
    pub shipping_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDeliveryDetails {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub delivery_person_name: String,
    pub tracking_id: String,
    pub delivery_date: DateTime<Utc>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    async fn find_item(&self, id: Uuid) -> AppResult<Option<Item>>;

    async fn create_order(&self, user_id: Option<Uuid>) -> AppResult<Order>;

    async fn find_order(&self, id: Uuid) -> AppResult<Option<Order>>;

    /// Orders whose status is in `statuses` (all when empty), ordered by
    /// `updated_at`.
    async fn list_orders(
        &self,
        statuses: &[OrderStatus],
        newest_first: bool,
    ) -> AppResult<Vec<Order>>;

    /// Removes the order and, through the cascade, its line items and
    /// shipping/delivery records.
    async fn delete_order(&self, id: Uuid) -> AppResult<u64>;

    async fn list_order_items(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>>;

    async fn find_order_item(&self, order_id: Uuid, id: Uuid) -> AppResult<Option<OrderItem>>;

    async fn create_order_item(&self, item: NewOrderItem) -> AppResult<OrderItem>;

    async fn delete_order_item(&self, order_id: Uuid, id: Uuid) -> AppResult<u64>;

    /// Writes `patch` only while the order still has `expected` status.
    async fn update_order_fields(
        &self,
        id: Uuid,
        expected: OrderStatus,
        patch: OrderPatch,
    ) -> AppResult<u64>;

    /// `billable_amount = billable_amount + delta`, evaluated by the store.
    async fn adjust_order_total(&self, id: Uuid, delta: Decimal) -> AppResult<u64>;

    /// Overwrites `billable_amount`; used by reconciliation only.
    async fn set_order_total(&self, id: Uuid, amount: Decimal) -> AppResult<u64>;

    /// `stock += delta_stock, sold += delta_sold` in one conditional update
    /// that refuses to drive either counter below zero.
    async fn update_item_counters(
        &self,
        id: Uuid,
        delta_stock: i32,
        delta_sold: i32,
    ) -> AppResult<u64>;

    async fn create_shipping_details(
        &self,
        details: NewShippingDetails,
    ) -> AppResult<ShippingDetails>;

    async fn create_delivery_details(
        &self,
        details: NewDeliveryDetails,
    ) -> AppResult<DeliveryDetails>;

    async fn log_audit(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        resource: Option<&str>,
        metadata: Option<Value>,
    ) -> AppResult<()>;
}
