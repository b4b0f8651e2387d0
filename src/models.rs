use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::lifecycle::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub price: Decimal,
    /// Whole-number percent, `18` means 18%.
    pub gst: Decimal,
    pub stock: i32,
    pub sold: i32,
    pub created_at: DateTime<Utc>,
}

/// Copy of an item's descriptive fields taken when it was added to an order.
/// Later catalog edits never reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemSnapshot {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub stock: i32,
    pub sold: i32,
    pub price: Decimal,
    pub gst: Decimal,
}

impl From<&Item> for ItemSnapshot {
    fn from(item: &Item) -> Self {
        Self {
            category_id: item.category_id,
            name: item.name.clone(),
            description: item.description.clone(),
            year: item.year,
            sku: item.sku.clone(),
            image_url: item.image_url.clone(),
            stock: item.stock,
            sold: item.sold,
            price: item.price,
            gst: item.gst,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub billable_amount: Decimal,
    pub billable_amount_paid: Decimal,
    pub shipping_id: Option<Uuid>,
    pub delivery_id: Option<Uuid>,
    pub status: OrderStatus,
    pub status_date: DateTime<Utc>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub billable_amount: Decimal,
    pub billable_amount_paid: Decimal,
    pub order_item_status: String,
    pub metadata: ItemSnapshot,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShippingDetails {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub shipping_name: String,
    pub tracking_id: String,
    pub shipping_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryDetails {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub delivery_person_name: String,
    pub tracking_id: String,
    pub delivery_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
