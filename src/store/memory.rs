use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    lifecycle::OrderStatus,
    models::{DeliveryDetails, Item, Order, OrderItem, ShippingDetails, User},
    store::{NewDeliveryDetails, NewOrderItem, NewShippingDetails, NewUser, OrderPatch, OrderStore},
};

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    items: HashMap<Uuid, Item>,
    orders: HashMap<Uuid, Order>,
    order_items: HashMap<Uuid, OrderItem>,
    shipping: HashMap<Uuid, ShippingDetails>,
    delivery: HashMap<Uuid, DeliveryDetails>,
    audit: Vec<AuditEntry>,
}

/// In-process store. Each call holds the table lock for its whole body, so
/// every method is atomic the way a single-row SQL statement is.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.lock().await.users.insert(user.id, user);
    }

    pub async fn insert_item(&self, item: Item) {
        self.tables.lock().await.items.insert(item.id, item);
    }

    /// Overwrites an item's counters, bypassing the ledger. Stands in for
    /// manual edits made directly against the catalog.
    pub async fn set_item_counters(&self, id: Uuid, stock: i32, sold: i32) -> bool {
        let mut tables = self.tables.lock().await;
        match tables.items.get_mut(&id) {
            Some(item) => {
                item.stock = stock;
                item.sold = sold;
                true
            }
            None => false,
        }
    }

    pub async fn shipping_details(&self, id: Uuid) -> Option<ShippingDetails> {
        self.tables.lock().await.shipping.get(&id).cloned()
    }

    pub async fn delivery_details(&self, id: Uuid) -> Option<DeliveryDetails> {
        self.tables.lock().await.delivery.get(&id).cloned()
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.tables.lock().await.audit.clone()
    }
}

/// Same width as the `VARCHAR(255)` name columns of the record tables.
const NAME_MAX_CHARS: usize = 255;

/// Constraints Postgres enforces on shipping and delivery inserts.
fn check_record_insert(
    tables: &Tables,
    order_id: Uuid,
    column: &str,
    name: &str,
) -> AppResult<()> {
    if !tables.orders.contains_key(&order_id) {
        return Err(AppError::Internal(anyhow!(
            "foreign key violation: order {order_id}"
        )));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(AppError::Internal(anyhow!(
            "value too long for {column} (max {NAME_MAX_CHARS})"
        )));
    }
    Ok(())
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Internal(anyhow!(
                "unique violation: users.email {}",
                user.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_item(&self, id: Uuid) -> AppResult<Option<Item>> {
        Ok(self.tables.lock().await.items.get(&id).cloned())
    }

    async fn create_order(&self, user_id: Option<Uuid>) -> AppResult<Order> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id,
            billable_amount: Decimal::ZERO,
            billable_amount_paid: Decimal::ZERO,
            shipping_id: None,
            delivery_id: None,
            status: OrderStatus::Pending,
            status_date: now,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn list_orders(
        &self,
        statuses: &[OrderStatus],
        newest_first: bool,
    ) -> AppResult<Vec<Order>> {
        let tables = self.tables.lock().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|order| statuses.is_empty() || statuses.contains(&order.status))
            .cloned()
            .collect();
        orders.sort_by_key(|order| order.updated_at);
        if newest_first {
            orders.reverse();
        }
        Ok(orders)
    }

    async fn delete_order(&self, id: Uuid) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        if tables.orders.remove(&id).is_none() {
            return Ok(0);
        }
        tables.order_items.retain(|_, line| line.order_id != id);
        tables.shipping.retain(|_, record| record.order_id != id);
        tables.delivery.retain(|_, record| record.order_id != id);
        Ok(1)
    }

    async fn list_order_items(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
        let tables = self.tables.lock().await;
        let mut lines: Vec<OrderItem> = tables
            .order_items
            .values()
            .filter(|line| line.order_id == order_id)
            .cloned()
            .collect();
        lines.sort_by_key(|line| line.created_at);
        Ok(lines)
    }

    async fn find_order_item(&self, order_id: Uuid, id: Uuid) -> AppResult<Option<OrderItem>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .order_items
            .get(&id)
            .filter(|line| line.order_id == order_id)
            .cloned())
    }

    async fn create_order_item(&self, item: NewOrderItem) -> AppResult<OrderItem> {
        let mut tables = self.tables.lock().await;
        if !tables.orders.contains_key(&item.order_id) {
            return Err(AppError::Internal(anyhow!(
                "foreign key violation: order {}",
                item.order_id
            )));
        }
        let line = OrderItem {
            id: Uuid::new_v4(),
            order_id: item.order_id,
            item_id: item.item_id,
            quantity: item.quantity,
            billable_amount: item.billable_amount,
            billable_amount_paid: Decimal::ZERO,
            order_item_status: "pending".into(),
            metadata: item.metadata,
            created_at: Utc::now(),
        };
        tables.order_items.insert(line.id, line.clone());
        Ok(line)
    }

    async fn delete_order_item(&self, order_id: Uuid, id: Uuid) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let belongs = tables
            .order_items
            .get(&id)
            .is_some_and(|line| line.order_id == order_id);
        if !belongs {
            return Ok(0);
        }
        tables.order_items.remove(&id);
        Ok(1)
    }

    async fn update_order_fields(
        &self,
        id: Uuid,
        expected: OrderStatus,
        patch: OrderPatch,
    ) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let Some(order) = tables.orders.get_mut(&id) else {
            return Ok(0);
        };
        if order.status != expected {
            return Ok(0);
        }
        let now = Utc::now();
        order.status = patch.status;
        order.status_date = now;
        order.updated_at = now;
        if let Some(user_id) = patch.user_id {
            order.user_id = Some(user_id);
        }
        if let Some(paid) = patch.billable_amount_paid {
            order.billable_amount_paid = paid;
        }
        if let Some(shipping_id) = patch.shipping_id {
            order.shipping_id = Some(shipping_id);
        }
        if let Some(delivery_id) = patch.delivery_id {
            order.delivery_id = Some(delivery_id);
        }
        if let Some(reason) = patch.cancellation_reason {
            order.cancellation_reason = reason;
        }
        Ok(1)
    }

    async fn adjust_order_total(&self, id: Uuid, delta: Decimal) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        match tables.orders.get_mut(&id) {
            Some(order) => {
                order.billable_amount += delta;
                order.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn set_order_total(&self, id: Uuid, amount: Decimal) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        match tables.orders.get_mut(&id) {
            Some(order) => {
                order.billable_amount = amount;
                order.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_item_counters(
        &self,
        id: Uuid,
        delta_stock: i32,
        delta_sold: i32,
    ) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let Some(item) = tables.items.get_mut(&id) else {
            return Ok(0);
        };
        if item.stock + delta_stock < 0 || item.sold + delta_sold < 0 {
            return Ok(0);
        }
        item.stock += delta_stock;
        item.sold += delta_sold;
        Ok(1)
    }

    async fn create_shipping_details(
        &self,
        details: NewShippingDetails,
    ) -> AppResult<ShippingDetails> {
        let mut tables = self.tables.lock().await;
        check_record_insert(
            &tables,
            details.order_id,
            "shipping_details.shipping_name",
            &details.shipping_name,
        )?;
        let record = ShippingDetails {
            id: details.id,
            order_id: details.order_id,
            user_id: details.user_id,
            shipping_name: details.shipping_name,
            tracking_id: details.tracking_id,
            shipping_date: details.shipping_date,
            created_at: Utc::now(),
        };
        tables.shipping.insert(record.id, record.clone());
        Ok(record)
    }

    async fn create_delivery_details(
        &self,
        details: NewDeliveryDetails,
    ) -> AppResult<DeliveryDetails> {
        let mut tables = self.tables.lock().await;
        check_record_insert(
            &tables,
            details.order_id,
            "delivery_details.delivery_person_name",
            &details.delivery_person_name,
        )?;
        let record = DeliveryDetails {
            id: details.id,
            order_id: details.order_id,
            user_id: details.user_id,
            delivery_person_name: details.delivery_person_name,
            tracking_id: details.tracking_id,
            delivery_date: details.delivery_date,
            created_at: Utc::now(),
        };
        tables.delivery.insert(record.id, record.clone());
        Ok(record)
    }

    async fn log_audit(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        resource: Option<&str>,
        metadata: Option<Value>,
    ) -> AppResult<()> {
        self.tables.lock().await.audit.push(AuditEntry {
            user_id,
            action: action.to_string(),
            resource: resource.map(str::to_string),
            metadata,
        });
        Ok(())
    }
}
