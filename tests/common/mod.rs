#![allow(dead_code)]

use chrono::Utc;
use order_desk::{
    dto::orders::{AddItemRequest, CreateOrderRequest},
    middleware::auth::AuthUser,
    models::{Item, Order, OrderItem, User},
    services::{order_item_service, order_service},
    state::AppState,
    store::{MemoryStore, OrderStore},
};
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct Fixture {
    pub store: MemoryStore,
    pub state: AppState,
    pub admin: AuthUser,
    pub customer: AuthUser,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let admin = insert_user(&store, "admin").await;
        let customer = insert_user(&store, "user").await;
        Self {
            state: AppState::new(store.clone()),
            store,
            admin,
            customer,
        }
    }

    pub async fn item(&self, price: i64, gst: i64, stock: i32) -> Item {
        let item = Item {
            id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            name: format!("Coin {}", Uuid::new_v4()),
            description: Some("Silver".into()),
            year: Some(1947),
            sku: Some("COIN-TEST".into()),
            image_url: None,
            price: Decimal::from(price),
            gst: Decimal::from(gst),
            stock,
            sold: 0,
            created_at: Utc::now(),
        };
        self.store.insert_item(item.clone()).await;
        item
    }

    pub async fn stored_item(&self, id: Uuid) -> Item {
        self.store
            .find_item(id)
            .await
            .expect("find item")
            .expect("item exists")
    }

    pub async fn stored_order(&self, id: Uuid) -> Order {
        self.store
            .find_order(id)
            .await
            .expect("find order")
            .expect("order exists")
    }

    pub async fn lines(&self, order_id: Uuid) -> Vec<OrderItem> {
        self.store
            .list_order_items(order_id)
            .await
            .expect("list order items")
    }

    pub async fn cart(&self, owner: Option<Uuid>) -> Order {
        order_service::create_order(&self.state, CreateOrderRequest { user_id: owner })
            .await
            .expect("create order")
            .data
            .expect("order data")
    }

    pub async fn add(&self, order_id: Uuid, item_id: Uuid, quantity: i32) -> OrderItem {
        order_item_service::add_item(
            &self.state,
            &self.customer,
            AddItemRequest {
                order_id,
                item_id,
                quantity,
            },
        )
        .await
        .expect("add item")
        .data
        .expect("order item data")
    }
}

pub async fn insert_user(store: &MemoryStore, role: &str) -> AuthUser {
    let id = Uuid::new_v4();
    store
        .insert_user(User {
            id,
            username: format!("{role}-{id}"),
            email: format!("{id}@example.com"),
            password_hash: "dummy".into(),
            role: role.into(),
            created_at: Utc::now(),
        })
        .await;
    AuthUser {
        user_id: id,
        role: role.into(),
    }
}
