use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    entity::{
        audit_logs::ActiveModel as AuditActive,
        delivery_details::{ActiveModel as DeliveryActive, Model as DeliveryModel},
        items::{Column as ItemCol, Entity as Items, Model as ItemModel},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        shipping_details::{ActiveModel as ShippingActive, Model as ShippingModel},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    lifecycle::OrderStatus,
    models::{DeliveryDetails, Item, ItemSnapshot, Order, OrderItem, ShippingDetails, User},
    store::{NewDeliveryDetails, NewOrderItem, NewShippingDetails, NewUser, OrderPatch, OrderStore},
};

/// Postgres-backed store on top of SeaORM.
#[derive(Clone)]
pub struct SeaOrmStore {
    orm: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.orm
    }
}

#[async_trait]
impl OrderStore for SeaOrmStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(user_from_entity);
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = Users::find()
            .filter(UserCol::Email.eq(email))
            .one(&self.orm)
            .await?
            .map(user_from_entity);
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let user = UserActive {
            id: Set(Uuid::new_v4()),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role: Set(user.role),
            created_at: NotSet,
        }
        .insert(&self.orm)
        .await?;
        Ok(user_from_entity(user))
    }

    async fn find_item(&self, id: Uuid) -> AppResult<Option<Item>> {
        let item = Items::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(item_from_entity);
        Ok(item)
    }

    async fn create_order(&self, user_id: Option<Uuid>) -> AppResult<Order> {
        let order = OrderActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            billable_amount: Set(Decimal::ZERO),
            billable_amount_paid: Set(Decimal::ZERO),
            shipping_id: Set(None),
            delivery_id: Set(None),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            status_date: Set(Utc::now().into()),
            cancellation_reason: Set(None),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&self.orm)
        .await?;
        order_from_entity(order)
    }

    async fn find_order(&self, id: Uuid) -> AppResult<Option<Order>> {
        Orders::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(order_from_entity)
            .transpose()
    }

    async fn list_orders(
        &self,
        statuses: &[OrderStatus],
        newest_first: bool,
    ) -> AppResult<Vec<Order>> {
        let mut finder = Orders::find();
        if !statuses.is_empty() {
            finder = finder.filter(OrderCol::Status.is_in(statuses.iter().map(|s| s.as_str())));
        }
        finder = if newest_first {
            finder.order_by_desc(OrderCol::UpdatedAt)
        } else {
            finder.order_by_asc(OrderCol::UpdatedAt)
        };

        finder
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect()
    }

    async fn delete_order(&self, id: Uuid) -> AppResult<u64> {
        let result = Orders::delete_by_id(id).exec(&self.orm).await?;
        Ok(result.rows_affected)
    }

    async fn list_order_items(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
        OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order_id))
            .order_by_asc(OrderItemCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_item_from_entity)
            .collect()
    }

    async fn find_order_item(&self, order_id: Uuid, id: Uuid) -> AppResult<Option<OrderItem>> {
        OrderItems::find()
            .filter(
                Condition::all()
                    .add(OrderItemCol::OrderId.eq(order_id))
                    .add(OrderItemCol::Id.eq(id)),
            )
            .one(&self.orm)
            .await?
            .map(order_item_from_entity)
            .transpose()
    }

    async fn create_order_item(&self, item: NewOrderItem) -> AppResult<OrderItem> {
        let metadata =
            serde_json::to_value(&item.metadata).map_err(|e| AppError::Internal(e.into()))?;
        let model = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(item.order_id),
            item_id: Set(item.item_id),
            quantity: Set(item.quantity),
            billable_amount: Set(item.billable_amount),
            billable_amount_paid: Set(Decimal::ZERO),
            order_item_status: Set("pending".into()),
            metadata: Set(metadata),
            created_at: NotSet,
        }
        .insert(&self.orm)
        .await?;
        order_item_from_entity(model)
    }

    async fn delete_order_item(&self, order_id: Uuid, id: Uuid) -> AppResult<u64> {
        let result = OrderItems::delete_many()
            .filter(
                Condition::all()
                    .add(OrderItemCol::OrderId.eq(order_id))
                    .add(OrderItemCol::Id.eq(id)),
            )
            .exec(&self.orm)
            .await?;
        Ok(result.rows_affected)
    }

    async fn update_order_fields(
        &self,
        id: Uuid,
        expected: OrderStatus,
        patch: OrderPatch,
    ) -> AppResult<u64> {
        let now = Utc::now().fixed_offset();
        let mut update = Orders::update_many()
            .col_expr(OrderCol::Status, Expr::value(patch.status.as_str()))
            .col_expr(OrderCol::StatusDate, Expr::value(now))
            .col_expr(OrderCol::UpdatedAt, Expr::value(now));
        if let Some(user_id) = patch.user_id {
            update = update.col_expr(OrderCol::UserId, Expr::value(user_id));
        }
        if let Some(paid) = patch.billable_amount_paid {
            update = update.col_expr(OrderCol::BillableAmountPaid, Expr::value(paid));
        }
        if let Some(shipping_id) = patch.shipping_id {
            update = update.col_expr(OrderCol::ShippingId, Expr::value(shipping_id));
        }
        if let Some(delivery_id) = patch.delivery_id {
            update = update.col_expr(OrderCol::DeliveryId, Expr::value(delivery_id));
        }
        if let Some(reason) = patch.cancellation_reason {
            update = update.col_expr(OrderCol::CancellationReason, Expr::value(reason));
        }

        let result = update
            .filter(OrderCol::Id.eq(id))
            .filter(OrderCol::Status.eq(expected.as_str()))
            .exec(&self.orm)
            .await?;
        Ok(result.rows_affected)
    }

    async fn adjust_order_total(&self, id: Uuid, delta: Decimal) -> AppResult<u64> {
        let result = Orders::update_many()
            .col_expr(
                OrderCol::BillableAmount,
                Expr::col(OrderCol::BillableAmount).add(delta),
            )
            .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(OrderCol::Id.eq(id))
            .exec(&self.orm)
            .await?;
        Ok(result.rows_affected)
    }

    async fn set_order_total(&self, id: Uuid, amount: Decimal) -> AppResult<u64> {
        let result = Orders::update_many()
            .col_expr(OrderCol::BillableAmount, Expr::value(amount))
            .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(OrderCol::Id.eq(id))
            .exec(&self.orm)
            .await?;
        Ok(result.rows_affected)
    }

    async fn update_item_counters(
        &self,
        id: Uuid,
        delta_stock: i32,
        delta_sold: i32,
    ) -> AppResult<u64> {
        let result = Items::update_many()
            .col_expr(ItemCol::Stock, Expr::col(ItemCol::Stock).add(delta_stock))
            .col_expr(ItemCol::Sold, Expr::col(ItemCol::Sold).add(delta_sold))
            .filter(ItemCol::Id.eq(id))
            .filter(ItemCol::Stock.gte(-delta_stock))
            .filter(ItemCol::Sold.gte(-delta_sold))
            .exec(&self.orm)
            .await?;
        Ok(result.rows_affected)
    }

    async fn create_shipping_details(
        &self,
        details: NewShippingDetails,
    ) -> AppResult<ShippingDetails> {
        let model = ShippingActive {
            id: Set(details.id),
            order_id: Set(details.order_id),
            user_id: Set(details.user_id),
            shipping_name: Set(details.shipping_name),
            tracking_id: Set(details.tracking_id),
            shipping_date: Set(details.shipping_date.fixed_offset()),
            created_at: NotSet,
        }
        .insert(&self.orm)
        .await?;
        Ok(shipping_from_entity(model))
    }

    async fn create_delivery_details(
        &self,
        details: NewDeliveryDetails,
    ) -> AppResult<DeliveryDetails> {
        let model = DeliveryActive {
            id: Set(details.id),
            order_id: Set(details.order_id),
            user_id: Set(details.user_id),
            delivery_person_name: Set(details.delivery_person_name),
            tracking_id: Set(details.tracking_id),
            delivery_date: Set(details.delivery_date.fixed_offset()),
            created_at: NotSet,
        }
        .insert(&self.orm)
        .await?;
        Ok(delivery_from_entity(model))
    }

    async fn log_audit(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        resource: Option<&str>,
        metadata: Option<Value>,
    ) -> AppResult<()> {
        AuditActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            action: Set(action.to_string()),
            resource: Set(resource.map(str::to_string)),
            metadata: Set(metadata),
            created_at: NotSet,
        }
        .insert(&self.orm)
        .await?;
        Ok(())
    }
}

fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn item_from_entity(model: ItemModel) -> Item {
    Item {
        id: model.id,
        category_id: model.category_id,
        name: model.name,
        description: model.description,
        year: model.year,
        sku: model.sku,
        image_url: model.image_url,
        price: model.price,
        gst: model.gst,
        stock: model.stock,
        sold: model.sold,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let status = model
        .status
        .parse::<OrderStatus>()
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        billable_amount: model.billable_amount,
        billable_amount_paid: model.billable_amount_paid,
        shipping_id: model.shipping_id,
        delivery_id: model.delivery_id,
        status,
        status_date: model.status_date.with_timezone(&Utc),
        cancellation_reason: model.cancellation_reason,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> AppResult<OrderItem> {
    let metadata: ItemSnapshot =
        serde_json::from_value(model.metadata).map_err(|e| AppError::Internal(e.into()))?;
    Ok(OrderItem {
        id: model.id,
        order_id: model.order_id,
        item_id: model.item_id,
        quantity: model.quantity,
        billable_amount: model.billable_amount,
        billable_amount_paid: model.billable_amount_paid,
        order_item_status: model.order_item_status,
        metadata,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn shipping_from_entity(model: ShippingModel) -> ShippingDetails {
    ShippingDetails {
        id: model.id,
        order_id: model.order_id,
        user_id: model.user_id,
        shipping_name: model.shipping_name,
        tracking_id: model.tracking_id,
        shipping_date: model.shipping_date.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn delivery_from_entity(model: DeliveryModel) -> DeliveryDetails {
    DeliveryDetails {
        id: model.id,
        order_id: model.order_id,
        user_id: model.user_id,
        delivery_person_name: model.delivery_person_name,
        tracking_id: model.tracking_id,
        delivery_date: model.delivery_date.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
