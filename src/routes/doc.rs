use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        orders::{
            AddItemRequest, CancelOrderRequest, ConfirmOrderRequest, CreateOrderRequest,
            DeliveredOrder, MarkDeliveredRequest, MarkPaidRequest, MarkShippedRequest,
            OrderList, OrderWithItems, Reconciliation, ShippedOrder,
        },
    },
    lifecycle::OrderStatus,
    models::{DeliveryDetails, Item, ItemSnapshot, Order, OrderItem, ShippingDetails, User},
    response::{ApiResponse, Meta},
    routes::{
        auth, health, orders,
        params::{OrderListQuery, SortOrder},
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::delete_order,
        orders::add_item,
        orders::remove_item,
        orders::confirm_order,
        orders::mark_paid,
        orders::mark_shipped,
        orders::mark_delivered,
        orders::cancel_order,
        orders::restore_order,
        orders::reconcile_order
    ),
    components(
        schemas(
            User,
            Item,
            ItemSnapshot,
            Order,
            OrderItem,
            OrderStatus,
            ShippingDetails,
            DeliveryDetails,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateOrderRequest,
            AddItemRequest,
            ConfirmOrderRequest,
            MarkPaidRequest,
            MarkShippedRequest,
            MarkDeliveredRequest,
            CancelOrderRequest,
            OrderWithItems,
            OrderList,
            OrderListQuery,
            SortOrder,
            ShippedOrder,
            DeliveredOrder,
            Reconciliation,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderItem>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<ShippedOrder>,
            ApiResponse<DeliveredOrder>,
            ApiResponse<Reconciliation>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Order Items", description = "Cart line endpoints"),
        (name = "Order Lifecycle", description = "Order status transitions"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
