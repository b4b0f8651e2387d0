pub mod auth_service;
pub mod inventory;
pub mod order_item_service;
pub mod order_service;
