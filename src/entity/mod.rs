pub mod audit_logs;
pub mod categories;
pub mod delivery_details;
pub mod items;
pub mod order_items;
pub mod orders;
pub mod shipping_details;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use delivery_details::Entity as DeliveryDetails;
pub use items::Entity as Items;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use shipping_details::Entity as ShippingDetails;
pub use users::Entity as Users;
