//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod audit_log;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod product;
pub mod transaction_entry;
pub mod user;
pub mod voucher_option;
pub mod voucher_request;

// Re-export specific types to avoid conflicts
pub use audit_log::{Column as AuditLogColumn, Entity as AuditLog, Model as AuditLogModel};
pub use notification::{
    Column as NotificationColumn, Entity as Notification, Model as NotificationModel,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use transaction_entry::{
    Column as TransactionEntryColumn, Entity as TransactionEntry, Model as TransactionEntryModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use voucher_option::{
    Column as VoucherOptionColumn, Entity as VoucherOption, Model as VoucherOptionModel,
};
pub use voucher_request::{
    Column as VoucherRequestColumn, Entity as VoucherRequest, Model as VoucherRequestModel,
};
