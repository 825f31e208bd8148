//! Transaction-history entry entity - One row per purchased line item or
//! voucher request on a resident's record.
//!
//! Entries created at checkout carry `order_id`; entries created by a voucher
//! request carry `voucher_request_id` instead. `is_approved` starts false and
//! flips true exactly once, when the corresponding admin approval lands.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction-history entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Resident this entry belongs to
    pub user_id: i64,
    /// Originating order, if this entry came from a checkout
    pub order_id: Option<i64>,
    /// Originating voucher request, if this entry came from a balance request
    pub voucher_request_id: Option<i64>,
    /// Product or voucher-option referenced by this entry
    pub item_id: i64,
    /// Item name at creation time
    pub item_name: String,
    /// Units requested
    pub quantity: i32,
    /// Computed total (unit price x quantity, or the requested voucher amount)
    pub total_price: f64,
    /// False until the admin approves the originating request
    pub is_approved: bool,
    /// When the entry was created
    pub transaction_date: DateTimeUtc,
}

/// Defines relationships between TransactionEntry and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Entries from checkouts reference an order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
