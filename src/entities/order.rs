//! Order entity - A resident's checkout request awaiting admin decision.
//!
//! Status moves only `Pending -> Completed` or `Pending -> Rejected`. Line items
//! are snapshotted into the `order_items` table at checkout time and never
//! re-joined against the live catalog.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Resident who placed the order
    pub user_id: i64,
    /// Username copied at checkout time for display without a join
    pub username: String,
    /// Sum of unit price x quantity across all line items
    pub total_price: f64,
    /// `"Pending"`, `"Completed"`, or `"Rejected"`
    pub status: String,
    /// Admin-supplied reason, set when the order is rejected
    pub rejection_description: Option<String>,
    /// When the order was placed
    pub date: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One order has many snapshotted line items
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
