//! Notification entity - Messages appended to a resident's record by admin
//! decisions (order approval/rejection, voucher request outcomes).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Unique identifier for the notification
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Resident the notification is addressed to
    pub user_id: i64,
    /// Related order, when the notification concerns one
    pub order_id: Option<i64>,
    /// Short headline (e.g., "Your product request has been approved.")
    pub message: String,
    /// Longer detail text, including amounts and reasons
    pub description: Option<String>,
    /// Amount involved, for refund and voucher notifications
    pub amount: Option<f64>,
    /// Whether the resident has seen this notification
    pub is_read: bool,
    /// When the notification was created
    pub timestamp: DateTimeUtc,
}

/// Defines relationships between Notification and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each notification belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
