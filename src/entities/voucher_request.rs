//! Voucher request entity - A resident's application for additional balance.
//!
//! The requester's username and balance are snapshotted at submission time.
//! Status is monotonic once resolved: approve and reject both refuse to touch
//! an already-resolved request.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Voucher request database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "voucher_requests")]
pub struct Model {
    /// Unique identifier for the request
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Resident who submitted the request
    pub user_id: i64,
    /// Voucher option the request is drawn against
    pub voucher_option_id: i64,
    /// Amount of voucher credit requested
    pub requested_amount: f64,
    /// `"Pending"`, `"Approved"`, or `"Rejected"`
    pub status: String,
    /// Resident-supplied justification
    pub reason: Option<String>,
    /// Note attached by the admin on approval or rejection
    pub admin_note: Option<String>,
    /// Requester's username at submission time
    pub username: String,
    /// Requester's voucher balance at submission time
    pub voucher_balance: f64,
    /// When the request was submitted
    pub request_date: DateTimeUtc,
}

/// Defines relationships between VoucherRequest and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each request belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Each request references one voucher option
    #[sea_orm(
        belongs_to = "super::voucher_option::Entity",
        from = "Column::VoucherOptionId",
        to = "super::voucher_option::Column::Id"
    )]
    VoucherOption,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::voucher_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VoucherOption.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
