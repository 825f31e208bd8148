//! Voucher option entity - A named category of redeemable voucher credit.
//! Admin-managed, independent lifecycle from requests drawn against it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Voucher option database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "voucher_options")]
pub struct Model {
    /// Unique identifier for the option
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Option name (e.g., "Groceries", "Utilities")
    pub name: String,
    /// What the option covers
    pub description: String,
}

/// Defines relationships between VoucherOption and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One option backs many voucher requests
    #[sea_orm(has_many = "super::voucher_request::Entity")]
    VoucherRequests,
}

impl Related<super::voucher_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VoucherRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
