//! User entity - Represents resident and admin accounts.
//!
//! Each user has a unique email and username, a bcrypt credential hash, a role
//! (`"resident"` or `"admin"`), a voucher balance (meaningful for residents only),
//! and a suspension flag. Transaction history, voucher requests, and notifications
//! live in child tables keyed by `user_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Email address, unique across all accounts
    #[sea_orm(unique)]
    pub email: String,
    /// Display name, unique across all accounts
    #[sea_orm(unique)]
    pub username: String,
    /// Bcrypt hash of the account password, never returned by the API
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account role: `"resident"` or `"admin"`
    pub role: String,
    /// Spendable voucher credit, debited at checkout and credited on approvals
    pub voucher_balance: f64,
    /// Suspended accounts cannot log in
    pub suspended: bool,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    /// One user has many transaction-history entries
    #[sea_orm(has_many = "super::transaction_entry::Entity")]
    TransactionEntries,
    /// One user has many voucher requests
    #[sea_orm(has_many = "super::voucher_request::Entity")]
    VoucherRequests,
    /// One user has many notifications
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::transaction_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionEntries.def()
    }
}

impl Related<super::voucher_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VoucherRequests.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
