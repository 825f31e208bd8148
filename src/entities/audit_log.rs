//! Audit log entity - Append-only record of admin actions.
//!
//! Every mutating admin operation writes one row capturing the acting admin
//! (derived from the verified token, never from request headers), a
//! human-readable description, free-form metadata, and before/after snapshots
//! of the touched state. There is no update or delete path.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit log database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    /// Unique identifier for the log entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Machine-readable action name (e.g., "PRODUCT_REQUEST_APPROVED")
    pub action_type: String,
    /// Grouping category (e.g., "ORDER_MANAGEMENT")
    pub action_category: String,
    /// Acting admin, from the verified token claims
    pub admin_id: i64,
    /// Human-readable summary of the action
    pub description: String,
    /// Free-form structured context for the action
    pub metadata: Json,
    /// State snapshot before the mutation
    pub before_state: Json,
    /// State snapshot after the mutation (empty object for deletions)
    pub after_state: Json,
    /// Client address the request arrived from, annotation only
    pub ip_address: Option<String>,
    /// Client-supplied session id, annotation only
    pub session_id: Option<String>,
    /// Outcome of the action, `"SUCCESS"` for recorded entries
    pub status: String,
    /// When the action happened
    pub timestamp: DateTimeUtc,
}

/// Defines relationships between AuditLog and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry references the acting admin
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AdminId",
        to = "super::user::Column::Id"
    )]
    Admin,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admin.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
