//! Audit trail - append-only records of admin actions with paginated queries.
//!
//! Every mutating admin operation records one entry naming the acting admin
//! (always taken from the verified token claims), with before/after snapshots
//! of the touched state. Entries are never updated or deleted.

use crate::{
    entities::{AuditLog, audit_log},
    errors::Result,
};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};

/// Actions on resident orders
pub const CATEGORY_ORDER: &str = "ORDER_MANAGEMENT";
/// Actions on voucher requests and grants
pub const CATEGORY_VOUCHER: &str = "VOUCHER_MANAGEMENT";
/// Actions on the product catalog and auctions
pub const CATEGORY_PRODUCT: &str = "PRODUCT_MANAGEMENT";
/// Actions on resident accounts
pub const CATEGORY_USER: &str = "USER_MANAGEMENT";

/// Order approved by an admin
pub const ACTION_ORDER_APPROVED: &str = "PRODUCT_REQUEST_APPROVED";
/// Order rejected with refund
pub const ACTION_ORDER_REJECTED: &str = "PRODUCT_REQUEST_REJECTED";
/// Completed or rejected order removed
pub const ACTION_ORDER_DELETED: &str = "ORDER_DELETED";
/// Voucher request approved and credited
pub const ACTION_VOUCHER_APPROVED: &str = "VOUCHER_REQUEST_APPROVED";
/// Voucher request rejected
pub const ACTION_VOUCHER_REJECTED: &str = "VOUCHER_REQUEST_REJECTED";
/// Balance granted directly to residents
pub const ACTION_VOUCHER_GRANTED: &str = "VOUCHER_GRANTED";
/// Product added to the catalog
pub const ACTION_PRODUCT_CREATED: &str = "PRODUCT_CREATED";
/// Product fields changed
pub const ACTION_PRODUCT_UPDATED: &str = "PRODUCT_UPDATED";
/// Product removed from the catalog
pub const ACTION_PRODUCT_DELETED: &str = "PRODUCT_DELETED";
/// Product converted into an auction
pub const ACTION_AUCTION_CREATED: &str = "AUCTION_CREATED";
/// Account created by an admin
pub const ACTION_USER_CREATED: &str = "USER_CREATED";
/// Resident account suspended or unsuspended
pub const ACTION_USER_SUSPENDED: &str = "USER_SUSPENSION_TOGGLED";
/// Resident password reset to the default
pub const ACTION_PASSWORD_RESET: &str = "PASSWORD_RESET";

/// The acting admin plus request annotations, passed into every admin
/// workflow by the API layer. The admin id comes from the verified token
/// claims; the annotations are client-supplied and informational only.
#[derive(Debug, Clone)]
pub struct AuditActor {
    /// Acting admin, from the verified token claims
    pub admin_id: i64,
    /// Client address annotation
    pub ip_address: Option<String>,
    /// Client-supplied session id annotation
    pub session_id: Option<String>,
}

impl AuditActor {
    /// Actor with no request annotations, for tests and background tasks.
    #[must_use]
    pub fn bare(admin_id: i64) -> Self {
        Self {
            admin_id,
            ip_address: None,
            session_id: None,
        }
    }
}

/// Everything an admin operation supplies when recording an audit entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// Machine-readable action name
    pub action_type: &'static str,
    /// Grouping category
    pub action_category: &'static str,
    /// Acting admin, from the verified token claims
    pub admin_id: i64,
    /// Human-readable summary
    pub description: String,
    /// Free-form structured context
    pub metadata: serde_json::Value,
    /// State before the mutation
    pub before_state: serde_json::Value,
    /// State after the mutation, empty object for deletions
    pub after_state: serde_json::Value,
    /// Client address annotation
    pub ip_address: Option<String>,
    /// Client-supplied session id annotation
    pub session_id: Option<String>,
}

/// Filters and paging for the audit log screen.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct AuditQuery {
    /// 1-based page number, defaults to the first page
    pub page: Option<u64>,
    /// Page size, defaults to 10
    pub limit: Option<u64>,
    /// Substring match over descriptions
    pub search: Option<String>,
    /// Exact status filter
    pub status: Option<String>,
    /// Exact action type filter
    pub action_type: Option<String>,
    /// Exact category filter
    pub action_category: Option<String>,
}

/// One page of audit log results.
#[derive(Debug, serde::Serialize)]
pub struct AuditPage {
    /// Matching entries, newest first
    pub logs: Vec<audit_log::Model>,
    /// Total matching entries across all pages
    pub total: u64,
    /// Number of pages at the requested page size
    pub total_pages: u64,
    /// The page returned
    pub current_page: u64,
}

/// Appends one audit entry. Generic over the connection so workflows can
/// record inside an open transaction.
pub async fn record<C>(db: &C, entry: AuditEntry) -> Result<audit_log::Model>
where
    C: ConnectionTrait,
{
    audit_log::ActiveModel {
        action_type: Set(entry.action_type.to_string()),
        action_category: Set(entry.action_category.to_string()),
        admin_id: Set(entry.admin_id),
        description: Set(entry.description),
        metadata: Set(entry.metadata),
        before_state: Set(entry.before_state),
        after_state: Set(entry.after_state),
        ip_address: Set(entry.ip_address),
        session_id: Set(entry.session_id),
        status: Set("SUCCESS".to_string()),
        timestamp: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Runs a filtered, paginated query over the audit log, newest entries first.
pub async fn query_logs(db: &DatabaseConnection, query: AuditQuery) -> Result<AuditPage> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let mut condition = Condition::all();
    if let Some(search) = query.search.filter(|s| !s.is_empty()) {
        condition = condition.add(audit_log::Column::Description.contains(&search));
    }
    if let Some(status) = query.status.filter(|s| !s.is_empty()) {
        condition = condition.add(audit_log::Column::Status.eq(status));
    }
    if let Some(action_type) = query.action_type.filter(|s| !s.is_empty()) {
        condition = condition.add(audit_log::Column::ActionType.eq(action_type));
    }
    if let Some(category) = query.action_category.filter(|s| !s.is_empty()) {
        condition = condition.add(audit_log::Column::ActionCategory.eq(category));
    }

    let paginator = AuditLog::find()
        .filter(condition)
        .order_by_desc(audit_log::Column::Timestamp)
        .order_by_desc(audit_log::Column::Id)
        .paginate(db, limit);

    let total = paginator.num_items().await?;
    let total_pages = total.div_ceil(limit);
    let logs = paginator.fetch_page(page - 1).await?;

    Ok(AuditPage {
        logs,
        total,
        total_pages,
        current_page: page,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;

    fn test_entry(admin_id: i64, action_type: &'static str, description: &str) -> AuditEntry {
        AuditEntry {
            action_type,
            action_category: CATEGORY_ORDER,
            admin_id,
            description: description.to_string(),
            metadata: json!({}),
            before_state: json!({}),
            after_state: json!({}),
            ip_address: None,
            session_id: None,
        }
    }

    #[tokio::test]
    async fn test_record_sets_status_and_timestamp() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "admin").await?;

        let entry = record(
            &db,
            test_entry(admin.id, ACTION_ORDER_APPROVED, "Approved order 1"),
        )
        .await?;

        assert_eq!(entry.status, "SUCCESS");
        assert_eq!(entry.admin_id, admin.id);
        assert_eq!(entry.action_type, ACTION_ORDER_APPROVED);

        Ok(())
    }

    #[tokio::test]
    async fn test_query_filters_and_pagination() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "admin").await?;

        for i in 0..12 {
            record(
                &db,
                test_entry(admin.id, ACTION_ORDER_APPROVED, &format!("Approved order {i}")),
            )
            .await?;
        }
        record(
            &db,
            test_entry(admin.id, ACTION_ORDER_REJECTED, "Rejected order 99"),
        )
        .await?;

        // Default page size is 10
        let page = query_logs(&db, AuditQuery::default()).await?;
        assert_eq!(page.total, 13);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.logs.len(), 10);
        assert_eq!(page.current_page, 1);

        // Action type filter
        let page = query_logs(
            &db,
            AuditQuery {
                action_type: Some(ACTION_ORDER_REJECTED.to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.logs[0].description, "Rejected order 99");

        // Description search
        let page = query_logs(
            &db,
            AuditQuery {
                search: Some("order 11".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(page.total, 1);

        Ok(())
    }
}
