//! Order approval workflow - admin decisions on pending orders.
//!
//! Approval flips the order's transaction entries to approved and moves the
//! order to `Completed`. Rejection refunds the full order total to the
//! resident's balance, removes the order's pending entries, and records the
//! reason; stock reserved at checkout is deliberately not returned. Deletion
//! is allowed only for resolved orders and removes the order together with
//! any entries still referencing it. Every decision pushes a notification to
//! the resident and records an audit entry, all inside one transaction.

use crate::{
    core::{
        audit::{self, AuditActor, AuditEntry},
        checkout::{ORDER_COMPLETED, ORDER_PENDING, ORDER_REJECTED},
        notification::push_notification,
        user::update_voucher_balance_atomic,
    },
    entities::{Order, OrderItem, TransactionEntry, order, order_item, transaction_entry},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use serde_json::json;

/// An order together with its snapshotted line items.
#[derive(Debug, serde::Serialize)]
pub struct OrderView {
    /// The order itself
    #[serde(flatten)]
    pub order: order::Model,
    /// Line items captured at checkout time
    pub items: Vec<order_item::Model>,
}

/// Lists orders with their items, newest first, optionally filtered by status.
pub async fn get_orders(
    db: &DatabaseConnection,
    status: Option<&str>,
) -> Result<Vec<OrderView>> {
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }

    let orders = query
        .find_with_related(OrderItem)
        .order_by_desc(order::Column::Date)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;

    Ok(orders
        .into_iter()
        .map(|(order, items)| OrderView { order, items })
        .collect())
}

/// Approves a pending order.
///
/// Marks the order's transaction entries approved and the order `Completed`,
/// then notifies the resident and records the decision. The status change is
/// a conditional update filtered on `Pending`, so two admins racing on the
/// same order resolve to one success and one `AlreadyProcessed`.
///
/// # Errors
/// Returns `NotFound` for an unknown order and `AlreadyProcessed` if the
/// order is no longer pending.
pub async fn approve_order(
    db: &DatabaseConnection,
    actor: &AuditActor,
    order_id: i64,
) -> Result<order::Model> {
    let txn = db.begin().await?;

    let before = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound { entity: "Order" })?;

    let updated = Order::update_many()
        .col_expr(order::Column::Status, Expr::value(ORDER_COMPLETED))
        .filter(order::Column::Id.eq(order_id))
        .filter(order::Column::Status.eq(ORDER_PENDING))
        .exec(&txn)
        .await?;

    if updated.rows_affected == 0 {
        return Err(Error::AlreadyProcessed {
            message: "Transaction has already been approved or processed".to_string(),
        });
    }

    TransactionEntry::update_many()
        .col_expr(transaction_entry::Column::IsApproved, Expr::value(true))
        .filter(transaction_entry::Column::OrderId.eq(order_id))
        .filter(transaction_entry::Column::IsApproved.eq(false))
        .exec(&txn)
        .await?;

    push_notification(
        &txn,
        before.user_id,
        Some(order_id),
        "Your product request has been approved.",
        None,
        None,
    )
    .await?;

    let after = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound { entity: "Order" })?;

    audit::record(
        &txn,
        AuditEntry {
            action_type: audit::ACTION_ORDER_APPROVED,
            action_category: audit::CATEGORY_ORDER,
            admin_id: actor.admin_id,
            description: format!(
                "Approved order {} for {} (total {:.2})",
                order_id, before.username, before.total_price
            ),
            metadata: json!({ "orderId": order_id, "userId": before.user_id }),
            before_state: serde_json::to_value(&before)?,
            after_state: serde_json::to_value(&after)?,
            ip_address: actor.ip_address.clone(),
            session_id: actor.session_id.clone(),
        },
    )
    .await?;

    txn.commit().await?;
    Ok(after)
}

/// Rejects a pending order, refunding the full total to the resident.
///
/// The refund is an atomic balance increment. The order's pending transaction
/// entries are removed so the rejected purchase never shows up in history,
/// and the resident is notified with the refund amount and the reason. Stock
/// is not restocked.
///
/// # Errors
/// Returns `NotFound` for an unknown order and `InvalidState` if the order is
/// not pending.
pub async fn reject_order(
    db: &DatabaseConnection,
    actor: &AuditActor,
    order_id: i64,
    reason: Option<String>,
) -> Result<order::Model> {
    let txn = db.begin().await?;

    let before = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound { entity: "Order" })?;

    if before.status != ORDER_PENDING {
        return Err(Error::InvalidState {
            message: format!("Cannot reject an order with status {}", before.status),
        });
    }

    update_voucher_balance_atomic(&txn, before.user_id, before.total_price).await?;

    TransactionEntry::delete_many()
        .filter(transaction_entry::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;

    let reason_text = reason.unwrap_or_else(|| "No reason provided".to_string());

    let mut active: order::ActiveModel = before.clone().into();
    active.status = sea_orm::Set(ORDER_REJECTED.to_string());
    active.rejection_description = sea_orm::Set(Some(reason_text.clone()));
    let after = active.update(&txn).await?;

    push_notification(
        &txn,
        before.user_id,
        Some(order_id),
        "Your product request has been rejected.",
        Some(format!(
            "{:.2} voucher credit has been refunded. Reason: {reason_text}",
            before.total_price
        )),
        Some(before.total_price),
    )
    .await?;

    audit::record(
        &txn,
        AuditEntry {
            action_type: audit::ACTION_ORDER_REJECTED,
            action_category: audit::CATEGORY_ORDER,
            admin_id: actor.admin_id,
            description: format!(
                "Rejected order {} for {} (refunded {:.2})",
                order_id, before.username, before.total_price
            ),
            metadata: json!({
                "orderId": order_id,
                "userId": before.user_id,
                "reason": reason_text,
            }),
            before_state: serde_json::to_value(&before)?,
            after_state: serde_json::to_value(&after)?,
            ip_address: actor.ip_address.clone(),
            session_id: actor.session_id.clone(),
        },
    )
    .await?;

    txn.commit().await?;
    Ok(after)
}

/// Hard-deletes a resolved order together with any transaction entries still
/// referencing it.
///
/// Pending orders hold a balance debit and reserved stock, so they must be
/// approved or rejected first; deleting one would strand the compensation.
///
/// # Errors
/// Returns `NotFound` for an unknown order and `InvalidState` for a pending
/// order.
pub async fn delete_order(
    db: &DatabaseConnection,
    actor: &AuditActor,
    order_id: i64,
) -> Result<order::Model> {
    let txn = db.begin().await?;

    let existing = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound { entity: "Order" })?;

    if existing.status == ORDER_PENDING {
        return Err(Error::InvalidState {
            message: "Pending orders must be approved or rejected before deletion".to_string(),
        });
    }

    TransactionEntry::delete_many()
        .filter(transaction_entry::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;

    OrderItem::delete_many()
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;

    existing.clone().delete(&txn).await?;

    audit::record(
        &txn,
        AuditEntry {
            action_type: audit::ACTION_ORDER_DELETED,
            action_category: audit::CATEGORY_ORDER,
            admin_id: actor.admin_id,
            description: format!("Deleted order {} for {}", order_id, existing.username),
            metadata: json!({ "orderId": order_id, "userId": existing.user_id }),
            before_state: serde_json::to_value(&existing)?,
            after_state: json!({}),
            ip_address: actor.ip_address.clone(),
            session_id: actor.session_id.clone(),
        },
    )
    .await?;

    txn.commit().await?;
    Ok(existing)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{checkout, user::get_user_by_id},
        test_utils::*,
    };

    #[tokio::test]
    async fn test_approve_order_flips_entries_and_status() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "admin").await?;
        let (resident, _product, order) = setup_with_pending_order(&db).await?;

        let approved = approve_order(&db, &AuditActor::bare(admin.id), order.id).await?;
        assert_eq!(approved.status, checkout::ORDER_COMPLETED);

        let history = checkout::transaction_history(&db, resident.id).await?;
        assert!(history.pending_transactions.is_empty());
        assert_eq!(history.approved_transactions.len(), 1);

        // The resident was notified
        let notifications =
            crate::core::notification::get_notifications(&db, resident.id).await?;
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].message,
            "Your product request has been approved."
        );

        // The decision landed in the audit trail, attributed to the admin
        let page = audit::query_logs(&db, audit::AuditQuery::default()).await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.logs[0].action_type, audit::ACTION_ORDER_APPROVED);
        assert_eq!(page.logs[0].admin_id, admin.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_approve_order_twice_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "admin").await?;
        let (_resident, _product, order) = setup_with_pending_order(&db).await?;

        approve_order(&db, &AuditActor::bare(admin.id), order.id).await?;
        let result = approve_order(&db, &AuditActor::bare(admin.id), order.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::AlreadyProcessed { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_reject_order_refunds_exactly_once() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "admin").await?;
        let (resident, product, order) = setup_with_pending_order(&db).await?;

        let balance_after_checkout = get_user_by_id(&db, resident.id)
            .await?
            .unwrap()
            .voucher_balance;

        let rejected = reject_order(
            &db,
            &AuditActor::bare(admin.id),
            order.id,
            Some("Item is out of season".to_string()),
        )
        .await?;
        assert_eq!(rejected.status, checkout::ORDER_REJECTED);
        assert_eq!(
            rejected.rejection_description.as_deref(),
            Some("Item is out of season")
        );

        // Refunded exactly the order total; stock stays decremented
        let account = get_user_by_id(&db, resident.id).await?.unwrap();
        assert_eq!(
            account.voucher_balance,
            balance_after_checkout + order.total_price
        );
        let product = crate::core::catalog::get_product_by_id(&db, product.id)
            .await?
            .unwrap();
        assert_eq!(product.quantity, 4);

        // Pending entries were removed
        let history = checkout::transaction_history(&db, resident.id).await?;
        assert!(history.pending_transactions.is_empty());
        assert!(history.approved_transactions.is_empty());

        // The rejection was audited
        let page = audit::query_logs(&db, audit::AuditQuery::default()).await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.logs[0].action_type, audit::ACTION_ORDER_REJECTED);

        // Second rejection is refused, so no double refund
        let result = reject_order(&db, &AuditActor::bare(admin.id), order.id, None).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidState { .. }));
        let account = get_user_by_id(&db, resident.id).await?.unwrap();
        assert_eq!(
            account.voucher_balance,
            balance_after_checkout + order.total_price
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_order_requires_resolution() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "admin").await?;
        let (resident, _product, order) = setup_with_pending_order(&db).await?;

        let result = delete_order(&db, &AuditActor::bare(admin.id), order.id).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidState { .. }));

        approve_order(&db, &AuditActor::bare(admin.id), order.id).await?;
        delete_order(&db, &AuditActor::bare(admin.id), order.id).await?;

        assert!(get_orders(&db, None).await?.is_empty());
        let history = checkout::all_entries_for_user(&db, resident.id).await?;
        assert!(history.is_empty());

        let result = delete_order(&db, &AuditActor::bare(admin.id), order.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_orders_status_filter() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "admin").await?;
        let (_resident, _product, order) = setup_with_pending_order(&db).await?;

        let pending = get_orders(&db, Some(checkout::ORDER_PENDING)).await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].items.len(), 1);

        approve_order(&db, &AuditActor::bare(admin.id), order.id).await?;
        assert!(get_orders(&db, Some(checkout::ORDER_PENDING)).await?.is_empty());
        assert_eq!(get_orders(&db, Some(checkout::ORDER_COMPLETED)).await?.len(), 1);

        Ok(())
    }
}
