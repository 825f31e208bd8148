//! Voucher request workflow - options catalog, submission, admin decisions,
//! and direct balance grants.
//!
//! A resident submits a request against one of the admin-defined voucher
//! options, snapshotting their username and balance at submission time.
//! Approval credits the requested amount atomically; rejection records the
//! reason without touching the balance. Both refuse an already-resolved
//! request, so a request can never be credited twice.

use crate::{
    core::{
        audit::{self, AuditActor, AuditEntry},
        notification::push_notification,
        user::{ROLE_RESIDENT, update_voucher_balance_atomic},
    },
    entities::{
        TransactionEntry, User, VoucherOption, VoucherRequest, transaction_entry, user,
        voucher_option, voucher_request,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde_json::json;

/// Request status: awaiting admin decision
pub const REQUEST_PENDING: &str = "Pending";
/// Request status: approved and credited
pub const REQUEST_APPROVED: &str = "Approved";
/// Request status: rejected without credit
pub const REQUEST_REJECTED: &str = "Rejected";

/// Note recorded on every approved request.
const APPROVAL_NOTE: &str = "Voucher request has been approved by admin.";

/// Pending requests belonging to one resident, for the admin review screen.
#[derive(Debug, serde::Serialize)]
pub struct ResidentRequests {
    /// The resident's id
    pub user_id: i64,
    /// The resident's username
    pub username: String,
    /// Their pending requests, oldest first
    pub requests: Vec<voucher_request::Model>,
}

/// Creates a voucher option, enforcing a unique name.
pub async fn create_option(
    db: &DatabaseConnection,
    name: &str,
    description: &str,
) -> Result<voucher_option::Model> {
    if name.trim().is_empty() || description.trim().is_empty() {
        return Err(Error::Validation {
            message: "Name and description are required".to_string(),
        });
    }

    let existing = VoucherOption::find()
        .filter(voucher_option::Column::Name.eq(name.trim()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::Validation {
            message: "Voucher option with this name already exists".to_string(),
        });
    }

    voucher_option::ActiveModel {
        name: Set(name.trim().to_string()),
        description: Set(description.trim().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Lists all voucher options, alphabetically.
pub async fn list_options(db: &DatabaseConnection) -> Result<Vec<voucher_option::Model>> {
    VoucherOption::find()
        .order_by_asc(voucher_option::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Submits a voucher request for a resident.
///
/// Snapshots the resident's username and current balance onto the request and
/// records a parallel unapproved transaction-history entry, both in one
/// transaction.
///
/// # Errors
/// Returns `Validation` for a non-positive amount and `NotFound` for an
/// unknown resident or option.
pub async fn submit_request(
    db: &DatabaseConnection,
    user_id: i64,
    voucher_option_id: i64,
    requested_amount: f64,
    reason: Option<String>,
) -> Result<voucher_request::Model> {
    if requested_amount <= 0.0 || !requested_amount.is_finite() {
        return Err(Error::Validation {
            message: "Requested amount must be a positive number".to_string(),
        });
    }

    let txn = db.begin().await?;

    let resident = User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound { entity: "User" })?;

    let option = VoucherOption::find_by_id(voucher_option_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Voucher option",
        })?;

    let now = chrono::Utc::now();
    let request = voucher_request::ActiveModel {
        user_id: Set(user_id),
        voucher_option_id: Set(option.id),
        requested_amount: Set(requested_amount),
        status: Set(REQUEST_PENDING.to_string()),
        reason: Set(reason),
        admin_note: Set(None),
        username: Set(resident.username.clone()),
        voucher_balance: Set(resident.voucher_balance),
        request_date: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    transaction_entry::ActiveModel {
        user_id: Set(user_id),
        order_id: Set(None),
        voucher_request_id: Set(Some(request.id)),
        item_id: Set(option.id),
        item_name: Set(option.name.clone()),
        quantity: Set(1),
        total_price: Set(requested_amount),
        is_approved: Set(false),
        transaction_date: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(request)
}

/// Lists a resident's own voucher requests, newest first.
pub async fn list_requests_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<voucher_request::Model>> {
    VoucherRequest::find()
        .filter(voucher_request::Column::UserId.eq(user_id))
        .order_by_desc(voucher_request::Column::RequestDate)
        .order_by_desc(voucher_request::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists all pending requests grouped per resident, for the admin review
/// screen.
pub async fn list_pending_requests(db: &DatabaseConnection) -> Result<Vec<ResidentRequests>> {
    let pending = VoucherRequest::find()
        .filter(voucher_request::Column::Status.eq(REQUEST_PENDING))
        .order_by_asc(voucher_request::Column::UserId)
        .order_by_asc(voucher_request::Column::Id)
        .all(db)
        .await?;

    let mut grouped: Vec<ResidentRequests> = Vec::new();
    for request in pending {
        match grouped.last_mut() {
            Some(group) if group.user_id == request.user_id => group.requests.push(request),
            _ => grouped.push(ResidentRequests {
                user_id: request.user_id,
                username: request.username.clone(),
                requests: vec![request],
            }),
        }
    }

    Ok(grouped)
}

/// Approves a pending voucher request, crediting the requested amount.
///
/// # Errors
/// Returns `NotFound` for an unknown request and `AlreadyProcessed` if the
/// request was already resolved.
pub async fn approve_request(
    db: &DatabaseConnection,
    actor: &AuditActor,
    request_id: i64,
) -> Result<voucher_request::Model> {
    let txn = db.begin().await?;

    let before = VoucherRequest::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Voucher request",
        })?;

    if before.status != REQUEST_PENDING {
        return Err(Error::AlreadyProcessed {
            message: "Voucher request has already been processed".to_string(),
        });
    }

    update_voucher_balance_atomic(&txn, before.user_id, before.requested_amount).await?;

    let mut active: voucher_request::ActiveModel = before.clone().into();
    active.status = Set(REQUEST_APPROVED.to_string());
    active.admin_note = Set(Some(APPROVAL_NOTE.to_string()));
    let after = active.update(&txn).await?;

    TransactionEntry::update_many()
        .col_expr(
            transaction_entry::Column::IsApproved,
            sea_orm::sea_query::Expr::value(true),
        )
        .filter(transaction_entry::Column::VoucherRequestId.eq(request_id))
        .exec(&txn)
        .await?;

    push_notification(
        &txn,
        before.user_id,
        None,
        "Your voucher request has been approved.",
        Some(format!(
            "{:.2} voucher credit has been added to your balance.",
            before.requested_amount
        )),
        Some(before.requested_amount),
    )
    .await?;

    audit::record(
        &txn,
        AuditEntry {
            action_type: audit::ACTION_VOUCHER_APPROVED,
            action_category: audit::CATEGORY_VOUCHER,
            admin_id: actor.admin_id,
            description: format!(
                "Approved voucher request {} for {} (amount {:.2})",
                request_id, before.username, before.requested_amount
            ),
            metadata: json!({ "requestId": request_id, "userId": before.user_id }),
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

/// Rejects a pending voucher request without crediting anything.
///
/// # Errors
/// Returns `NotFound` for an unknown request and `AlreadyProcessed` if the
/// request was already resolved.
pub async fn reject_request(
    db: &DatabaseConnection,
    actor: &AuditActor,
    request_id: i64,
    reason: Option<String>,
) -> Result<voucher_request::Model> {
    let txn = db.begin().await?;

    let before = VoucherRequest::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Voucher request",
        })?;

    if before.status != REQUEST_PENDING {
        return Err(Error::AlreadyProcessed {
            message: "Voucher request has already been processed".to_string(),
        });
    }

    let reason_text = reason.unwrap_or_else(|| "No reason provided".to_string());

    let mut active: voucher_request::ActiveModel = before.clone().into();
    active.status = Set(REQUEST_REJECTED.to_string());
    active.admin_note = Set(Some(reason_text.clone()));
    let after = active.update(&txn).await?;

    push_notification(
        &txn,
        before.user_id,
        None,
        "Your voucher request has been rejected.",
        Some(format!("Reason: {reason_text}")),
        None,
    )
    .await?;

    audit::record(
        &txn,
        AuditEntry {
            action_type: audit::ACTION_VOUCHER_REJECTED,
            action_category: audit::CATEGORY_VOUCHER,
            admin_id: actor.admin_id,
            description: format!(
                "Rejected voucher request {} for {}",
                request_id, before.username
            ),
            metadata: json!({
                "requestId": request_id,
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

/// Grants voucher credit directly to a set of residents.
///
/// Every listed account must exist and be a resident; the grant is
/// all-or-nothing. Each resident gets an atomic balance credit and a
/// notification, and one audit entry covers the whole grant.
///
/// # Errors
/// Returns `Validation` for an empty list or non-positive amount, `NotFound`
/// for an unknown account, and `Validation` for a non-resident account.
pub async fn grant_vouchers(
    db: &DatabaseConnection,
    actor: &AuditActor,
    user_ids: &[i64],
    amount: f64,
) -> Result<Vec<user::Model>> {
    if user_ids.is_empty() {
        return Err(Error::Validation {
            message: "At least one resident must be selected".to_string(),
        });
    }
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::Validation {
            message: "Grant amount must be a positive number".to_string(),
        });
    }

    let txn = db.begin().await?;

    let mut updated = Vec::with_capacity(user_ids.len());
    for &user_id in user_ids {
        let account = User::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or(Error::NotFound { entity: "User" })?;

        if account.role != ROLE_RESIDENT {
            return Err(Error::Validation {
                message: format!("{} is not a resident account", account.username),
            });
        }

        let after = update_voucher_balance_atomic(&txn, user_id, amount).await?;

        push_notification(
            &txn,
            user_id,
            None,
            "You have received a voucher grant.",
            Some(format!(
                "{amount:.2} voucher credit has been added to your balance."
            )),
            Some(amount),
        )
        .await?;

        updated.push(after);
    }

    audit::record(
        &txn,
        AuditEntry {
            action_type: audit::ACTION_VOUCHER_GRANTED,
            action_category: audit::CATEGORY_VOUCHER,
            admin_id: actor.admin_id,
            description: format!(
                "Granted {:.2} voucher credit to {} resident(s)",
                amount,
                user_ids.len()
            ),
            metadata: json!({ "userIds": user_ids, "amount": amount }),
            before_state: json!({}),
            after_state: json!({}),
            ip_address: actor.ip_address.clone(),
            session_id: actor.session_id.clone(),
        },
    )
    .await?;

    txn.commit().await?;
    Ok(updated)
}
