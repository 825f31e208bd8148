//! Notifications - per-resident messages written by admin decisions.
//!
//! Order approvals, rejections, and voucher request outcomes each push one
//! notification onto the affected resident's list. Residents read them
//! newest first and can mark the whole list as read.

use crate::{
    entities::{Notification, notification},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};

/// Appends a notification for a resident.
///
/// Generic over the connection so workflow code can push inside an open
/// database transaction.
pub async fn push_notification<C>(
    db: &C,
    user_id: i64,
    order_id: Option<i64>,
    message: &str,
    description: Option<String>,
    amount: Option<f64>,
) -> Result<notification::Model>
where
    C: ConnectionTrait,
{
    notification::ActiveModel {
        user_id: Set(user_id),
        order_id: Set(order_id),
        message: Set(message.to_string()),
        description: Set(description),
        amount: Set(amount),
        is_read: Set(false),
        timestamp: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Retrieves a resident's notifications, newest first.
pub async fn get_notifications(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<notification::Model>> {
    Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .order_by_desc(notification::Column::Timestamp)
        .order_by_desc(notification::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks every notification belonging to a resident as read, returning the
/// number of rows touched.
pub async fn mark_all_read(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    let result = Notification::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsRead.eq(false))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
