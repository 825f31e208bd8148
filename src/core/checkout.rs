//! Order workflow - cart checkout and transaction history.
//!
//! Checkout validates every cart line, then performs all of its mutations
//! (stock decrements, balance debit, order + line item + history inserts)
//! inside one database transaction. A failure at any step rolls everything
//! back, so a cart that cannot be fully honored leaves no trace. Stock is
//! reserved at checkout time, before admin approval; a later rejection
//! refunds the balance but deliberately does not restock.

use crate::{
    core::user::debit_voucher_balance,
    entities::{
        Product, TransactionEntry, order, order_item, product, transaction_entry, user::Model as UserModel,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Order status: awaiting admin decision
pub const ORDER_PENDING: &str = "Pending";
/// Order status: approved by an admin
pub const ORDER_COMPLETED: &str = "Completed";
/// Order status: rejected by an admin, balance refunded
pub const ORDER_REJECTED: &str = "Rejected";

/// One line of a resident's cart.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CartLine {
    /// Product to purchase
    pub product_id: i64,
    /// Units requested
    pub quantity: i32,
}

/// Everything produced by a successful checkout.
#[derive(Debug, serde::Serialize)]
pub struct CheckoutReceipt {
    /// The created order, status `"Pending"`
    pub order: order::Model,
    /// Snapshotted line items
    pub items: Vec<order_item::Model>,
    /// Total debited from the resident's balance
    pub total_price: f64,
    /// The resident's full transaction history after the checkout
    pub transaction_history: Vec<transaction_entry::Model>,
}

/// Transaction history split by approval state.
#[derive(Debug, serde::Serialize)]
pub struct TransactionHistory {
    /// Entries not yet approved
    pub pending_transactions: Vec<transaction_entry::Model>,
    /// Entries whose originating request was approved
    pub approved_transactions: Vec<transaction_entry::Model>,
}

/// Runs the checkout workflow for a resident's cart.
///
/// Validates that every product exists and has sufficient stock and that the
/// resident's balance covers the cart total, then decrements each product's
/// stock with a conditional `quantity = quantity - n WHERE quantity >= n`
/// update, debits the balance the same way, and records the `Pending` order
/// with one unapproved transaction-history entry per line. All of it commits
/// or rolls back as a unit.
///
/// # Errors
/// - `Validation` for an empty cart or non-positive quantity
/// - `NotFound` if the resident or any product is missing
/// - `InsufficientStock` if any line exceeds current stock
/// - `InsufficientBalance` if the cart total exceeds the balance
pub async fn checkout(
    db: &DatabaseConnection,
    user_id: i64,
    lines: &[CartLine],
) -> Result<CheckoutReceipt> {
    if lines.is_empty() {
        return Err(Error::Validation {
            message: "No items in the cart".to_string(),
        });
    }
    if lines.iter().any(|line| line.quantity <= 0) {
        return Err(Error::Validation {
            message: "Item quantity must be a positive integer".to_string(),
        });
    }

    let txn = db.begin().await?;

    let resident = crate::entities::User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound { entity: "User" })?;

    // First pass: validate every line and price the cart before mutating anything
    let mut total_price = 0.0;
    let mut snapshots: Vec<(product::Model, i32)> = Vec::with_capacity(lines.len());
    for line in lines {
        let product = Product::find_by_id(line.product_id)
            .one(&txn)
            .await?
            .ok_or(Error::NotFound { entity: "Product" })?;

        if product.quantity < line.quantity {
            return Err(Error::InsufficientStock {
                product: product.name,
            });
        }

        total_price += product.price * f64::from(line.quantity);
        snapshots.push((product, line.quantity));
    }

    if resident.voucher_balance < total_price {
        return Err(Error::InsufficientBalance {
            balance: resident.voucher_balance,
            required: total_price,
        });
    }

    // Second pass: conditional decrements; a zero affected-row count means a
    // concurrent checkout took the stock between our read and this write.
    for (product, quantity) in &snapshots {
        decrement_stock(&txn, product, *quantity).await?;
    }

    debit_voucher_balance(&txn, user_id, total_price).await?;

    let now = chrono::Utc::now();
    let order = order::ActiveModel {
        user_id: Set(user_id),
        username: Set(resident.username.clone()),
        total_price: Set(total_price),
        status: Set(ORDER_PENDING.to_string()),
        rejection_description: Set(None),
        date: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(snapshots.len());
    for (product, quantity) in &snapshots {
        let item = order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(product.id),
            name: Set(product.name.clone()),
            price: Set(product.price),
            category: Set(product.category.clone()),
            quantity: Set(*quantity),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);

        transaction_entry::ActiveModel {
            user_id: Set(user_id),
            order_id: Set(Some(order.id)),
            voucher_request_id: Set(None),
            item_id: Set(product.id),
            item_name: Set(product.name.clone()),
            quantity: Set(*quantity),
            total_price: Set(product.price * f64::from(*quantity)),
            is_approved: Set(false),
            transaction_date: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    let transaction_history = all_entries_for_user(db, user_id).await?;

    Ok(CheckoutReceipt {
        order,
        items,
        total_price,
        transaction_history,
    })
}

async fn decrement_stock<C>(db: &C, product: &product::Model, quantity: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    let updated = Product::update_many()
        .col_expr(
            product::Column::Quantity,
            Expr::col(product::Column::Quantity).sub(quantity),
        )
        .filter(product::Column::Id.eq(product.id))
        .filter(product::Column::Quantity.gte(quantity))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(Error::InsufficientStock {
            product: product.name.clone(),
        });
    }

    Ok(())
}

/// Retrieves a resident's full transaction history, newest first.
pub async fn all_entries_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<transaction_entry::Model>> {
    TransactionEntry::find()
        .filter(transaction_entry::Column::UserId.eq(user_id))
        .order_by_desc(transaction_entry::Column::TransactionDate)
        .order_by_desc(transaction_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a resident's transaction history split into pending and
/// approved entries.
///
/// # Errors
/// Returns `NotFound` if the resident does not exist.
pub async fn transaction_history(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<TransactionHistory> {
    let _resident: UserModel = crate::entities::User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "User" })?;

    let entries = all_entries_for_user(db, user_id).await?;
    let (approved_transactions, pending_transactions) =
        entries.into_iter().partition(|entry| entry.is_approved);

    Ok(TransactionHistory {
        pending_transactions,
        approved_transactions,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::catalog, core::user::get_user_by_id, test_utils::*};

    #[tokio::test]
    async fn test_checkout_empty_cart_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let resident = create_test_resident(&db, "alice", 100.0).await?;

        let result = checkout(&db, resident.id, &[]).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_missing_product_fails_whole_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let resident = create_test_resident(&db, "alice", 100.0).await?;
        let product = create_test_product(&db, "Rice", 5.0, 10).await?;

        let lines = [
            CartLine {
                product_id: product.id,
                quantity: 1,
            },
            CartLine {
                product_id: 999,
                quantity: 1,
            },
        ];
        let result = checkout(&db, resident.id, &lines).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        // Nothing was mutated
        let product = catalog::get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(product.quantity, 10);
        let account = get_user_by_id(&db, resident.id).await?.unwrap();
        assert_eq!(account.voucher_balance, 100.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_insufficient_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let resident = create_test_resident(&db, "alice", 100.0).await?;
        let product = create_test_product(&db, "Rice", 5.0, 2).await?;

        let lines = [CartLine {
            product_id: product.id,
            quantity: 3,
        }];
        let result = checkout(&db, resident.id, &lines).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientStock { .. }
        ));

        let product = catalog::get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(product.quantity, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_insufficient_balance_mutates_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let resident = create_test_resident(&db, "alice", 9.0).await?;
        let product = create_test_product(&db, "Rice", 5.0, 10).await?;

        let lines = [CartLine {
            product_id: product.id,
            quantity: 2,
        }];
        let result = checkout(&db, resident.id, &lines).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientBalance {
                balance: 9.0,
                required: 10.0
            }
        ));

        let product = catalog::get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(product.quantity, 10);
        let account = get_user_by_id(&db, resident.id).await?.unwrap();
        assert_eq!(account.voucher_balance, 9.0);
        let history = all_entries_for_user(&db, resident.id).await?;
        assert!(history.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_success_debits_and_decrements() -> Result<()> {
        let db = setup_test_db().await?;
        let resident = create_test_resident(&db, "alice", 100.0).await?;
        let rice = create_test_product(&db, "Rice", 5.0, 10).await?;
        let beans = create_test_product(&db, "Beans", 2.5, 4).await?;

        let lines = [
            CartLine {
                product_id: rice.id,
                quantity: 2,
            },
            CartLine {
                product_id: beans.id,
                quantity: 4,
            },
        ];
        let receipt = checkout(&db, resident.id, &lines).await?;

        assert_eq!(receipt.total_price, 20.0);
        assert_eq!(receipt.order.status, ORDER_PENDING);
        assert_eq!(receipt.order.username, "alice");
        assert_eq!(receipt.items.len(), 2);

        // Balance debited by exactly the total
        let account = get_user_by_id(&db, resident.id).await?.unwrap();
        assert_eq!(account.voucher_balance, 80.0);

        // Stock decremented per line
        let rice = catalog::get_product_by_id(&db, rice.id).await?.unwrap();
        assert_eq!(rice.quantity, 8);
        let beans = catalog::get_product_by_id(&db, beans.id).await?.unwrap();
        assert_eq!(beans.quantity, 0);

        // One unapproved entry per line item
        let history = all_entries_for_user(&db, resident.id).await?;
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|entry| !entry.is_approved));
        assert!(
            history
                .iter()
                .all(|entry| entry.order_id == Some(receipt.order.id))
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_exact_balance_scenario() -> Result<()> {
        // Resident with balance 100 checks out one unit priced 100, stock 5
        let db = setup_test_db().await?;
        let resident = create_test_resident(&db, "alice", 100.0).await?;
        let product = create_test_product(&db, "Heater", 100.0, 5).await?;

        let lines = [CartLine {
            product_id: product.id,
            quantity: 1,
        }];
        let receipt = checkout(&db, resident.id, &lines).await?;

        assert_eq!(receipt.order.status, ORDER_PENDING);
        let account = get_user_by_id(&db, resident.id).await?.unwrap();
        assert_eq!(account.voucher_balance, 0.0);
        let product = catalog::get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(product.quantity, 4);

        Ok(())
    }

    #[tokio::test]
    async fn test_transaction_history_split() -> Result<()> {
        let db = setup_test_db().await?;
        let (resident, _product, _order) = setup_with_pending_order(&db).await?;

        let history = transaction_history(&db, resident.id).await?;
        assert_eq!(history.pending_transactions.len(), 1);
        assert!(history.approved_transactions.is_empty());

        let result = transaction_history(&db, 999).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }
}
