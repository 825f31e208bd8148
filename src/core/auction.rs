//! Auction workflow - converting products to auctions, bidding, and expiry.
//!
//! Listing live auctions is a pure read over products whose auction flag is
//! set and whose end date is still in the future. Clearing the flag on
//! expired auctions is a separate idempotent sweep, run both by a periodic
//! background task and before each listing, so reads never mutate state
//! themselves. Bids must strictly exceed the current highest bid and are
//! applied with a conditional update so two racing bidders resolve cleanly.

use crate::{
    core::audit::{self, AuditActor, AuditEntry},
    entities::{Product, User, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use serde_json::json;

/// A live auction as shown to residents.
#[derive(Debug, serde::Serialize)]
pub struct LiveAuction {
    /// Product id the auction runs on
    pub product_id: i64,
    /// Product name
    pub name: String,
    /// Product description
    pub description: String,
    /// Catalog price, informational alongside the bid
    pub price: f64,
    /// Category for grouping
    pub category: String,
    /// Optional image URL
    pub image_url: Option<String>,
    /// When bidding closes
    pub auction_end_date: DateTimeUtc,
    /// Current highest bid
    pub highest_bid: f64,
    /// Username of the current highest bidder, if anyone has bid
    pub highest_bidder: Option<String>,
}

/// Converts an existing product into an auction.
///
/// # Errors
/// Returns `NotFound` for an unknown product name, and `Validation` for an
/// end date in the past, a non-positive starting bid, or a product already
/// running as an auction.
pub async fn create_auction(
    db: &DatabaseConnection,
    actor: &AuditActor,
    product_name: &str,
    end_date: DateTimeUtc,
    starting_bid: f64,
) -> Result<product::Model> {
    if starting_bid <= 0.0 || !starting_bid.is_finite() {
        return Err(Error::Validation {
            message: "Starting bid must be a positive number".to_string(),
        });
    }
    if end_date <= chrono::Utc::now() {
        return Err(Error::Validation {
            message: "Auction end date must be in the future".to_string(),
        });
    }

    let before = Product::find()
        .filter(product::Column::Name.eq(product_name))
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "Product" })?;

    if before.auction {
        return Err(Error::Validation {
            message: "Product is already an auction".to_string(),
        });
    }

    let mut active: product::ActiveModel = before.clone().into();
    active.auction = Set(true);
    active.auction_end_date = Set(Some(end_date));
    active.highest_bid = Set(Some(starting_bid));
    active.highest_bidder = Set(None);
    let after = active.update(db).await?;

    audit::record(
        db,
        AuditEntry {
            action_type: audit::ACTION_AUCTION_CREATED,
            action_category: audit::CATEGORY_PRODUCT,
            admin_id: actor.admin_id,
            description: format!(
                "Created auction for {} (starting bid {:.2})",
                after.name, starting_bid
            ),
            metadata: json!({ "productId": after.id, "endDate": end_date }),
            before_state: serde_json::to_value(&before)?,
            after_state: serde_json::to_value(&after)?,
            ip_address: actor.ip_address.clone(),
            session_id: actor.session_id.clone(),
        },
    )
    .await?;

    Ok(after)
}

/// Clears the auction flag on every auction whose end date has passed,
/// returning the number of auctions closed. Safe to run repeatedly.
pub async fn deactivate_expired(db: &DatabaseConnection) -> Result<u64> {
    let result = Product::update_many()
        .col_expr(product::Column::Auction, Expr::value(false))
        .filter(product::Column::Auction.eq(true))
        .filter(product::Column::AuctionEndDate.lt(chrono::Utc::now()))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Lists auctions that are still open for bidding. Read-only: expired
/// auctions are excluded by the end-date filter even if the sweep has not
/// caught them yet.
pub async fn list_live_auctions(db: &DatabaseConnection) -> Result<Vec<LiveAuction>> {
    let now = chrono::Utc::now();
    let products = Product::find()
        .filter(product::Column::Auction.eq(true))
        .filter(product::Column::AuctionEndDate.gt(now))
        .order_by_asc(product::Column::AuctionEndDate)
        .all(db)
        .await?;

    Ok(products
        .into_iter()
        .filter_map(|p| {
            let auction_end_date = p.auction_end_date?;
            Some(LiveAuction {
                product_id: p.id,
                name: p.name,
                description: p.description,
                price: p.price,
                category: p.category,
                image_url: p.image_url,
                auction_end_date,
                highest_bid: p.highest_bid.unwrap_or(0.0),
                highest_bidder: p.highest_bidder,
            })
        })
        .collect())
}

/// Places a bid on a live auction for a resident.
///
/// The write is conditional on `highest_bid < amount`, so when two bids race
/// only the strictly higher one lands and the other gets `BidTooLow`.
///
/// # Errors
/// Returns `NotFound` for an unknown resident or product, `Validation` if the
/// product is not a live auction or has ended, and `BidTooLow` if the amount
/// does not strictly exceed the current highest bid.
pub async fn place_bid(
    db: &DatabaseConnection,
    user_id: i64,
    product_id: i64,
    amount: f64,
) -> Result<product::Model> {
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::Validation {
            message: "Bid amount must be a positive number".to_string(),
        });
    }

    let bidder = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "User" })?;

    let product = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "Product" })?;

    let end_date = match (product.auction, product.auction_end_date) {
        (true, Some(end_date)) => end_date,
        _ => {
            return Err(Error::Validation {
                message: "Product is not an auction".to_string(),
            });
        }
    };
    if end_date <= chrono::Utc::now() {
        return Err(Error::Validation {
            message: "Auction has ended".to_string(),
        });
    }

    let updated = Product::update_many()
        .col_expr(product::Column::HighestBid, Expr::value(amount))
        .col_expr(
            product::Column::HighestBidder,
            Expr::value(bidder.username.clone()),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Auction.eq(true))
        .filter(product::Column::HighestBid.lt(amount))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        // Re-read for the current bid; a racing bidder may have raised it
        let current = Product::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound { entity: "Product" })?;
        return Err(Error::BidTooLow {
            highest_bid: current.highest_bid.unwrap_or(0.0),
        });
    }

    Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "Product" })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_auction_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "admin").await?;
        create_test_product(&db, "Lamp", 20.0, 1).await?;

        let future = chrono::Utc::now() + Duration::hours(1);
        let past = chrono::Utc::now() - Duration::hours(1);

        let result =
            create_auction(&db, &AuditActor::bare(admin.id), "Lamp", past, 5.0).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result =
            create_auction(&db, &AuditActor::bare(admin.id), "Lamp", future, 0.0).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result =
            create_auction(&db, &AuditActor::bare(admin.id), "Nope", future, 5.0).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        let auction =
            create_auction(&db, &AuditActor::bare(admin.id), "Lamp", future, 5.0).await?;
        assert!(auction.auction);
        assert_eq!(auction.highest_bid, Some(5.0));
        assert!(auction.highest_bidder.is_none());

        // Already an auction
        let result =
            create_auction(&db, &AuditActor::bare(admin.id), "Lamp", future, 5.0).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_place_bid_requires_strict_increase() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "admin").await?;
        let alice = create_test_resident(&db, "alice", 100.0).await?;
        let bob = create_test_resident(&db, "bob", 100.0).await?;
        let product = create_test_product(&db, "Lamp", 20.0, 1).await?;

        let future = chrono::Utc::now() + Duration::hours(1);
        create_auction(&db, &AuditActor::bare(admin.id), "Lamp", future, 5.0).await?;

        // Equal to the current bid is refused
        let result = place_bid(&db, alice.id, product.id, 5.0).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::BidTooLow { highest_bid: 5.0 }
        ));

        let updated = place_bid(&db, alice.id, product.id, 6.0).await?;
        assert_eq!(updated.highest_bid, Some(6.0));
        assert_eq!(updated.highest_bidder.as_deref(), Some("alice"));

        // A lower later bid leaves the winner unchanged
        let result = place_bid(&db, bob.id, product.id, 5.5).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::BidTooLow { highest_bid: 6.0 }
        ));
        let current = crate::core::catalog::get_product_by_id(&db, product.id)
            .await?
            .unwrap();
        assert_eq!(current.highest_bidder.as_deref(), Some("alice"));

        let updated = place_bid(&db, bob.id, product.id, 7.0).await?;
        assert_eq!(updated.highest_bidder.as_deref(), Some("bob"));

        Ok(())
    }

    #[tokio::test]
    async fn test_bid_on_non_auction_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_resident(&db, "alice", 100.0).await?;
        let product = create_test_product(&db, "Lamp", 20.0, 1).await?;

        let result = place_bid(&db, alice.id, product.id, 5.0).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_expired_auctions_excluded_and_swept() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "admin").await?;
        let alice = create_test_resident(&db, "alice", 100.0).await?;
        create_test_product(&db, "Lamp", 20.0, 1).await?;
        create_test_product(&db, "Chair", 30.0, 1).await?;

        let soon = chrono::Utc::now() + Duration::milliseconds(50);
        let later = chrono::Utc::now() + Duration::hours(1);
        let lamp =
            create_auction(&db, &AuditActor::bare(admin.id), "Lamp", soon, 5.0).await?;
        create_auction(&db, &AuditActor::bare(admin.id), "Chair", later, 5.0).await?;

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;

        // The expired auction is excluded from the listing before any sweep
        let live = list_live_auctions(&db).await?;
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].name, "Chair");

        // Bidding on the expired auction is refused
        let result = place_bid(&db, alice.id, lamp.id, 10.0).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        // The sweep clears the flag exactly once
        assert_eq!(deactivate_expired(&db).await?, 1);
        assert_eq!(deactivate_expired(&db).await?, 0);

        let lamp = crate::core::catalog::get_product_by_id(&db, lamp.id)
            .await?
            .unwrap();
        assert!(!lamp.auction);

        Ok(())
    }
}
