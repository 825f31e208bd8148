//! Shared helpers for unit tests: in-memory database setup and fixture
//! creation.

use crate::{
    config::database::create_tables,
    core::{
        catalog::{self, NewProduct},
        checkout::{self, CartLine},
        user::{self, ROLE_ADMIN, ROLE_RESIDENT},
    },
    entities::{order, product, user::Model as UserModel},
    errors::Result,
};
use sea_orm::{Database, DatabaseConnection};

/// Password used for every fixture account.
pub const TEST_PASSWORD: &str = "test-password";

/// Creates a fresh in-memory SQLite database with all tables.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(db)
}

/// Creates a resident account with the given starting balance.
pub async fn create_test_resident(
    db: &DatabaseConnection,
    username: &str,
    voucher_balance: f64,
) -> Result<UserModel> {
    user::create_user(
        db,
        format!("{username}@example.com"),
        username.to_string(),
        TEST_PASSWORD,
        ROLE_RESIDENT.to_string(),
        voucher_balance,
    )
    .await
}

/// Creates an admin account.
pub async fn create_test_admin(db: &DatabaseConnection, username: &str) -> Result<UserModel> {
    user::create_user(
        db,
        format!("{username}@example.com"),
        username.to_string(),
        TEST_PASSWORD,
        ROLE_ADMIN.to_string(),
        0.0,
    )
    .await
}

/// Builds a `NewProduct` with placeholder description and category.
#[must_use]
pub fn test_new_product(name: &str, price: f64, quantity: i32) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: format!("Test product {name}"),
        price,
        quantity,
        category: "General".to_string(),
        colour: None,
        size: None,
        image_url: None,
    }
}

/// Creates a product directly in the catalog.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    quantity: i32,
) -> Result<product::Model> {
    catalog::create_product(db, test_new_product(name, price, quantity)).await
}

/// Creates a resident "alice" with balance 100, a product "Rice" at 10.0 with
/// stock 5, and checks out one unit, leaving a pending order.
pub async fn setup_with_pending_order(
    db: &DatabaseConnection,
) -> Result<(UserModel, product::Model, order::Model)> {
    let resident = create_test_resident(db, "alice", 100.0).await?;
    let product = create_test_product(db, "Rice", 10.0, 5).await?;

    let receipt = checkout::checkout(
        db,
        resident.id,
        &[CartLine {
            product_id: product.id,
            quantity: 1,
        }],
    )
    .await?;

    Ok((resident, product, receipt.order))
}
