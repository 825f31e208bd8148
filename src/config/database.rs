//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated with `Schema::create_table_from_entity`, so the database
//! schema always matches the entity definitions without hand-written SQL.

use crate::entities::{
    AuditLog, Notification, Order, OrderItem, Product, TransactionEntry, User, VoucherOption,
    VoucherRequest,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Establishes a connection to the `SQLite` database.
///
/// Uses the `DATABASE_URL` environment variable and falls back to a local
/// `SQLite` file if it is not set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/courtyard.sqlite?mode=rwc".to_string());

    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all application tables from the entity definitions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let statements = [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(VoucherOption),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(OrderItem),
        schema.create_table_from_entity(TransactionEntry),
        schema.create_table_from_entity(VoucherRequest),
        schema.create_table_from_entity(Notification),
        schema.create_table_from_entity(AuditLog),
    ];

    for statement in &statements {
        db.execute(builder.build(statement)).await?;
    }

    Ok(())
}
