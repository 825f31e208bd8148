//! Catalog business logic - product management and inventory reporting.
//!
//! Provides product CRUD with input validation, name search, and the
//! inventory summary shown on the admin dashboard. Stock mutation during
//! checkout lives in the checkout workflow, not here.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Fields accepted when creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Unique product name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Unit price in voucher credit
    pub price: f64,
    /// Initial stock
    pub quantity: i32,
    /// Category for grouping
    pub category: String,
    /// Optional colour attribute
    pub colour: Option<String>,
    /// Optional size attribute
    pub size: Option<String>,
    /// Optional image URL
    pub image_url: Option<String>,
}

/// Partial update applied to an existing product; `None` fields are left as-is.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New unit price
    pub price: Option<f64>,
    /// New stock level
    pub quantity: Option<i32>,
}

/// Aggregate view of the catalog for the admin dashboard.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct InventorySummary {
    /// Number of distinct products
    pub total_products: u64,
    /// Sum of stock across all products
    pub total_quantity: i64,
    /// Sum of price x stock across all products
    pub total_value: f64,
}

/// Retrieves all products, ordered alphabetically by name.
pub async fn get_all_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by exact name.
pub async fn get_product_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Case-insensitive substring search over product names.
pub async fn search_products(db: &DatabaseConnection, name: &str) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::Name.contains(name))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product, enforcing a unique name, positive price, and
/// non-negative stock.
///
/// # Errors
/// Returns a validation error if any required field is empty, the price is
/// not a positive finite number, the quantity is negative, or the name is
/// already taken.
pub async fn create_product(db: &DatabaseConnection, new: NewProduct) -> Result<product::Model> {
    if new.name.trim().is_empty() || new.description.trim().is_empty() || new.category.is_empty() {
        return Err(Error::Validation {
            message: "Name, description, price, quantity, and category are required".to_string(),
        });
    }

    if new.price <= 0.0 || !new.price.is_finite() {
        return Err(Error::Validation {
            message: "Price must be a positive number".to_string(),
        });
    }

    if new.quantity < 0 {
        return Err(Error::Validation {
            message: "Quantity must be a non-negative integer".to_string(),
        });
    }

    let existing = get_product_by_name(db, new.name.trim()).await?;
    if existing.is_some() {
        return Err(Error::Validation {
            message: "Product with this name already exists".to_string(),
        });
    }

    let model = product::ActiveModel {
        name: Set(new.name.trim().to_string()),
        description: Set(new.description),
        price: Set(new.price),
        quantity: Set(new.quantity),
        category: Set(new.category),
        colour: Set(new.colour),
        size: Set(new.size),
        image_url: Set(new.image_url),
        auction: Set(false),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Applies a partial update to a product, returning (before, after) models
/// for the audit trail.
///
/// # Errors
/// Returns `NotFound` if the product does not exist, or a validation error
/// for a non-positive price or negative quantity.
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    update: ProductUpdate,
) -> Result<(product::Model, product::Model)> {
    let before = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "Product" })?;

    if let Some(price) = update.price {
        if price <= 0.0 || !price.is_finite() {
            return Err(Error::Validation {
                message: "Price must be a positive number".to_string(),
            });
        }
    }
    if let Some(quantity) = update.quantity {
        if quantity < 0 {
            return Err(Error::Validation {
                message: "Quantity must be a non-negative integer".to_string(),
            });
        }
    }

    let mut active: product::ActiveModel = before.clone().into();
    if let Some(name) = update.name {
        active.name = Set(name);
    }
    if let Some(description) = update.description {
        active.description = Set(description);
    }
    if let Some(category) = update.category {
        active.category = Set(category);
    }
    if let Some(price) = update.price {
        active.price = Set(price);
    }
    if let Some(quantity) = update.quantity {
        active.quantity = Set(quantity);
    }

    let after = active.update(db).await?;
    Ok((before, after))
}

/// Hard-deletes a product, returning the deleted model for the audit trail.
///
/// # Errors
/// Returns `NotFound` if the product does not exist.
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let existing = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "Product" })?;

    existing.clone().delete(db).await?;
    Ok(existing)
}

/// Computes product count, total stock, and total stock value.
pub async fn inventory_summary(db: &DatabaseConnection) -> Result<InventorySummary> {
    let products = Product::find().all(db).await?;

    let total_products = products.len() as u64;
    let total_quantity = products.iter().map(|p| i64::from(p.quantity)).sum();
    let total_value = products
        .iter()
        .map(|p| p.price * f64::from(p.quantity))
        .sum();

    Ok(InventorySummary {
        total_products,
        total_quantity,
        total_value,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = setup_test_db().await?;

        // Empty name
        let result = create_product(
            &db,
            NewProduct {
                name: "   ".to_string(),
                ..test_new_product("x", 5.0, 10)
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        // Non-positive price
        let result = create_product(&db, test_new_product("Rice", 0.0, 10)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_product(&db, test_new_product("Rice", f64::NAN, 10)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        // Negative stock
        let result = create_product(&db, test_new_product("Rice", 5.0, -1)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_unique_name() -> Result<()> {
        let db = setup_test_db().await?;

        create_product(&db, test_new_product("Rice", 5.0, 10)).await?;
        let result = create_product(&db, test_new_product("Rice", 6.0, 3)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_returns_before_and_after() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_product(&db, test_new_product("Rice", 5.0, 10)).await?;

        let (before, after) = update_product(
            &db,
            product.id,
            ProductUpdate {
                price: Some(7.5),
                quantity: Some(20),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(before.price, 5.0);
        assert_eq!(after.price, 7.5);
        assert_eq!(after.quantity, 20);
        assert_eq!(after.name, "Rice");

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_product(&db, test_new_product("Rice", 5.0, 10)).await?;

        let deleted = delete_product(&db, product.id).await?;
        assert_eq!(deleted.name, "Rice");
        assert!(get_product_by_id(&db, product.id).await?.is_none());

        let result = delete_product(&db, product.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_search_products() -> Result<()> {
        let db = setup_test_db().await?;
        create_product(&db, test_new_product("Brown Rice", 5.0, 10)).await?;
        create_product(&db, test_new_product("White Rice", 4.0, 10)).await?;
        create_product(&db, test_new_product("Beans", 3.0, 10)).await?;

        let hits = search_products(&db, "Rice").await?;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "Brown Rice");

        Ok(())
    }

    #[tokio::test]
    async fn test_inventory_summary() -> Result<()> {
        let db = setup_test_db().await?;
        create_product(&db, test_new_product("Rice", 5.0, 10)).await?;
        create_product(&db, test_new_product("Beans", 2.0, 4)).await?;

        let summary = inventory_summary(&db).await?;
        assert_eq!(summary.total_products, 2);
        assert_eq!(summary.total_quantity, 14);
        assert_eq!(summary.total_value, 58.0);

        Ok(())
    }
}
