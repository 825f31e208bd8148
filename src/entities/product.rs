//! Product entity - Represents catalog items with stock and optional auction state.
//!
//! Stock is decremented at checkout time, before admin approval. The auction
//! sub-state (flag, end date, highest bid/bidder) lives directly on the product,
//! matching the flattened view residents see.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product name, unique across the catalog
    #[sea_orm(unique)]
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Unit price in voucher credit
    pub price: f64,
    /// Current stock on hand
    pub quantity: i32,
    /// Category for grouping (e.g., "groceries", "clothing")
    pub category: String,
    /// Optional colour attribute
    pub colour: Option<String>,
    /// Optional size attribute
    pub size: Option<String>,
    /// Optional product image URL
    pub image_url: Option<String>,
    /// Whether the product is currently up for auction
    pub auction: bool,
    /// When the auction closes, if one is active
    pub auction_end_date: Option<DateTimeUtc>,
    /// Current highest bid (starts at the admin-set starting bid)
    pub highest_bid: Option<f64>,
    /// Username of the current highest bidder
    pub highest_bidder: Option<String>,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product appears in many order line items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
