//! Admin-facing handlers: order decisions, voucher management, catalog CRUD,
//! auctions, account administration, and the audit log screen.
//!
//! Workflow modules that make multi-step decisions (approval, voucher,
//! auction) record their own audit entries inside their transactions; plain
//! catalog and account mutations are audited here at the handler level.

use crate::{
    api::{AppState, auth::AdminUser},
    core::{
        approval,
        audit::{self, AuditEntry},
        auction, catalog, user, voucher,
    },
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

/// Status filter for the order list.
#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    /// Exact status to filter on, all orders when absent
    pub status: Option<String>,
}

/// Order decision body, naming the order to act on.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDecisionPayload {
    /// Order the decision applies to
    pub order_id: i64,
    /// Reason, recorded on rejections
    pub description: Option<String>,
}

/// Voucher request decision body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherDecisionPayload {
    /// Request the decision applies to
    pub request_id: i64,
    /// Reason, recorded on rejections
    pub reason: Option<String>,
}

/// Bulk voucher grant body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantPayload {
    /// Residents receiving the grant
    pub user_ids: Vec<i64>,
    /// Amount credited to each
    pub amount: f64,
}

/// Voucher option creation body.
#[derive(Debug, Deserialize)]
pub struct VoucherOptionPayload {
    /// Option name, must be unique
    pub name: String,
    /// What the option covers
    pub description: String,
}

/// Product creation body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProductPayload {
    /// Product name, must be unique
    pub name: String,
    /// Product description
    pub description: String,
    /// Unit price
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

/// Partial product update body.
#[derive(Debug, Deserialize, Default)]
pub struct ProductUpdatePayload {
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

/// Name filter for the product search.
#[derive(Debug, Deserialize)]
pub struct ProductSearch {
    /// Substring matched against product names
    pub name: String,
}

/// Auction creation body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionPayload {
    /// Existing product to convert into an auction
    pub product_name: String,
    /// When bidding closes
    pub end_date: chrono::DateTime<chrono::Utc>,
    /// Opening bid
    pub starting_bid: f64,
}

/// Admin account creation body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserPayload {
    /// Account email, must be unique
    pub email: String,
    /// Account username, must be unique
    pub username: String,
    /// Initial plaintext password
    pub password: String,
    /// `"resident"` or `"admin"`
    pub role: String,
    /// Starting voucher balance, zero when absent
    pub voucher_balance: Option<f64>,
}

/// `GET /api/admin/orders`
pub async fn orders(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        approval::get_orders(&state.db, filter.status.as_deref()).await?,
    ))
}

/// `POST /api/admin/approveProductRequest`
pub async fn approve_product_request(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<OrderDecisionPayload>,
) -> Result<impl IntoResponse> {
    let order = approval::approve_order(&state.db, &admin.actor, payload.order_id).await?;
    Ok(Json(json!({ "message": "Order approved", "order": order })))
}

/// `POST /api/admin/rejectProductRequest`
pub async fn reject_product_request(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<OrderDecisionPayload>,
) -> Result<impl IntoResponse> {
    let order = approval::reject_order(
        &state.db,
        &admin.actor,
        payload.order_id,
        payload.description,
    )
    .await?;
    Ok(Json(json!({ "message": "Order rejected", "order": order })))
}

/// `DELETE /api/admin/deleteProductRequest/:id`
pub async fn delete_product_request(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse> {
    approval::delete_order(&state.db, &admin.actor, order_id).await?;
    Ok(Json(json!({ "message": "Order deleted" })))
}

/// `GET /api/admin/voucherRequests`
pub async fn voucher_requests(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(Json(voucher::list_pending_requests(&state.db).await?))
}

/// `POST /api/admin/approveVoucherRequest`
pub async fn approve_voucher_request(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<VoucherDecisionPayload>,
) -> Result<impl IntoResponse> {
    let request = voucher::approve_request(&state.db, &admin.actor, payload.request_id).await?;
    Ok(Json(json!({ "message": "Voucher request approved", "request": request })))
}

/// `POST /api/admin/rejectVoucherRequest`
pub async fn reject_voucher_request(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<VoucherDecisionPayload>,
) -> Result<impl IntoResponse> {
    let request = voucher::reject_request(
        &state.db,
        &admin.actor,
        payload.request_id,
        payload.reason,
    )
    .await?;
    Ok(Json(json!({ "message": "Voucher request rejected", "request": request })))
}

/// `POST /api/admin/approveVoucher` - direct balance grant to residents.
pub async fn grant_vouchers(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<GrantPayload>,
) -> Result<impl IntoResponse> {
    let updated =
        voucher::grant_vouchers(&state.db, &admin.actor, &payload.user_ids, payload.amount)
            .await?;
    Ok(Json(json!({ "message": "Vouchers granted", "users": updated })))
}

/// `POST /api/admin/voucherOptions`
pub async fn create_voucher_option(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<VoucherOptionPayload>,
) -> Result<impl IntoResponse> {
    let option = voucher::create_option(&state.db, &payload.name, &payload.description).await?;
    Ok((StatusCode::CREATED, Json(option)))
}

/// `POST /api/admin/products`
pub async fn create_product(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<NewProductPayload>,
) -> Result<impl IntoResponse> {
    let product = catalog::create_product(
        &state.db,
        catalog::NewProduct {
            name: payload.name,
            description: payload.description,
            price: payload.price,
            quantity: payload.quantity,
            category: payload.category,
            colour: payload.colour,
            size: payload.size,
            image_url: payload.image_url,
        },
    )
    .await?;

    audit::record(
        &state.db,
        AuditEntry {
            action_type: audit::ACTION_PRODUCT_CREATED,
            action_category: audit::CATEGORY_PRODUCT,
            admin_id: admin.actor.admin_id,
            description: format!("Created product {}", product.name),
            metadata: json!({ "productId": product.id }),
            before_state: json!({}),
            after_state: serde_json::to_value(&product)?,
            ip_address: admin.actor.ip_address.clone(),
            session_id: admin.actor.session_id.clone(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/admin/products/:productId`
pub async fn update_product(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Json(payload): Json<ProductUpdatePayload>,
) -> Result<impl IntoResponse> {
    let (before, after) = catalog::update_product(
        &state.db,
        product_id,
        catalog::ProductUpdate {
            name: payload.name,
            description: payload.description,
            category: payload.category,
            price: payload.price,
            quantity: payload.quantity,
        },
    )
    .await?;

    audit::record(
        &state.db,
        AuditEntry {
            action_type: audit::ACTION_PRODUCT_UPDATED,
            action_category: audit::CATEGORY_PRODUCT,
            admin_id: admin.actor.admin_id,
            description: format!("Updated product {}", after.name),
            metadata: json!({ "productId": product_id }),
            before_state: serde_json::to_value(&before)?,
            after_state: serde_json::to_value(&after)?,
            ip_address: admin.actor.ip_address.clone(),
            session_id: admin.actor.session_id.clone(),
        },
    )
    .await?;

    Ok(Json(after))
}

/// `DELETE /api/admin/products/:id`
pub async fn delete_product(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let deleted = catalog::delete_product(&state.db, product_id).await?;

    audit::record(
        &state.db,
        AuditEntry {
            action_type: audit::ACTION_PRODUCT_DELETED,
            action_category: audit::CATEGORY_PRODUCT,
            admin_id: admin.actor.admin_id,
            description: format!("Deleted product {}", deleted.name),
            metadata: json!({ "productId": product_id }),
            before_state: serde_json::to_value(&deleted)?,
            after_state: json!({}),
            ip_address: admin.actor.ip_address.clone(),
            session_id: admin.actor.session_id.clone(),
        },
    )
    .await?;

    Ok(Json(json!({ "message": "Product deleted" })))
}

/// `GET /api/admin/products/search`
pub async fn search_products(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(search): Query<ProductSearch>,
) -> Result<impl IntoResponse> {
    Ok(Json(catalog::search_products(&state.db, &search.name).await?))
}

/// `GET /api/admin/inventorySummary`
pub async fn inventory_summary(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(Json(catalog::inventory_summary(&state.db).await?))
}

/// `POST /api/admin/createAuction`
pub async fn create_auction(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateAuctionPayload>,
) -> Result<impl IntoResponse> {
    let product = auction::create_auction(
        &state.db,
        &admin.actor,
        &payload.product_name,
        payload.end_date,
        payload.starting_bid,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /api/admin/auditLogs`
pub async fn audit_logs(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<audit::AuditQuery>,
) -> Result<impl IntoResponse> {
    Ok(Json(audit::query_logs(&state.db, query).await?))
}

/// `GET /api/admin/users`
pub async fn users(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(Json(user::get_all_users(&state.db).await?))
}

/// `POST /api/admin/users`
pub async fn create_user(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<NewUserPayload>,
) -> Result<impl IntoResponse> {
    let account = user::create_user(
        &state.db,
        payload.email,
        payload.username,
        &payload.password,
        payload.role,
        payload.voucher_balance.unwrap_or(0.0),
    )
    .await?;

    audit::record(
        &state.db,
        AuditEntry {
            action_type: audit::ACTION_USER_CREATED,
            action_category: audit::CATEGORY_USER,
            admin_id: admin.actor.admin_id,
            description: format!("Created {} account {}", account.role, account.username),
            metadata: json!({ "userId": account.id }),
            before_state: json!({}),
            after_state: serde_json::to_value(&account)?,
            ip_address: admin.actor.ip_address.clone(),
            session_id: admin.actor.session_id.clone(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// `PUT /api/admin/users/:userId/suspend`
pub async fn toggle_suspend(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let (before, after) = user::toggle_suspend(&state.db, user_id).await?;

    audit::record(
        &state.db,
        AuditEntry {
            action_type: audit::ACTION_USER_SUSPENDED,
            action_category: audit::CATEGORY_USER,
            admin_id: admin.actor.admin_id,
            description: format!(
                "{} account {}",
                if after.suspended { "Suspended" } else { "Unsuspended" },
                after.username
            ),
            metadata: json!({ "userId": user_id }),
            before_state: serde_json::to_value(&before)?,
            after_state: serde_json::to_value(&after)?,
            ip_address: admin.actor.ip_address.clone(),
            session_id: admin.actor.session_id.clone(),
        },
    )
    .await?;

    Ok(Json(json!({ "message": "Suspension updated", "user": after })))
}

/// `PUT /api/admin/users/:userId/resetPassword`
pub async fn reset_password(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let account = user::reset_password_admin(&state.db, user_id).await?;

    audit::record(
        &state.db,
        AuditEntry {
            action_type: audit::ACTION_PASSWORD_RESET,
            action_category: audit::CATEGORY_USER,
            admin_id: admin.actor.admin_id,
            description: format!("Reset password for {}", account.username),
            metadata: json!({ "userId": user_id }),
            before_state: json!({}),
            after_state: json!({}),
            ip_address: admin.actor.ip_address.clone(),
            session_id: admin.actor.session_id.clone(),
        },
    )
    .await?;

    Ok(Json(json!({ "message": "Password reset to the default" })))
}
