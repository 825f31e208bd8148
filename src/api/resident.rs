//! Resident-facing handlers: balance, catalog, checkout, transaction
//! history, voucher requests, auctions, notifications, and password reset.
//!
//! Handlers stay thin: decode the payload, call into `core`, and serialize
//! the result. The acting resident is always `claims.sub` from the verified
//! token, never an id in the request body.

use crate::{
    api::{AppState, auth::ResidentUser},
    core::{auction, catalog, checkout, notification, user, voucher},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutPayload {
    /// Cart lines to purchase
    pub items: Vec<checkout::CartLine>,
}

/// Voucher request submission body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherRequestPayload {
    /// Voucher option the request draws against
    pub voucher_option_id: i64,
    /// Amount of voucher credit requested
    pub amount: f64,
    /// Optional justification
    pub reason: Option<String>,
}

/// Bid placement body.
#[derive(Debug, Deserialize)]
pub struct BidPayload {
    /// Bid amount, must strictly exceed the current highest bid
    pub amount: f64,
}

/// Self-service password reset body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    /// Current password, verified before the change
    pub old_password: String,
    /// Replacement password
    pub new_password: String,
}

/// `GET /api/resident/voucherBalance`
pub async fn voucher_balance(
    ResidentUser(claims): ResidentUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let account = user::get_user_by_id(&state.db, claims.sub)
        .await?
        .ok_or(Error::NotFound { entity: "User" })?;

    Ok(Json(json!({ "voucherBalance": account.voucher_balance })))
}

/// `GET /api/resident/products`
pub async fn list_products(
    ResidentUser(_): ResidentUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(Json(catalog::get_all_products(&state.db).await?))
}

/// `POST /api/resident/checkout`
pub async fn checkout_cart(
    ResidentUser(claims): ResidentUser,
    State(state): State<AppState>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse> {
    let receipt = checkout::checkout(&state.db, claims.sub, &payload.items).await?;
    Ok(Json(receipt))
}

/// `GET /api/resident/transactions`
pub async fn transactions(
    ResidentUser(claims): ResidentUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        checkout::transaction_history(&state.db, claims.sub).await?,
    ))
}

/// `GET /api/resident/voucherOptions`
pub async fn voucher_options(
    ResidentUser(_): ResidentUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(Json(voucher::list_options(&state.db).await?))
}

/// `POST /api/resident/submitVoucherRequest`
pub async fn submit_voucher_request(
    ResidentUser(claims): ResidentUser,
    State(state): State<AppState>,
    Json(payload): Json<VoucherRequestPayload>,
) -> Result<impl IntoResponse> {
    let request = voucher::submit_request(
        &state.db,
        claims.sub,
        payload.voucher_option_id,
        payload.amount,
        payload.reason,
    )
    .await?;

    Ok(Json(json!({
        "message": "Voucher request submitted",
        "request": request,
    })))
}

/// `GET /api/resident/getAuctions`
///
/// Sweeps expired auctions first so the flag stays accurate, then returns
/// the read-only live listing.
pub async fn get_auctions(
    ResidentUser(_): ResidentUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    auction::deactivate_expired(&state.db).await?;
    Ok(Json(auction::list_live_auctions(&state.db).await?))
}

/// `PUT /api/resident/placeBid/:productId`
pub async fn place_bid(
    ResidentUser(claims): ResidentUser,
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Json(payload): Json<BidPayload>,
) -> Result<impl IntoResponse> {
    let product = auction::place_bid(&state.db, claims.sub, product_id, payload.amount).await?;
    Ok(Json(json!({ "message": "Bid placed", "product": product })))
}

/// `GET /api/resident/notifications`
pub async fn notifications(
    ResidentUser(claims): ResidentUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        notification::get_notifications(&state.db, claims.sub).await?,
    ))
}

/// `PUT /api/resident/notifications/read`
pub async fn mark_notifications_read(
    ResidentUser(claims): ResidentUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let updated = notification::mark_all_read(&state.db, claims.sub).await?;
    Ok(Json(json!({ "message": "Notifications marked as read", "updated": updated })))
}

/// `POST /api/resident/resetPassword`
pub async fn reset_password(
    ResidentUser(claims): ResidentUser,
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<impl IntoResponse> {
    user::reset_password_self(
        &state.db,
        claims.sub,
        &payload.old_password,
        &payload.new_password,
    )
    .await?;

    Ok(Json(json!({ "message": "Password updated" })))
}
