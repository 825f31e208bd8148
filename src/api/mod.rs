//! HTTP surface - axum router, shared state, and request handlers.
//!
//! Handlers are thin adapters between HTTP and the `core` workflows. Errors
//! bubble up as the crate's `Error` and are mapped to status + JSON once, in
//! its `IntoResponse` impl.

use crate::config::settings::Settings;
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Admin-facing handlers
pub mod admin;
/// Signup/login, token issuance, role extractors
pub mod auth;
/// Resident-facing handlers
pub mod resident;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database handle
    pub db: DatabaseConnection,
    /// Runtime settings (JWT secret, port)
    pub settings: Arc<Settings>,
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login));

    let resident_routes = Router::new()
        .route("/voucherBalance", get(resident::voucher_balance))
        .route("/products", get(resident::list_products))
        .route("/checkout", post(resident::checkout_cart))
        .route("/transactions", get(resident::transactions))
        .route("/voucherOptions", get(resident::voucher_options))
        .route("/submitVoucherRequest", post(resident::submit_voucher_request))
        .route("/getAuctions", get(resident::get_auctions))
        .route("/placeBid/:product_id", put(resident::place_bid))
        .route("/notifications", get(resident::notifications))
        .route("/notifications/read", put(resident::mark_notifications_read))
        .route("/resetPassword", post(resident::reset_password));

    let admin_routes = Router::new()
        .route("/orders", get(admin::orders))
        .route("/approveProductRequest", post(admin::approve_product_request))
        .route("/rejectProductRequest", post(admin::reject_product_request))
        .route("/deleteProductRequest/:id", delete(admin::delete_product_request))
        .route("/voucherRequests", get(admin::voucher_requests))
        .route("/approveVoucherRequest", post(admin::approve_voucher_request))
        .route("/rejectVoucherRequest", post(admin::reject_voucher_request))
        .route("/approveVoucher", post(admin::grant_vouchers))
        .route("/voucherOptions", post(admin::create_voucher_option))
        .route("/products", post(admin::create_product))
        .route("/products/search", get(admin::search_products))
        .route(
            "/products/:product_id",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/inventorySummary", get(admin::inventory_summary))
        .route("/createAuction", post(admin::create_auction))
        .route("/auditLogs", get(admin::audit_logs))
        .route("/users", get(admin::users).post(admin::create_user))
        .route("/users/:user_id/suspend", put(admin::toggle_suspend))
        .route("/users/:user_id/resetPassword", put(admin::reset_password));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/resident", resident_routes)
        .nest("/api/admin", admin_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
