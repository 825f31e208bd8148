//! Unified error types and result handling.
//!
//! Workflow errors are raised from the `core` modules with enough context to
//! produce a human-readable message, then mapped once at the axum boundary to
//! an HTTP status and a JSON `{"message": ...}` body. Database and other
//! unexpected failures are logged server-side and surfaced as a generic 500.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// All failure modes surfaced by the application.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed input
    #[error("{message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// A referenced entity does not exist
    #[error("{entity} not found")]
    NotFound {
        /// Which kind of entity was missing (e.g., "User", "Order")
        entity: &'static str,
    },

    /// Missing or invalid bearer token
    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated but not allowed (wrong role, or suspended account)
    #[error("{message}")]
    Forbidden {
        /// Why access was denied
        message: String,
    },

    /// Duplicate approval or rejection of an already-resolved request
    #[error("{message}")]
    AlreadyProcessed {
        /// Which resolution already happened
        message: String,
    },

    /// Operation not valid for the entity's current status
    #[error("{message}")]
    InvalidState {
        /// What state blocked the operation
        message: String,
    },

    /// Requested quantity exceeds current stock
    #[error("Insufficient stock for {product}")]
    InsufficientStock {
        /// Product that ran short
        product: String,
    },

    /// Cart total exceeds the resident's voucher balance
    #[error("Insufficient voucher balance")]
    InsufficientBalance {
        /// Balance at the time of the attempt
        balance: f64,
        /// Total the cart required
        required: f64,
    },

    /// Bid did not strictly exceed the current highest bid
    #[error("Bid must be higher than the current highest bid")]
    BidTooLow {
        /// Highest bid at the time of the attempt
        highest_bid: f64,
    },

    /// Configuration error (bad config file, missing settings)
    #[error("Configuration error: {message}")]
    Config {
        /// What was misconfigured
        message: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Password hashing or verification failure
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// Token issuance or verification failure
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// JSON serialization failure (audit snapshots)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation { .. }
            | Error::AlreadyProcessed { .. }
            | Error::InvalidState { .. }
            | Error::InsufficientStock { .. }
            | Error::InsufficientBalance { .. }
            | Error::BidTooLow { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Unauthorized | Error::Token(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::Config { .. }
            | Error::Database(_)
            | Error::PasswordHash(_)
            | Error::Json(_)
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal failures get logged in full and reported generically
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("internal error: {self}");
            "Server error. Please try again later.".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
