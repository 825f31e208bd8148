//! Core business logic - framework-agnostic workflow operations.
//!
//! Each submodule owns one workflow of the application: identity,
//! catalog, checkout, approvals, voucher requests, auctions, notifications, and
//! the audit trail. Everything here is async, returns the crate's `Result`, and
//! runs its multi-step mutations inside database transactions so shared
//! counters (stock, voucher balance) cannot be torn by concurrent requests.

/// Order approval workflow - approve, reject, delete, list
pub mod approval;
/// Auction workflow - create, list, expiry sweep, bidding
pub mod auction;
/// Audit trail - append-only admin action records and queries
pub mod audit;
/// Catalog operations - product CRUD, search, inventory summary
pub mod catalog;
/// Order workflow - cart checkout and transaction history
pub mod checkout;
/// Notifications - per-resident message list
pub mod notification;
/// Identity operations - accounts, credentials, suspension, balances
pub mod user;
/// Voucher request workflow - options, submission, admin decisions
pub mod voucher;
