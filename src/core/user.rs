//! Identity business logic - accounts, credentials, suspension, balances.
//!
//! Provides account creation with bcrypt hashing and uniqueness checks,
//! credential verification for login, suspension toggling, password resets,
//! and the atomic voucher-balance update every other workflow goes through.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Role string for resident accounts
pub const ROLE_RESIDENT: &str = "resident";
/// Role string for admin accounts
pub const ROLE_ADMIN: &str = "admin";

/// Default password applied by the admin-side reset.
pub const DEFAULT_RESET_PASSWORD: &str = "password123";

/// Creates a new account with a hashed password, enforcing unique email and
/// username.
///
/// # Errors
/// Returns a validation error if the email or username is empty or already
/// taken, or if the role is not `"resident"` or `"admin"`.
pub async fn create_user(
    db: &DatabaseConnection,
    email: String,
    username: String,
    password: &str,
    role: String,
    voucher_balance: f64,
) -> Result<user::Model> {
    if email.trim().is_empty() || username.trim().is_empty() || password.is_empty() {
        return Err(Error::Validation {
            message: "Username, email, and password are required".to_string(),
        });
    }

    if role != ROLE_RESIDENT && role != ROLE_ADMIN {
        return Err(Error::Validation {
            message: format!("Unknown role: {role}"),
        });
    }

    let existing = User::find()
        .filter(
            user::Column::Email
                .eq(email.trim())
                .or(user::Column::Username.eq(username.trim())),
        )
        .one(db)
        .await?;

    if existing.is_some() {
        return Err(Error::Validation {
            message: "Email or Username already exists".to_string(),
        });
    }

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let account = user::ActiveModel {
        email: Set(email.trim().to_string()),
        username: Set(username.trim().to_string()),
        password_hash: Set(password_hash),
        role: Set(role),
        voucher_balance: Set(voucher_balance),
        suspended: Set(false),
        ..Default::default()
    };

    account.insert(db).await.map_err(Into::into)
}

/// Verifies login credentials and returns the account on success.
///
/// Suspended accounts are refused even with correct credentials.
///
/// # Errors
/// Returns a validation error for an unknown username or wrong password (the
/// two are reported identically), and `Forbidden` for suspended accounts.
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<user::Model> {
    let account = get_user_by_username(db, username)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !bcrypt::verify(password, &account.password_hash)? {
        return Err(invalid_credentials());
    }

    if account.suspended {
        return Err(Error::Forbidden {
            message: "Account is suspended".to_string(),
        });
    }

    Ok(account)
}

fn invalid_credentials() -> Error {
    Error::Validation {
        message: "Invalid username or password".to_string(),
    }
}

/// Finds an account by its unique ID.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds an account by username.
pub async fn get_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all accounts, ordered by username.
pub async fn get_all_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Adjusts a resident's voucher balance by atomically adding a delta.
///
/// Instead of reading the balance, modifying it, and writing it back (which
/// loses updates under concurrency), this issues a single
/// `UPDATE users SET voucher_balance = voucher_balance + delta WHERE id = ?`.
///
/// # Errors
/// Returns `NotFound` if the account does not exist.
pub async fn update_voucher_balance_atomic<C>(
    db: &C,
    user_id: i64,
    amount_delta: f64,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    let _account = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "User" })?;

    User::update_many()
        .col_expr(
            user::Column::VoucherBalance,
            Expr::col(user::Column::VoucherBalance).add(amount_delta),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "User" })
}

/// Deducts an amount from a resident's balance only if the balance covers it.
///
/// Issues `UPDATE users SET voucher_balance = voucher_balance - amount
/// WHERE id = ? AND voucher_balance >= amount` and inspects the affected-row
/// count, so the balance can never go negative even under concurrent
/// checkouts.
///
/// # Errors
/// Returns `InsufficientBalance` when the conditional update matched no row.
pub async fn debit_voucher_balance<C>(db: &C, user_id: i64, amount: f64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    let account = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "User" })?;

    let updated = User::update_many()
        .col_expr(
            user::Column::VoucherBalance,
            Expr::col(user::Column::VoucherBalance).sub(amount),
        )
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::VoucherBalance.gte(amount))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(Error::InsufficientBalance {
            balance: account.voucher_balance,
            required: amount,
        });
    }

    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "User" })
}

/// Flips an account's suspension flag, returning (before, after) models for
/// the audit trail.
///
/// # Errors
/// Returns `NotFound` if the account does not exist.
pub async fn toggle_suspend(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<(user::Model, user::Model)> {
    let before = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "User" })?;

    let mut active: user::ActiveModel = before.clone().into();
    active.suspended = Set(!before.suspended);
    let after = active.update(db).await?;

    Ok((before, after))
}

/// Resident-initiated password change: verifies the old password first.
///
/// # Errors
/// Returns a validation error if the old password does not match or the new
/// password is empty.
pub async fn reset_password_self(
    db: &DatabaseConnection,
    user_id: i64,
    old_password: &str,
    new_password: &str,
) -> Result<()> {
    if new_password.is_empty() {
        return Err(Error::Validation {
            message: "Old password and new password are required".to_string(),
        });
    }

    let account = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "User" })?;

    if !bcrypt::verify(old_password, &account.password_hash)? {
        return Err(Error::Validation {
            message: "Old password is incorrect".to_string(),
        });
    }

    let mut active: user::ActiveModel = account.into();
    active.password_hash = Set(bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?);
    active.update(db).await?;

    Ok(())
}

/// Admin-initiated password reset to the default password.
///
/// The default is hashed like any other password before storage.
///
/// # Errors
/// Returns `NotFound` if the account does not exist.
pub async fn reset_password_admin(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    let account = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "User" })?;

    let mut active: user::ActiveModel = account.into();
    active.password_hash = Set(bcrypt::hash(DEFAULT_RESET_PASSWORD, bcrypt::DEFAULT_COST)?);
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_user_validation() -> Result<()> {
        let db = setup_test_db().await?;

        // Empty username
        let result = create_user(
            &db,
            "a@example.com".to_string(),
            "  ".to_string(),
            "secret",
            ROLE_RESIDENT.to_string(),
            0.0,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        // Unknown role
        let result = create_user(
            &db,
            "a@example.com".to_string(),
            "alice".to_string(),
            "secret",
            "superuser".to_string(),
            0.0,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_duplicate_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_resident(&db, "alice", 0.0).await?;

        // Same username, different email
        let result = create_user(
            &db,
            "other@example.com".to_string(),
            "alice".to_string(),
            "secret",
            ROLE_RESIDENT.to_string(),
            0.0,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        // Same email, different username
        let result = create_user(
            &db,
            "alice@example.com".to_string(),
            "alice2".to_string(),
            "secret",
            ROLE_RESIDENT.to_string(),
            0.0,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_authenticate() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_resident(&db, "alice", 50.0).await?;

        let account = authenticate(&db, "alice", TEST_PASSWORD).await?;
        assert_eq!(account.username, "alice");
        assert_eq!(account.voucher_balance, 50.0);

        let result = authenticate(&db, "alice", "wrong").await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = authenticate(&db, "nobody", TEST_PASSWORD).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_authenticate_suspended_account_refused() -> Result<()> {
        let db = setup_test_db().await?;
        let resident = create_test_resident(&db, "alice", 0.0).await?;

        toggle_suspend(&db, resident.id).await?;

        let result = authenticate(&db, "alice", TEST_PASSWORD).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));

        // Unsuspending restores access
        toggle_suspend(&db, resident.id).await?;
        assert!(authenticate(&db, "alice", TEST_PASSWORD).await.is_ok());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_voucher_balance_atomic() -> Result<()> {
        let db = setup_test_db().await?;
        let resident = create_test_resident(&db, "alice", 100.0).await?;

        let updated = update_voucher_balance_atomic(&db, resident.id, 25.0).await?;
        assert_eq!(updated.voucher_balance, 125.0);

        let updated = update_voucher_balance_atomic(&db, resident.id, -125.0).await?;
        assert_eq!(updated.voucher_balance, 0.0);

        let result = update_voucher_balance_atomic(&db, 999, 10.0).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_debit_voucher_balance_guards_against_overdraft() -> Result<()> {
        let db = setup_test_db().await?;
        let resident = create_test_resident(&db, "alice", 30.0).await?;

        let result = debit_voucher_balance(&db, resident.id, 31.0).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientBalance {
                balance: 30.0,
                required: 31.0
            }
        ));

        // Balance untouched after the failed debit
        let account = get_user_by_id(&db, resident.id).await?.unwrap();
        assert_eq!(account.voucher_balance, 30.0);

        let updated = debit_voucher_balance(&db, resident.id, 30.0).await?;
        assert_eq!(updated.voucher_balance, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_reset_password_self() -> Result<()> {
        let db = setup_test_db().await?;
        let resident = create_test_resident(&db, "alice", 0.0).await?;

        let result = reset_password_self(&db, resident.id, "wrong", "newpass").await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        reset_password_self(&db, resident.id, TEST_PASSWORD, "newpass").await?;
        assert!(authenticate(&db, "alice", "newpass").await.is_ok());
        assert!(authenticate(&db, "alice", TEST_PASSWORD).await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_reset_password_admin_applies_default() -> Result<()> {
        let db = setup_test_db().await?;
        let resident = create_test_resident(&db, "alice", 0.0).await?;

        reset_password_admin(&db, resident.id).await?;
        assert!(
            authenticate(&db, "alice", DEFAULT_RESET_PASSWORD)
                .await
                .is_ok()
        );

        Ok(())
    }
}
