//! Seed data loading from config.toml.
//!
//! The seed file declares the voucher-option catalog and a bootstrap admin
//! account. Seeding is idempotent: options are matched by name and the admin
//! by username, so re-running startup never duplicates rows.

use crate::{
    core,
    entities::{VoucherOption, voucher_option},
    errors::{Error, Result},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::path::Path;
use tracing::info;

/// Structure of the entire config.toml seed file
#[derive(Debug, serde::Deserialize)]
pub struct SeedConfig {
    /// Voucher options to make available to residents
    #[serde(default)]
    pub voucher_options: Vec<VoucherOptionConfig>,
    /// Bootstrap admin account, created if missing
    pub admin: Option<AdminConfig>,
}

/// Declaration of a single voucher option
#[derive(Debug, serde::Deserialize, Clone)]
pub struct VoucherOptionConfig {
    /// Option name
    pub name: String,
    /// What the option covers
    pub description: String,
}

/// Bootstrap admin account declaration
#[derive(Debug, serde::Deserialize, Clone)]
pub struct AdminConfig {
    /// Admin username
    pub username: String,
    /// Admin email
    pub email: String,
    /// Initial plaintext password, hashed before storage
    pub password: String,
}

/// Loads the seed configuration from a TOML file.
///
/// # Errors
/// Returns a configuration error if the file cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Inserts any missing voucher options and the bootstrap admin account.
pub async fn apply(db: &DatabaseConnection, config: &SeedConfig) -> Result<()> {
    for option in &config.voucher_options {
        let existing = VoucherOption::find()
            .filter(voucher_option::Column::Name.eq(&option.name))
            .one(db)
            .await?;

        if existing.is_none() {
            let model = voucher_option::ActiveModel {
                name: Set(option.name.clone()),
                description: Set(option.description.clone()),
                ..Default::default()
            };
            model.insert(db).await?;
            info!("Seeded voucher option '{}'", option.name);
        }
    }

    if let Some(admin) = &config.admin {
        let existing = core::user::get_user_by_username(db, &admin.username).await?;
        if existing.is_none() {
            core::user::create_user(
                db,
                admin.email.clone(),
                admin.username.clone(),
                &admin.password,
                core::user::ROLE_ADMIN.to_string(),
                0.0,
            )
            .await?;
            info!("Seeded bootstrap admin '{}'", admin.username);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_parse_seed_config() {
        let toml_str = r#"
            [[voucher_options]]
            name = "Groceries"
            description = "Monthly grocery assistance"

            [[voucher_options]]
            name = "Utilities"
            description = "Utility bill support"

            [admin]
            username = "admin"
            email = "admin@example.com"
            password = "change-me"
        "#;

        let config: SeedConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.voucher_options.len(), 2);
        assert_eq!(config.voucher_options[0].name, "Groceries");
        assert_eq!(config.admin.as_ref().unwrap().username, "admin");
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let config = SeedConfig {
            voucher_options: vec![VoucherOptionConfig {
                name: "Groceries".to_string(),
                description: "Monthly grocery assistance".to_string(),
            }],
            admin: Some(AdminConfig {
                username: "admin".to_string(),
                email: "admin@example.com".to_string(),
                password: "change-me".to_string(),
            }),
        };

        apply(&db, &config).await?;
        apply(&db, &config).await?;

        let options = VoucherOption::find().all(&db).await?;
        assert_eq!(options.len(), 1);

        let admin = core::user::get_user_by_username(&db, "admin").await?;
        assert!(admin.is_some());

        Ok(())
    }
}
