/// Database connection and table creation
pub mod database;

/// Seed data loading from config.toml (voucher options, bootstrap admin)
pub mod seed;

/// Application settings loaded from environment variables
pub mod settings;
