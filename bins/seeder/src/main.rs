//! Database seeder for Siren.
//!
//! Bootstraps the initial admin account from `ADMIN_EMAIL` and
//! `ADMIN_PASSWORD` (defaulting to `admin@example.com` / `ChangeMe123`);
//! skips seeding when the account already exists.
//!
//! Usage: cargo run --bin seeder

use siren_core::auth::hash_password;
use siren_core::workflow::Role;
use siren_db::repositories::UserRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set in environment"))?;
    let admin_email =
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let admin_password =
        std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "ChangeMe123".to_string());

    println!("Connecting to database...");
    let db = siren_db::connect(&database_url, 2).await?;
    let users = UserRepository::new(db);

    if let Some(existing) = users.find_by_email(&admin_email).await? {
        println!(
            "Admin account {} already exists ({}), skipping...",
            existing.email, existing.id
        );
        return Ok(());
    }

    let password_hash =
        hash_password(&admin_password).map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;

    let admin = users
        .create(&admin_email, &password_hash, "Administrator", Role::Admin, &[])
        .await?;

    println!("Created admin account {} ({})", admin.email, admin.id);
    Ok(())
}
