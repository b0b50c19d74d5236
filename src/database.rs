use std::time::Duration;

use bcrypt::hash;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::error::AppError;
use crate::handlers::auth::BCRYPT_COST;

const DEMO_USERS: [(&str, &str); 3] =
    [("admin", "admin123"), ("demo", "demo123"), ("user", "password")];

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}

/// Creates the demo accounts that do not exist yet.
pub async fn seed_demo_users(pool: &PgPool) -> Result<usize, AppError> {
    let mut created = 0;
    for (username, password) in DEMO_USERS {
        let password_hash = hash(password, BCRYPT_COST)
            .map_err(|e| AppError::internal(format!("Hash error: {e}")))?;

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2)
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(username)
        .bind(&password_hash)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(username, "Created demo user");
            created += 1;
        }
    }
    Ok(created)
}
