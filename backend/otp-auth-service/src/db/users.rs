/// User database operations
use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;

/// Check whether a mobile number is registered
pub async fn user_exists(pool: &PgPool, mobile: &str) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE mobile = $1)",
    )
    .bind(mobile)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Insert a user; a duplicate mobile number is a no-op reported as `false`
pub async fn create_user(pool: &PgPool, mobile: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (id, mobile)
        VALUES ($1, $2)
        ON CONFLICT (mobile) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(mobile)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

