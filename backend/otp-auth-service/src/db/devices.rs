/// Registered device database operations
use crate::error::Result;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn device_exists(pool: &PgPool, mobile: &str, fingerprint: &str) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM user_devices
            WHERE mobile = $1 AND device_fingerprint = $2
        )
        "#,
    )
    .bind(mobile)
    .bind(fingerprint)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

pub async fn insert_device(pool: &PgPool, mobile: &str, fingerprint: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_devices (id, mobile, device_fingerprint)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(mobile)
    .bind(fingerprint)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete one device; returns rows removed (0 when unknown)
pub async fn delete_device(pool: &PgPool, mobile: &str, fingerprint: &str) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM user_devices WHERE mobile = $1 AND device_fingerprint = $2",
    )
    .bind(mobile)
    .bind(fingerprint)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Delete every device except `keep`.
///
/// The exclusion is part of the DELETE predicate, so a concurrent insert of
/// `keep` can never be swept away by this statement.
pub async fn delete_devices_except(pool: &PgPool, mobile: &str, keep: &str) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM user_devices WHERE mobile = $1 AND device_fingerprint <> $2",
    )
    .bind(mobile)
    .bind(keep)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_all_devices(pool: &PgPool, mobile: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM user_devices WHERE mobile = $1")
        .bind(mobile)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Distinct fingerprints for a user, oldest first
pub async fn list_fingerprints(pool: &PgPool, mobile: &str) -> Result<Vec<String>> {
    let fingerprints = sqlx::query_scalar::<_, String>(
        r#"
        SELECT device_fingerprint
        FROM user_devices
        WHERE mobile = $1
        GROUP BY device_fingerprint
        ORDER BY MIN(created_at) ASC
        "#,
    )
    .bind(mobile)
    .fetch_all(pool)
    .await?;

    Ok(fingerprints)
}
