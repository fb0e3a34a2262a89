//! Per-user vendor API keys.

use chat_core::now_rfc3339;
use sqlx::SqlitePool;

use crate::Result;

/// Store or replace a user's API key for a vendor.
pub async fn upsert_api_key(
    pool: &SqlitePool,
    user_id: &str,
    vendor: &str,
    api_key: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO api_keys (user_id, vendor, api_key, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id, vendor) DO UPDATE SET
            api_key = excluded.api_key,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(vendor)
    .bind(api_key)
    .bind(now_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up a user's API key for a vendor.
pub async fn get_api_key(
    pool: &SqlitePool,
    user_id: &str,
    vendor: &str,
) -> Result<Option<String>> {
    let record = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT api_key
        FROM api_keys
        WHERE user_id = ? AND vendor = ?
        "#,
    )
    .bind(user_id)
    .bind(vendor)
    .fetch_optional(pool)
    .await?;

    Ok(record.map(|(key,)| key))
}

/// Vendors the user holds keys for, sorted by name.
pub async fn list_vendors_with_keys(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>> {
    let rows = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT vendor
        FROM api_keys
        WHERE user_id = ?
        ORDER BY vendor ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(vendor,)| vendor).collect())
}
