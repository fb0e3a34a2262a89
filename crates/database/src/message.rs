//! Message log persistence.

use chat_core::StoredMessage;
use sqlx::SqlitePool;

use crate::models::MessageRow;
use crate::{DatabaseError, Result};

/// Append a message to its conversation's log.
///
/// Bumps the conversation's `updated_at` in the same transaction so that
/// listings sort by recent activity. Fails with `NotFound` when the
/// conversation does not exist.
pub async fn append_message(pool: &SqlitePool, message: &StoredMessage) -> Result<()> {
    let mut tx = pool.begin().await?;

    let touched = sqlx::query(
        r#"
        UPDATE conversations
        SET updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&message.created_at)
    .bind(&message.conversation_id)
    .execute(&mut *tx)
    .await?;

    if touched.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "conversation",
            id: message.conversation_id.clone(),
        });
    }

    sqlx::query(
        r#"
        INSERT INTO messages (id, conversation_id, sender_kind, sender_id, model_name, content, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&message.id)
    .bind(&message.conversation_id)
    .bind(message.sender_kind.as_str())
    .bind(&message.sender_id)
    .bind(&message.model_name)
    .bind(&message.content)
    .bind(&message.created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// All messages in a conversation, oldest first.
///
/// Ordered by `created_at` with rowid breaking exact timestamp ties, so
/// the result is a total order even when two turns land in the same
/// microsecond.
pub async fn list_messages(pool: &SqlitePool, conversation_id: &str) -> Result<Vec<StoredMessage>> {
    let rows = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT id, conversation_id, sender_kind, sender_id, model_name, content, created_at
        FROM messages
        WHERE conversation_id = ?
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(MessageRow::into_message).collect()
}
