//! Conversation persistence.

use chat_core::{now_rfc3339, Conversation};
use sqlx::SqlitePool;

use crate::models::ConversationRow;
use crate::{DatabaseError, Result};

/// Insert a new conversation.
pub async fn create_conversation(pool: &SqlitePool, conversation: &Conversation) -> Result<()> {
    let participants = serde_json::to_string(&conversation.participants)?;
    sqlx::query(
        r#"
        INSERT INTO conversations (id, user_id, name, participants, system_prompt, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&conversation.id)
    .bind(&conversation.user_id)
    .bind(&conversation.name)
    .bind(participants)
    .bind(&conversation.system_prompt)
    .bind(&conversation.created_at)
    .bind(&conversation.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a conversation by id.
pub async fn get_conversation(pool: &SqlitePool, id: &str) -> Result<Conversation> {
    let row = sqlx::query_as::<_, ConversationRow>(
        r#"
        SELECT id, user_id, name, participants, system_prompt, created_at, updated_at
        FROM conversations
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "conversation",
        id: id.to_string(),
    })?;

    row.into_conversation()
}

/// List a user's conversations, most recently updated first.
pub async fn list_conversations_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<Conversation>> {
    let rows = sqlx::query_as::<_, ConversationRow>(
        r#"
        SELECT id, user_id, name, participants, system_prompt, created_at, updated_at
        FROM conversations
        WHERE user_id = ?
        ORDER BY updated_at DESC, rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(ConversationRow::into_conversation)
        .collect()
}

/// Delete a conversation. Its messages go with it via the foreign-key
/// cascade.
pub async fn delete_conversation(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM conversations
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "conversation",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Replace the shared system prompt and bump `updated_at`.
pub async fn set_system_prompt(pool: &SqlitePool, id: &str, system_prompt: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET system_prompt = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(system_prompt)
    .bind(now_rfc3339())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "conversation",
            id: id.to_string(),
        });
    }

    Ok(())
}
