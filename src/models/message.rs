use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use tracing::debug;
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "sender_kind", rename_all = "lowercase")] // SQL value name
#[serde(rename_all = "lowercase")] // JSON value name
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: Sender,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Default for Message {
    fn default() -> Self {
        Message {
            id: Uuid::new_v4(),
            conversation_id: Uuid::nil(),
            sender: Sender::User,
            content: String::new(),
            created_at: Utc::now(),
        }
    }
}

impl Message {
    /// The last `limit` messages of a conversation, oldest first.
    pub async fn history(
        pool: &PgPool,
        conversation_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, ApiError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM (
                SELECT * FROM messages
                WHERE conversation_id = $1
                ORDER BY created_at DESC
                LIMIT $2
            ) recent
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    /// Persists a user turn and the bot reply as one insert, so an aborted
    /// turn leaves no partial history. The bot row is stamped one millisecond
    /// after the user row; ascending history order stays deterministic.
    pub async fn append_exchange(
        pool: &PgPool,
        conversation_id: Uuid,
        user_text: &str,
        bot_text: &str,
    ) -> Result<(Self, Self), ApiError> {
        let now = Utc::now();
        let user_message = Message {
            conversation_id,
            sender: Sender::User,
            content: user_text.to_string(),
            created_at: now,
            ..Default::default()
        };
        let bot_message = Message {
            conversation_id,
            sender: Sender::Bot,
            content: bot_text.to_string(),
            created_at: now + Duration::milliseconds(1),
            ..Default::default()
        };

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, sender, content, created_at)
            VALUES ($1, $2, $3, $4, $5), ($6, $7, $8, $9, $10)
            "#,
        )
        .bind(user_message.id)
        .bind(user_message.conversation_id)
        .bind(user_message.sender)
        .bind(&user_message.content)
        .bind(user_message.created_at)
        .bind(bot_message.id)
        .bind(bot_message.conversation_id)
        .bind(bot_message.sender)
        .bind(&bot_message.content)
        .bind(bot_message.created_at)
        .execute(pool)
        .await?;

        debug!("Exchange persisted for conversation: {:?}", conversation_id);
        Ok((user_message, bot_message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Sender::Bot).unwrap(), "\"bot\"");
    }
}
