use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Default for Conversation {
    fn default() -> Self {
        Conversation {
            id: Uuid::new_v4(),
            user_id: String::new(),
            created_at: Utc::now(),
        }
    }
}

impl Conversation {
    /// Returns the user's most recent conversation, creating one when none
    /// exists. Concurrent first turns may both insert; that is fine, later
    /// turns settle on the newest row.
    pub async fn latest_or_create(pool: &PgPool, user_id: &str) -> Result<Self, ApiError> {
        if let Some(conversation) = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT * FROM conversations
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        {
            debug!("Conversation found: {:?}", conversation.id);
            return Ok(conversation);
        }

        let conversation = Conversation {
            user_id: user_id.to_string(),
            ..Default::default()
        };
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (id, user_id, created_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(conversation.id)
        .bind(&conversation.user_id)
        .bind(conversation.created_at)
        .fetch_one(pool)
        .await?;

        debug!("Conversation created: {:?}", conversation.id);
        Ok(conversation)
    }
}
