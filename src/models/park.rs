use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::errors::ApiError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Park {
    pub id: String,
    pub name: String,
    pub location: String,
    pub description: String,
}

impl Park {
    pub async fn all(pool: &PgPool) -> Result<Vec<Self>, ApiError> {
        let parks = sqlx::query_as::<_, Park>(
            r#"
            SELECT * FROM parks
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(parks)
    }

    pub async fn find(pool: &PgPool, id: &str) -> Result<Self, ApiError> {
        sqlx::query_as::<_, Park>(
            r#"
            SELECT * FROM parks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Park not found"))
    }
}

/// Per-slot booked counters, bumped on every fresh confirmation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub park_id: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub booked: i32,
}

impl SlotAvailability {
    pub async fn increment(
        pool: &PgPool,
        park_id: &str,
        date: NaiveDate,
        time_slot: &str,
        quantity: i32,
    ) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO availability (park_id, date, time_slot, booked)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (park_id, date, time_slot)
            DO UPDATE SET booked = availability.booked + EXCLUDED.booked
            "#,
        )
        .bind(park_id)
        .bind(date)
        .bind(time_slot)
        .bind(quantity)
        .execute(pool)
        .await?;

        debug!("Availability bumped for {} {} {}", park_id, date, time_slot);
        Ok(())
    }

    pub async fn for_park_date(
        pool: &PgPool,
        park_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Self>, ApiError> {
        let slots = sqlx::query_as::<_, SlotAvailability>(
            r#"
            SELECT * FROM availability
            WHERE park_id = $1 AND date = $2
            ORDER BY time_slot
            "#,
        )
        .bind(park_id)
        .bind(date)
        .fetch_all(pool)
        .await?;

        Ok(slots)
    }
}
