use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Type};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::ApiError;

/// Ticket rates in rupees, the pricing authority for both entry paths.
pub const ADULT_RATE: f64 = 1000.0;
pub const CHILD_RATE: f64 = 600.0;
pub const SENIOR_RATE: f64 = 800.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Payment confirmation applies only to pending bookings; there is no
    /// edge back from cancelled.
    pub fn can_confirm(self) -> bool {
        matches!(self, BookingStatus::Pending)
    }

    /// Users may cancel only bookings that are currently confirmed.
    pub fn can_cancel(self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }
}

pub fn ticket_total(adults: u32, children: u32, seniors: u32) -> f64 {
    f64::from(adults) * ADULT_RATE + f64::from(children) * CHILD_RATE + f64::from(seniors) * SENIOR_RATE
}

/// Gateway orders are denominated in minor units (paise).
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Visit dates arrive as "YYYY-MM-DD" strings from both entry paths.
pub fn parse_visit_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("Invalid date: {raw}")))
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub conversation_id: Option<Uuid>,
    pub park_id: Option<String>,
    pub attraction_name: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub adults: i32,
    pub children: i32,
    pub seniors: i32,
    pub quantity: i32,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub payment_id: Option<String>,
    pub gateway_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Booking {
    fn default() -> Self {
        Booking {
            id: Uuid::new_v4(),
            user_id: String::new(),
            conversation_id: None,
            park_id: None,
            attraction_name: String::new(),
            date: NaiveDate::default(),
            time_slot: String::new(),
            adults: 0,
            children: 0,
            seniors: 0,
            quantity: 0,
            total_amount: 0.0,
            status: BookingStatus::Pending,
            payment_id: None,
            gateway_order_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// Input for a new pending booking, already priced server-side.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: String,
    pub conversation_id: Option<Uuid>,
    pub park_id: Option<String>,
    pub attraction_name: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub adults: u32,
    pub children: u32,
    pub seniors: u32,
    pub quantity: u32,
    pub total_amount: f64,
}

impl NewBooking {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.attraction_name.trim().is_empty() {
            return Err(ApiError::validation("Attraction name is required"));
        }
        if self.time_slot.trim().is_empty() {
            return Err(ApiError::validation("Time slot is required"));
        }
        if self.quantity == 0 {
            return Err(ApiError::validation("At least one ticket is required"));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfirmOutcome {
    /// The conditional write flipped pending to confirmed just now.
    Confirmed(Booking),
    /// A previous callback already confirmed it; treat as success, skip side
    /// effects.
    AlreadyConfirmed(Booking),
}

impl Booking {
    pub async fn create(pool: &PgPool, new: NewBooking) -> Result<Self, ApiError> {
        new.validate()?;

        let booking = Booking {
            user_id: new.user_id,
            conversation_id: new.conversation_id,
            park_id: new.park_id,
            attraction_name: new.attraction_name,
            date: new.date,
            time_slot: new.time_slot,
            adults: new.adults as i32,
            children: new.children as i32,
            seniors: new.seniors as i32,
            quantity: new.quantity as i32,
            total_amount: new.total_amount,
            ..Default::default()
        };

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (id, user_id, conversation_id, park_id, attraction_name, date,
                                  time_slot, adults, children, seniors, quantity, total_amount,
                                  status, payment_id, gateway_order_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(&booking.user_id)
        .bind(booking.conversation_id)
        .bind(&booking.park_id)
        .bind(&booking.attraction_name)
        .bind(booking.date)
        .bind(&booking.time_slot)
        .bind(booking.adults)
        .bind(booking.children)
        .bind(booking.seniors)
        .bind(booking.quantity)
        .bind(booking.total_amount)
        .bind(booking.status)
        .bind(&booking.payment_id)
        .bind(&booking.gateway_order_id)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .fetch_one(pool)
        .await?;

        debug!("Booking created: {:?}", booking.id);
        Ok(booking)
    }

    /// All bookings of the caller, most recent first.
    pub async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Self>, ApiError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(bookings)
    }

    pub async fn find_for_user(pool: &PgPool, id: Uuid, user_id: &str) -> Result<Self, ApiError> {
        sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))
    }

    /// Records the gateway order id on the caller's booking. Idempotent;
    /// status is untouched.
    pub async fn attach_gateway_order(
        pool: &PgPool,
        id: Uuid,
        user_id: &str,
        order_id: &str,
    ) -> Result<Self, ApiError> {
        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET gateway_order_id = $1, updated_at = $2
            WHERE id = $3 AND user_id = $4
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        updated.ok_or_else(|| ApiError::not_found("Booking not found"))
    }

    /// Flips a pending booking to confirmed in one conditional write,
    /// recording the gateway payment id. Duplicate callbacks land in the
    /// no-row-matched branch and report idempotent success instead of
    /// re-running side effects.
    pub async fn confirm(
        pool: &PgPool,
        id: Uuid,
        user_id: &str,
        payment_id: &str,
    ) -> Result<ConfirmOutcome, ApiError> {
        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = 'confirmed', payment_id = $1, updated_at = $2
            WHERE id = $3 AND user_id = $4 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        if let Some(booking) = updated {
            debug!("Booking confirmed: {:?}", booking.id);
            return Ok(ConfirmOutcome::Confirmed(booking));
        }

        let existing = Self::find_for_user(pool, id, user_id).await?;
        if existing.status == BookingStatus::Confirmed {
            debug!("Booking already confirmed: {:?}", existing.id);
            Ok(ConfirmOutcome::AlreadyConfirmed(existing))
        } else {
            // Cancelled bookings are not confirmable; no edge back.
            Err(ApiError::not_found("Booking not found"))
        }
    }

    /// Cancels a confirmed booking via the same conditional-write pattern.
    pub async fn cancel(pool: &PgPool, id: Uuid, user_id: &str) -> Result<Self, ApiError> {
        let updated = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = 'cancelled', updated_at = $1
            WHERE id = $2 AND user_id = $3 AND status = 'confirmed'
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        if let Some(booking) = updated {
            debug!("Booking cancelled: {:?}", booking.id);
            return Ok(booking);
        }

        let existing = Self::find_for_user(pool, id, user_id).await?;
        warn!(
            "Cancel rejected for booking {} in state {:?}",
            existing.id, existing.status
        );
        Err(ApiError::invalid_state("Only confirmed bookings can be cancelled"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_table_matches_the_posted_rates() {
        assert_eq!(ticket_total(2, 1, 0), 2600.0);
        assert_eq!(ticket_total(0, 0, 0), 0.0);
        assert_eq!(ticket_total(1, 1, 1), 2400.0);
        assert_eq!(ticket_total(3, 0, 2), 4600.0);
    }

    #[test]
    fn minor_unit_conversion_rounds() {
        assert_eq!(to_minor_units(2600.0), 260000);
        assert_eq!(to_minor_units(0.0), 0);
        assert_eq!(to_minor_units(123.45), 12345);
    }

    #[test]
    fn only_pending_is_confirmable() {
        assert!(BookingStatus::Pending.can_confirm());
        assert!(!BookingStatus::Confirmed.can_confirm());
        assert!(!BookingStatus::Cancelled.can_confirm());
    }

    #[test]
    fn only_confirmed_is_cancellable() {
        assert!(!BookingStatus::Pending.can_cancel());
        assert!(BookingStatus::Confirmed.can_cancel());
        assert!(!BookingStatus::Cancelled.can_cancel());
    }

    #[test]
    fn visit_dates_parse_strictly() {
        assert_eq!(
            parse_visit_date("2025-07-15").unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()
        );
        assert_eq!(
            parse_visit_date(" 2025-07-15 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()
        );
        assert!(parse_visit_date("next friday").is_err());
        assert!(parse_visit_date("15-07-2025").is_err());
        assert!(parse_visit_date("").is_err());
    }

    fn sample_new_booking() -> NewBooking {
        NewBooking {
            user_id: "user-1".to_string(),
            conversation_id: None,
            park_id: Some("p1".to_string()),
            attraction_name: "VGP Universal Kingdom".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            time_slot: "10:00 AM".to_string(),
            adults: 2,
            children: 1,
            seniors: 0,
            quantity: 3,
            total_amount: 2600.0,
        }
    }

    #[test]
    fn validation_requires_the_minimum_fields() {
        assert!(sample_new_booking().validate().is_ok());

        let mut missing_attraction = sample_new_booking();
        missing_attraction.attraction_name = "  ".to_string();
        assert!(missing_attraction.validate().is_err());

        let mut missing_slot = sample_new_booking();
        missing_slot.time_slot = String::new();
        assert!(missing_slot.validate().is_err());

        let mut no_tickets = sample_new_booking();
        no_tickets.quantity = 0;
        assert!(no_tickets.validate().is_err());
    }
}
