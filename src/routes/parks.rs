use std::sync::Arc;

use actix_web::{get, web};
use serde::Deserialize;

use crate::errors::ApiError;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::booking::parse_visit_date;
use crate::models::{Park, SlotAvailability};
use crate::AppState;

#[derive(Deserialize)]
struct AvailabilityQuery {
    date: String,
}

/// Park catalog. Public, so the pre-login UI can render it.
#[get("/parks")]
async fn list_parks(
    app_state: web::Data<Arc<AppState>>,
) -> Result<web::Json<Vec<Park>>, ApiError> {
    let parks = Park::all(&app_state.pool).await?;
    Ok(web::Json(parks))
}

/// Booked counters per slot for one park and day. Slots with no bookings yet
/// have no row.
#[get("/parks/{id}/availability")]
async fn park_availability(
    app_state: web::Data<Arc<AppState>>,
    _authenticated_user: AuthenticatedUser,
    park_id: web::Path<String>,
    query: web::Query<AvailabilityQuery>,
) -> Result<web::Json<Vec<SlotAvailability>>, ApiError> {
    let park = Park::find(&app_state.pool, &park_id).await?;
    let date = parse_visit_date(&query.date)?;
    let slots = SlotAvailability::for_park_date(&app_state.pool, &park.id, date).await?;
    Ok(web::Json(slots))
}
