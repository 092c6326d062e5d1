use std::sync::Arc;

use actix_web::{get, post, put, web};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::booking::{parse_visit_date, ticket_total};
use crate::models::{Booking, NewBooking, Park};
use crate::types::{
    BookingCreatedResponse, CancelBookingResponse, CreateBookingRequest, PaymentHandle,
};
use crate::AppState;

#[get("/bookings")]
async fn list_bookings(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<web::Json<Vec<Booking>>, ApiError> {
    let bookings = Booking::list_for_user(&app_state.pool, &authenticated_user.user_id).await?;
    Ok(web::Json(bookings))
}

/// Direct booking path. The posted party sizes are priced server-side from
/// the rate table; clients never supply a total.
#[post("/bookings")]
async fn create_booking(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    web::Json(request): web::Json<CreateBookingRequest>,
) -> Result<web::Json<BookingCreatedResponse>, ApiError> {
    let park = Park::find(&app_state.pool, &request.park_id).await?;
    let date = parse_visit_date(&request.date)?;

    let quantity = request.adults + request.children + request.seniors;
    let total_amount = ticket_total(request.adults, request.children, request.seniors);

    let booking = Booking::create(
        &app_state.pool,
        NewBooking {
            user_id: authenticated_user.user_id.clone(),
            conversation_id: None,
            park_id: Some(park.id.clone()),
            attraction_name: park.name.clone(),
            date,
            time_slot: request.time.clone(),
            adults: request.adults,
            children: request.children,
            seniors: request.seniors,
            quantity,
            total_amount,
        },
    )
    .await?;

    let payment_details = PaymentHandle {
        booking_id: booking.id,
        amount: booking.total_amount,
        currency: "INR".to_string(),
    };

    Ok(web::Json(BookingCreatedResponse {
        success: true,
        booking,
        payment_details,
    }))
}

#[put("/bookings/{id}/cancel")]
async fn cancel_booking(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    booking_id: web::Path<Uuid>,
) -> Result<web::Json<CancelBookingResponse>, ApiError> {
    Booking::cancel(
        &app_state.pool,
        booking_id.into_inner(),
        &authenticated_user.user_id,
    )
    .await?;

    Ok(web::Json(CancelBookingResponse {
        success: true,
        message: "Booking cancelled.".to_string(),
    }))
}
