use std::sync::Arc;

use actix_web::{post, web};
use tracing::{debug, error, warn};

use crate::errors::ApiError;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::booking::to_minor_units;
use crate::models::{Booking, ConfirmOutcome, Park, SlotAvailability};
use crate::service::notify::ConfirmationNotice;
use crate::service::signature::verify_payment_signature;
use crate::types::{
    CreateOrderRequest, CreateOrderResponse, VerifyPaymentRequest, VerifyPaymentResponse,
};
use crate::AppState;

/// Creates a gateway order for a booking the caller owns. Ownership is
/// checked before anything leaves the process.
#[post("/api/create-order")]
async fn create_order(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    web::Json(request): web::Json<CreateOrderRequest>,
) -> Result<web::Json<CreateOrderResponse>, ApiError> {
    if request.amount <= 0.0 {
        return Err(ApiError::validation("Invalid bookingId or amount"));
    }

    let booking = Booking::find_for_user(
        &app_state.pool,
        request.booking_id,
        &authenticated_user.user_id,
    )
    .await?;
    if (request.amount - booking.total_amount).abs() > 0.005 {
        warn!(
            "Order amount {} differs from the stored total {} for booking {}",
            request.amount, booking.total_amount, booking.id
        );
    }

    let currency = request.currency.as_deref().unwrap_or("INR");
    let receipt = request
        .receipt
        .clone()
        .unwrap_or_else(|| booking.id.to_string());

    let order = app_state
        .gateway
        .create_order(to_minor_units(request.amount), currency, &receipt)
        .await?;

    Booking::attach_gateway_order(
        &app_state.pool,
        booking.id,
        &authenticated_user.user_id,
        &order.id,
    )
    .await?;
    debug!("Gateway order {} attached to booking {}", order.id, booking.id);

    Ok(web::Json(CreateOrderResponse { order }))
}

/// Confirms a booking once the gateway checkout reports success. The
/// signature gate runs first; a duplicate callback reads as success without
/// re-running side effects.
#[post("/api/verify-payment")]
async fn verify_payment(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    web::Json(request): web::Json<VerifyPaymentRequest>,
) -> Result<web::Json<VerifyPaymentResponse>, ApiError> {
    let signature_ok = verify_payment_signature(
        &request.razorpay_order_id,
        &request.razorpay_payment_id,
        &request.razorpay_signature,
        app_state.gateway.key_secret(),
    );
    if !signature_ok {
        warn!("Invalid payment signature for booking {}", request.booking_id);
        return Err(ApiError::SignatureMismatch);
    }
    debug!("Payment signature verified for booking {}", request.booking_id);

    let outcome = Booking::confirm(
        &app_state.pool,
        request.booking_id,
        &authenticated_user.user_id,
        &request.razorpay_payment_id,
    )
    .await?;

    let booking = match outcome {
        ConfirmOutcome::Confirmed(booking) => booking,
        ConfirmOutcome::AlreadyConfirmed(_) => {
            return Ok(web::Json(VerifyPaymentResponse {
                success: true,
                message: "Payment already verified.".to_string(),
            }));
        }
    };

    // Availability and notifications are best-effort; the payment is already
    // captured, so their failures must not fail the request.
    match &booking.park_id {
        Some(park_id) => {
            if let Err(e) = SlotAvailability::increment(
                &app_state.pool,
                park_id,
                booking.date,
                &booking.time_slot,
                booking.quantity,
            )
            .await
            {
                error!("Availability update failed for booking {}: {:?}", booking.id, e);
            }
        }
        None => {
            debug!("Booking {} has no park id; availability untouched", booking.id);
        }
    }

    let park_name = match &booking.park_id {
        Some(park_id) => Park::find(&app_state.pool, park_id)
            .await
            .ok()
            .map(|park| park.name),
        None => None,
    };

    let notice = ConfirmationNotice {
        booking_id: booking.id,
        venue: park_name.unwrap_or_else(|| booking.attraction_name.clone()),
        date: booking.date,
        time_slot: booking.time_slot.clone(),
        quantity: booking.quantity,
        total_amount: booking.total_amount,
        payment_id: booking.payment_id.clone(),
        recipient_name: authenticated_user.full_name.clone(),
        recipient_email: authenticated_user.email.clone(),
        recipient_phone: authenticated_user.phone.clone(),
    };
    let notifier = app_state.notifier.clone();
    actix_web::rt::spawn(async move {
        notifier.dispatch_confirmation(notice).await;
    });

    Ok(web::Json(VerifyPaymentResponse {
        success: true,
        message: "Payment verified. Confirmation email and SMS sent.".to_string(),
    }))
}
