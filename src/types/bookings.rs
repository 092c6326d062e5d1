use serde::{Deserialize, Serialize};

use crate::models::Booking;
use crate::types::PaymentHandle;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub park_id: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub seniors: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreatedResponse {
    pub success: bool,
    pub booking: Booking,
    pub payment_details: PaymentHandle,
}

#[derive(Serialize)]
pub struct CancelBookingResponse {
    pub success: bool,
    pub message: String,
}
