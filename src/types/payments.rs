use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::gateway::GatewayOrder;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub booking_id: Uuid,
    pub amount: f64,
    pub currency: Option<String>,
    pub receipt: Option<String>,
}

#[derive(Serialize)]
pub struct CreateOrderResponse {
    pub order: GatewayOrder,
}

// Field names follow the gateway checkout callback payload verbatim, except
// bookingId which is ours.
#[derive(Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "bookingId")]
    pub booking_id: Uuid,
}

#[derive(Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
}
