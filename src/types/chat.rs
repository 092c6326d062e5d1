use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Handle the frontend needs to start a payment for a freshly created booking.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHandle {
    pub booking_id: Uuid,
    pub amount: f64,
    pub currency: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub action: Option<Value>,
    pub payment_details: Option<PaymentHandle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_response_serializes_camel_case_with_explicit_nulls() {
        let reply = ChatResponse {
            response: "Sure!".to_string(),
            action: None,
            payment_details: None,
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["response"], "Sure!");
        assert!(json["action"].is_null());
        assert!(json["paymentDetails"].is_null());
        assert!(json.get("payment_details").is_none());
    }

    #[test]
    fn payment_handle_uses_camel_case_booking_id() {
        let handle = PaymentHandle {
            booking_id: Uuid::nil(),
            amount: 2600.0,
            currency: "INR".to_string(),
        };
        let json = serde_json::to_value(&handle).unwrap();
        assert!(json.get("bookingId").is_some());
        assert_eq!(json["amount"], 2600.0);
    }
}
