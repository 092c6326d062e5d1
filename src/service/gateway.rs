use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::errors::ApiError;

const DEFAULT_BASE_URL: &str = "https://api.razorpay.com";

/// Order record returned by the payment gateway. Amounts are in minor units
/// (paise for INR).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: Option<String>,
}

/// Razorpay Orders API client.
#[derive(Clone)]
pub struct RazorpayClient {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
    base_url: String,
}

impl RazorpayClient {
    pub fn new(http: reqwest::Client, key_id: String, key_secret: String) -> Self {
        RazorpayClient {
            http,
            key_id,
            key_secret,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn key_secret(&self) -> &str {
        &self.key_secret
    }

    pub async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, ApiError> {
        let response = self
            .http
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": amount_minor,
                "currency": currency,
                "receipt": receipt,
                "payment_capture": 1,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Gateway order creation failed ({}): {}", status, body);
            return Err(ApiError::upstream(format!("Gateway returned {}", status)));
        }

        let order = response.json::<GatewayOrder>().await?;
        debug!("Gateway order created: {}", order.id);
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_order_maps_the_api_payload() {
        let order: GatewayOrder = serde_json::from_str(
            r#"{
                "id": "order_Nxq3gBl7aAbcde",
                "entity": "order",
                "amount": 260000,
                "amount_paid": 0,
                "currency": "INR",
                "receipt": "rcpt_1",
                "status": "created"
            }"#,
        )
        .unwrap();
        assert_eq!(order.id, "order_Nxq3gBl7aAbcde");
        assert_eq!(order.amount, 260000);
        assert_eq!(order.currency, "INR");
        assert_eq!(order.receipt.as_deref(), Some("rcpt_1"));
        assert_eq!(order.status.as_deref(), Some("created"));
    }
}
