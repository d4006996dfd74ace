//! Razorpay Orders API client.
//!
//! The storefront only needs order creation; everything else arrives through
//! the webhook.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RazorpayConfig;

/// Razorpay API base URL.
const BASE_URL: &str = "https://api.razorpay.com/v1";

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("gateway error: {status} - {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    /// Amount in the currency's minor unit (paise for INR).
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// An order as returned by the Razorpay API.
#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    /// Gateway order reference, e.g. `order_IluGWxBm9U8zJ8`.
    pub id: String,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
}

/// Razorpay Orders API client.
#[derive(Clone)]
pub struct RazorpayClient {
    client: reqwest::Client,
    key_id: String,
    key_secret: SecretString,
}

impl RazorpayClient {
    /// Create a new client from configuration.
    #[must_use]
    pub fn new(config: &RazorpayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        }
    }

    /// The public key ID, needed by the checkout widget.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create a gateway order for `amount_minor` minor units of `currency`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Api` for non-success responses and
    /// `GatewayError::Http` for transport failures.
    pub async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<RazorpayOrder, GatewayError> {
        let request = CreateOrderRequest {
            amount: amount_minor,
            currency,
            receipt,
        };

        let response = self
            .client
            .post(format!("{BASE_URL}/orders"))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let order: RazorpayOrder = response.json().await?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_response_deserializes() {
        let json = r#"{
            "id": "order_IluGWxBm9U8zJ8",
            "entity": "order",
            "amount": 49900,
            "amount_paid": 0,
            "currency": "INR",
            "receipt": "order-17",
            "status": "created"
        }"#;

        let order: RazorpayOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, "order_IluGWxBm9U8zJ8");
        assert_eq!(order.amount, 49_900);
        assert_eq!(order.currency, "INR");
    }

    #[test]
    fn create_request_serializes_minor_units() {
        let request = CreateOrderRequest {
            amount: 49_900,
            currency: "INR",
            receipt: "order-17",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["amount"], 49_900);
        assert_eq!(json["currency"], "INR");
    }
}
