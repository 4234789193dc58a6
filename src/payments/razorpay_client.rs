use std::collections::HashMap;

use anyhow::Result;
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

const ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

/// Minimal Razorpay Orders API client built on reqwest.
pub struct RazorpayClient {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorEnvelope {
    error: RazorpayErrorDetails,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetails {
    code: Option<String>,
    description: Option<String>,
    field: Option<String>,
}

impl RazorpayClient {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id,
            key_secret,
        }
    }

    /// The publishable key id, needed by the client-side checkout widget.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (razorpay_error_code, razorpay_error_description, razorpay_error_field) =
            match serde_json::from_str::<RazorpayErrorEnvelope>(&body) {
                Ok(envelope) => {
                    let details = envelope.error;
                    (details.code, details.description, details.field)
                }
                Err(_) => (None, None, None),
            };

        error!(
            status = %status,
            razorpay_error_code = ?razorpay_error_code,
            razorpay_error_description = ?razorpay_error_description,
            razorpay_error_field = ?razorpay_error_field,
            response_body = %body,
            context = %context,
            "razorpay api request failed"
        );

        anyhow::bail!(
            "Razorpay API request failed: {} (status {})",
            context,
            status
        );
    }

    /// Creates a gateway order. https://razorpay.com/docs/api/orders/create
    ///
    /// Not idempotent: each call reserves a new order on the gateway side.
    pub async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
        notes: Option<HashMap<String, String>>,
    ) -> Result<RazorpayOrder> {
        let body = CreateOrderBody {
            amount: amount_minor,
            currency,
            receipt,
            notes: notes.as_ref(),
        };

        let resp = self
            .http
            .post(ORDERS_URL)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create order").await?;

        let order: RazorpayOrder = resp.json().await?;
        Ok(order)
    }

    /// Verifies the checkout callback signature: HMAC-SHA256 over
    /// `"{order_id}|{payment_id}"` keyed by the secret, hex-encoded.
    /// https://razorpay.com/docs/payments/payment-gateway/web-integration/standard/build-integration#verify-signature
    ///
    /// Comparison goes through `Mac::verify_slice`, which is constant-time.
    pub fn verify_payment_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> bool {
        let mut mac = match HmacSha256::new_from_slice(self.key_secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(format!("{order_id}|{payment_id}").as_bytes());

        let provided = match hex::decode(signature) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        mac.verify_slice(&provided).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> RazorpayClient {
        RazorpayClient::new(
            "rzp_test_key".to_string(),
            "supersecretkeyforunittesting123".to_string(),
        )
    }

    fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_verify_payment_signature_success() {
        let client = test_client();
        let signature = sign(
            "supersecretkeyforunittesting123",
            "order_test_123",
            "pay_test_456",
        );

        assert!(client.verify_payment_signature("order_test_123", "pay_test_456", &signature));
    }

    #[test]
    fn test_verify_payment_signature_altered_byte() {
        let client = test_client();
        let signature = sign(
            "supersecretkeyforunittesting123",
            "order_test_123",
            "pay_test_456",
        );

        let mut altered = signature.into_bytes();
        altered[0] = if altered[0] == b'0' { b'1' } else { b'0' };
        let altered = String::from_utf8(altered).unwrap();

        assert!(!client.verify_payment_signature("order_test_123", "pay_test_456", &altered));
    }

    #[test]
    fn test_verify_payment_signature_wrong_order() {
        let client = test_client();
        let signature = sign(
            "supersecretkeyforunittesting123",
            "order_test_123",
            "pay_test_456",
        );

        assert!(!client.verify_payment_signature("order_test_other", "pay_test_456", &signature));
    }

    #[test]
    fn test_verify_payment_signature_wrong_secret() {
        let client = test_client();
        let signature = sign("someothersecret", "order_test_123", "pay_test_456");

        assert!(!client.verify_payment_signature("order_test_123", "pay_test_456", &signature));
    }

    #[test]
    fn test_verify_payment_signature_not_hex() {
        let client = test_client();

        assert!(!client.verify_payment_signature("order_test_123", "pay_test_456", "zz-not-hex"));
    }
}
