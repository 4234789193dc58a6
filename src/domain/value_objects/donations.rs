use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Wire format is camelCase to match the checkout widget's payloads.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationRequest {
    /// Amount in major currency units (rupees), converted to minor units internally.
    pub amount: f64,
    pub currency: Option<String>,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub notes: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationResponse {
    pub success: bool,
    pub order_id: String,
    pub amount_paise: i64,
    pub currency: String,
    pub key_id: String,
    pub donation_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDonationRequest {
    pub donation_id: Option<String>,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyDonationResponse {
    pub success: bool,
}
