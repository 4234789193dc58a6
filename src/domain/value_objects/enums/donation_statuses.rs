use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DonationStatus {
    Created,
    Paid,
    Failed,
    // Reserved for the administrative refund path; no code transition reaches it.
    Refunded,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Created => "created",
            DonationStatus::Paid => "paid",
            DonationStatus::Failed => "failed",
            DonationStatus::Refunded => "refunded",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "created" => Some(DonationStatus::Created),
            "paid" => Some(DonationStatus::Paid),
            "failed" => Some(DonationStatus::Failed),
            "refunded" => Some(DonationStatus::Refunded),
            _ => None,
        }
    }
}

impl Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_matches_persisted_values() {
        for status in [
            DonationStatus::Created,
            DonationStatus::Paid,
            DonationStatus::Failed,
            DonationStatus::Refunded,
        ] {
            assert_eq!(DonationStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(DonationStatus::from_str("pending"), None);
    }
}
