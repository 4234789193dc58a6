use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    domain::{
        entities::donations::InsertDonationEntity,
        repositories::donations::DonationRepository,
        value_objects::{
            donations::{
                CreateDonationRequest, CreateDonationResponse, VerifyDonationRequest,
                VerifyDonationResponse,
            },
            enums::donation_statuses::DonationStatus,
        },
    },
    payments::razorpay_client::{RazorpayClient, RazorpayOrder},
};

pub const DEFAULT_CURRENCY: &str = "INR";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
        notes: Option<HashMap<String, String>>,
    ) -> AnyResult<RazorpayOrder>;

    fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;

    fn key_id(&self) -> &str;
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
        notes: Option<HashMap<String, String>>,
    ) -> AnyResult<RazorpayOrder> {
        self.create_order(amount_minor, currency, receipt, notes)
            .await
    }

    fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        self.verify_payment_signature(order_id, payment_id, signature)
    }

    fn key_id(&self) -> &str {
        self.key_id()
    }
}

#[derive(Debug, Error)]
pub enum DonationError {
    #[error("amount must be a positive number")]
    InvalidAmount,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("donation id is not a valid uuid")]
    InvalidDonationId,
    #[error("donation not found")]
    DonationNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DonationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            DonationError::InvalidAmount
            | DonationError::MissingField(_)
            | DonationError::InvalidDonationId => StatusCode::BAD_REQUEST,
            DonationError::DonationNotFound => StatusCode::NOT_FOUND,
            DonationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, DonationError>;

pub struct DonationUseCase<R, G>
where
    R: DonationRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    donation_repo: Arc<R>,
    gateway: Arc<G>,
}

impl<R, G> DonationUseCase<R, G>
where
    R: DonationRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(donation_repo: Arc<R>, gateway: Arc<G>) -> Self {
        Self {
            donation_repo,
            gateway,
        }
    }

    /// Creates a gateway order and persists the donation in `created` status.
    pub async fn initiate(
        &self,
        request: CreateDonationRequest,
    ) -> UseCaseResult<CreateDonationResponse> {
        if !request.amount.is_finite() || request.amount <= 0.0 {
            let err = DonationError::InvalidAmount;
            warn!(
                amount = request.amount,
                status = err.status_code().as_u16(),
                "donations: rejected invalid amount"
            );
            return Err(err);
        }

        let amount_minor = (request.amount * 100.0).round() as i64;
        let currency = request
            .currency
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        let receipt = format!("rcpt_{}", Uuid::new_v4().simple());

        info!(
            amount_minor,
            currency = %currency,
            receipt = %receipt,
            "donations: creating gateway order"
        );

        let order = self
            .gateway
            .create_order(amount_minor, &currency, &receipt, request.notes.clone())
            .await
            .map_err(|err| {
                error!(
                    amount_minor,
                    currency = %currency,
                    receipt = %receipt,
                    error = ?err,
                    "donations: gateway order creation failed"
                );
                DonationError::Internal(err)
            })?;

        let donation = InsertDonationEntity {
            donor_name: request.donor_name,
            donor_email: request.donor_email,
            user_id: None,
            amount_minor,
            currency: order.currency.clone(),
            status: DonationStatus::Created.to_string(),
            order_id: Some(order.id.clone()),
            notes: request
                .notes
                .map(|notes| {
                    Value::Object(
                        notes
                            .into_iter()
                            .map(|(key, value)| (key, Value::String(value)))
                            .collect(),
                    )
                })
                .unwrap_or_else(|| Value::Object(Map::new())),
        };

        let donation_id = self
            .donation_repo
            .create_donation(donation)
            .await
            .map_err(|err| {
                error!(
                    order_id = %order.id,
                    db_error = ?err,
                    "donations: failed to persist donation record"
                );
                DonationError::Internal(err)
            })?;

        info!(
            %donation_id,
            order_id = %order.id,
            amount_minor,
            "donations: order created"
        );

        Ok(CreateDonationResponse {
            success: true,
            order_id: order.id,
            amount_paise: amount_minor,
            currency: order.currency,
            key_id: self.gateway.key_id().to_string(),
            donation_id,
        })
    }

    /// Checks the callback signature and records the outcome on the donation.
    /// An invalid signature is a normal outcome (`success: false`), not an error;
    /// the failed attempt is persisted as well.
    pub async fn verify(
        &self,
        request: VerifyDonationRequest,
    ) -> UseCaseResult<VerifyDonationResponse> {
        let donation_id = Self::require_field(request.donation_id.as_deref(), "donationId")?;
        let order_id = Self::require_field(request.order_id.as_deref(), "orderId")?;
        let payment_id = Self::require_field(request.payment_id.as_deref(), "paymentId")?;
        let signature = Self::require_field(request.signature.as_deref(), "signature")?;

        let donation_id = Uuid::parse_str(donation_id).map_err(|_| {
            let err = DonationError::InvalidDonationId;
            warn!(
                donation_id,
                status = err.status_code().as_u16(),
                "donations: malformed donation id in verify request"
            );
            err
        })?;

        let donation = self
            .donation_repo
            .find_donation_by_id(donation_id)
            .await
            .map_err(|err| {
                error!(
                    %donation_id,
                    db_error = ?err,
                    "donations: failed to load donation for verification"
                );
                DonationError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = DonationError::DonationNotFound;
                warn!(
                    %donation_id,
                    status = err.status_code().as_u16(),
                    "donations: unknown donation id in verify request"
                );
                err
            })?;

        if let Some(current) = DonationStatus::from_str(&donation.status) {
            if current != DonationStatus::Created {
                warn!(
                    %donation_id,
                    current_status = %current,
                    "donations: verify called on an already finalized donation"
                );
            }
        }

        let valid = self
            .gateway
            .verify_payment_signature(order_id, payment_id, signature);
        let status = if valid {
            DonationStatus::Paid
        } else {
            DonationStatus::Failed
        };

        self.donation_repo
            .record_verification(
                donation.id,
                payment_id.to_string(),
                signature.to_string(),
                status,
            )
            .await
            .map_err(|err| {
                error!(
                    %donation_id,
                    db_error = ?err,
                    "donations: failed to record verification outcome"
                );
                DonationError::Internal(err)
            })?;

        info!(
            %donation_id,
            order_id,
            valid,
            status = %status,
            "donations: verification recorded"
        );

        Ok(VerifyDonationResponse { success: valid })
    }

    fn require_field<'a>(
        value: Option<&'a str>,
        name: &'static str,
    ) -> UseCaseResult<&'a str> {
        match value {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => {
                let err = DonationError::MissingField(name);
                warn!(
                    field = name,
                    status = err.status_code().as_u16(),
                    "donations: verify request missing required field"
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::donations::DonationEntity;
    use crate::domain::repositories::donations::MockDonationRepository;
    use anyhow::anyhow;
    use chrono::Utc;

    fn usecase(
        repo: MockDonationRepository,
        gateway: MockPaymentGateway,
    ) -> DonationUseCase<MockDonationRepository, MockPaymentGateway> {
        DonationUseCase::new(Arc::new(repo), Arc::new(gateway))
    }

    fn create_request(amount: f64) -> CreateDonationRequest {
        CreateDonationRequest {
            amount,
            currency: None,
            donor_name: Some("Asha".to_string()),
            donor_email: Some("asha@example.com".to_string()),
            notes: None,
        }
    }

    fn verify_request(donation_id: &str) -> VerifyDonationRequest {
        VerifyDonationRequest {
            donation_id: Some(donation_id.to_string()),
            order_id: Some("order_test_123".to_string()),
            payment_id: Some("pay_test_456".to_string()),
            signature: Some("ab".repeat(32)),
        }
    }

    fn donation_entity(id: Uuid) -> DonationEntity {
        DonationEntity {
            id,
            donor_name: Some("Asha".to_string()),
            donor_email: Some("asha@example.com".to_string()),
            user_id: None,
            amount_minor: 25_000,
            currency: "INR".to_string(),
            status: DonationStatus::Created.to_string(),
            order_id: Some("order_test_123".to_string()),
            payment_id: None,
            signature: None,
            notes: Value::Object(Map::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_initiate_persists_minor_units_and_created_status() {
        let donation_id = Uuid::new_v4();

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_order()
            .withf(|amount_minor, currency, receipt, _notes| {
                *amount_minor == 25_137 && currency == "INR" && receipt.starts_with("rcpt_")
            })
            .returning(|amount_minor, currency, _, _| {
                Ok(RazorpayOrder {
                    id: "order_test_123".to_string(),
                    amount: amount_minor,
                    currency: currency.to_string(),
                })
            });
        gateway
            .expect_key_id()
            .return_const("rzp_test_key".to_string());

        let mut repo = MockDonationRepository::new();
        repo.expect_create_donation()
            .withf(|donation| {
                donation.amount_minor == 25_137
                    && donation.status == "created"
                    && donation.order_id.as_deref() == Some("order_test_123")
                    && donation.currency == "INR"
            })
            .returning(move |_| Ok(donation_id));

        let response = usecase(repo, gateway)
            .initiate(create_request(251.37))
            .await
            .expect("initiate should succeed");

        assert!(response.success);
        assert_eq!(response.order_id, "order_test_123");
        assert_eq!(response.amount_paise, 25_137);
        assert_eq!(response.currency, "INR");
        assert_eq!(response.key_id, "rzp_test_key");
        assert_eq!(response.donation_id, donation_id);
    }

    #[tokio::test]
    async fn test_initiate_rejects_non_positive_amount_before_gateway_call() {
        for amount in [0.0, -5.0, f64::NAN] {
            // No expectations registered: any gateway or repo call panics the mock.
            let result = usecase(MockDonationRepository::new(), MockPaymentGateway::new())
                .initiate(create_request(amount))
                .await;

            let err = result.expect_err("non-positive amount must be rejected");
            assert!(matches!(err, DonationError::InvalidAmount));
            assert_eq!(err.status_code().as_u16(), 400);
        }
    }

    #[tokio::test]
    async fn test_initiate_gateway_failure_is_generic_server_error() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_order()
            .returning(|_, _, _, _| Err(anyhow!("gateway credentials rejected")));

        let result = usecase(MockDonationRepository::new(), gateway)
            .initiate(create_request(100.0))
            .await;

        let err = result.expect_err("gateway failure must propagate as server error");
        assert!(matches!(err, DonationError::Internal(_)));
        assert_eq!(err.status_code().as_u16(), 500);
    }

    #[tokio::test]
    async fn test_verify_valid_signature_marks_paid() {
        let donation_id = Uuid::new_v4();

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_verify_payment_signature()
            .returning(|_, _, _| true);

        let mut repo = MockDonationRepository::new();
        repo.expect_find_donation_by_id()
            .returning(move |id| Ok(Some(donation_entity(id))));
        repo.expect_record_verification()
            .withf(move |id, payment_id, signature, status| {
                *id == donation_id
                    && payment_id == "pay_test_456"
                    && !signature.is_empty()
                    && *status == DonationStatus::Paid
            })
            .returning(|_, _, _, _| Ok(()));

        let response = usecase(repo, gateway)
            .verify(verify_request(&donation_id.to_string()))
            .await
            .expect("verify should succeed");

        assert!(response.success);
    }

    #[tokio::test]
    async fn test_verify_invalid_signature_marks_failed_and_still_writes() {
        let donation_id = Uuid::new_v4();

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_verify_payment_signature()
            .returning(|_, _, _| false);

        let mut repo = MockDonationRepository::new();
        repo.expect_find_donation_by_id()
            .returning(move |id| Ok(Some(donation_entity(id))));
        repo.expect_record_verification()
            .withf(|_, payment_id, _, status| {
                payment_id == "pay_test_456" && *status == DonationStatus::Failed
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let response = usecase(repo, gateway)
            .verify(verify_request(&donation_id.to_string()))
            .await
            .expect("invalid signature is a normal outcome");

        assert!(!response.success);
    }

    #[tokio::test]
    async fn test_verify_unknown_donation_is_not_found_without_write() {
        let mut repo = MockDonationRepository::new();
        repo.expect_find_donation_by_id().returning(|_| Ok(None));
        repo.expect_record_verification().never();

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_verify_payment_signature().never();

        let result = usecase(repo, gateway)
            .verify(verify_request(&Uuid::new_v4().to_string()))
            .await;

        let err = result.expect_err("unknown donation id must be not-found");
        assert!(matches!(err, DonationError::DonationNotFound));
        assert_eq!(err.status_code().as_u16(), 404);
    }

    #[tokio::test]
    async fn test_verify_missing_field_short_circuits() {
        let mut request = verify_request(&Uuid::new_v4().to_string());
        request.signature = None;

        // No expectations: any lookup or signature computation panics the mock.
        let result = usecase(MockDonationRepository::new(), MockPaymentGateway::new())
            .verify(request)
            .await;

        let err = result.expect_err("missing field must be a client error");
        assert!(matches!(err, DonationError::MissingField("signature")));
        assert_eq!(err.status_code().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_verify_blank_field_is_rejected() {
        let mut request = verify_request(&Uuid::new_v4().to_string());
        request.order_id = Some("   ".to_string());

        let result = usecase(MockDonationRepository::new(), MockPaymentGateway::new())
            .verify(request)
            .await;

        let err = result.expect_err("blank field must be a client error");
        assert!(matches!(err, DonationError::MissingField("orderId")));
    }

    #[tokio::test]
    async fn test_verify_malformed_donation_id_is_client_error() {
        let result = usecase(MockDonationRepository::new(), MockPaymentGateway::new())
            .verify(verify_request("not-a-uuid"))
            .await;

        let err = result.expect_err("malformed donation id must be a client error");
        assert!(matches!(err, DonationError::InvalidDonationId));
        assert_eq!(err.status_code().as_u16(), 400);
    }
}
