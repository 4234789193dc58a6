use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::donations::{DonationEntity, InsertDonationEntity};
use crate::domain::value_objects::enums::donation_statuses::DonationStatus;

#[automock]
#[async_trait]
pub trait DonationRepository {
    async fn create_donation(&self, donation: InsertDonationEntity) -> Result<Uuid>;

    async fn find_donation_by_id(&self, donation_id: Uuid) -> Result<Option<DonationEntity>>;

    /// Records the verification outcome. Called for failed attempts too.
    async fn record_verification(
        &self,
        donation_id: Uuid,
        payment_id: String,
        signature: String,
        status: DonationStatus,
    ) -> Result<()>;
}
