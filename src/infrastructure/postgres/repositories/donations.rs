use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::donations::{DonationEntity, InsertDonationEntity},
        repositories::donations::DonationRepository,
        value_objects::enums::donation_statuses::DonationStatus,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::donations},
};

pub struct DonationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl DonationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl DonationRepository for DonationPostgres {
    async fn create_donation(&self, donation: InsertDonationEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The partial unique index on order_id turns a colliding gateway order id
        // into an insert error instead of a silent overwrite.
        let donation_id = insert_into(donations::table)
            .values(&donation)
            .returning(donations::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(donation_id)
    }

    async fn find_donation_by_id(&self, donation_id: Uuid) -> Result<Option<DonationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let donation = donations::table
            .filter(donations::id.eq(donation_id))
            .select(DonationEntity::as_select())
            .first::<DonationEntity>(&mut conn)
            .optional()?;

        Ok(donation)
    }

    async fn record_verification(
        &self,
        donation_id: Uuid,
        payment_id: String,
        signature: String,
        status: DonationStatus,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(donations::table)
            .filter(donations::id.eq(donation_id))
            .set((
                donations::payment_id.eq(Some(payment_id)),
                donations::signature.eq(Some(signature)),
                donations::status.eq(status.to_string()),
                donations::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
