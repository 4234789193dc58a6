use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::donations;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = donations)]
pub struct DonationEntity {
    pub id: Uuid,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub user_id: Option<Uuid>,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
    pub notes: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = donations)]
pub struct InsertDonationEntity {
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub user_id: Option<Uuid>,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub order_id: Option<String>,
    pub notes: Value,
}
