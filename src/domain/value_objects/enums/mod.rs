pub mod donation_statuses;
