use crate::{
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::donations::DonationRepository,
        value_objects::donations::{CreateDonationRequest, VerifyDonationRequest},
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad, repositories::donations::DonationPostgres,
    },
    payments::razorpay_client::RazorpayClient,
    usecases::donations::{DonationUseCase, PaymentGateway},
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use std::sync::Arc;
use tracing::info;

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let donation_repository = DonationPostgres::new(Arc::clone(&db_pool));
    let razorpay_client = RazorpayClient::new(
        config.razorpay.key_id.clone(),
        config.razorpay.key_secret.clone(),
    );
    let donation_usecase =
        DonationUseCase::new(Arc::new(donation_repository), Arc::new(razorpay_client));

    Router::new()
        .route("/create-order", post(create_order))
        .route("/verify", post(verify))
        .with_state(Arc::new(donation_usecase))
}

pub async fn create_order<R, G>(
    State(donation_usecase): State<Arc<DonationUseCase<R, G>>>,
    Json(request): Json<CreateDonationRequest>,
) -> impl IntoResponse
where
    R: DonationRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    info!(amount = request.amount, "donations: create-order request received");
    match donation_usecase.initiate(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn verify<R, G>(
    State(donation_usecase): State<Arc<DonationUseCase<R, G>>>,
    Json(request): Json<VerifyDonationRequest>,
) -> impl IntoResponse
where
    R: DonationRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    info!("donations: verify request received");
    match donation_usecase.verify(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}
