//! Rating handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentCustomer;
use crate::services::rating::{AddRatingInput, ReviewView};
use crate::services::RatingService;
use crate::AppState;
use shared::{Rating, RatingSummary};

#[derive(Serialize)]
pub struct AddRatingResponse {
    pub message: String,
    pub rating: Rating,
}

/// Submit a rating; gated on a completed or customer-cancelled request.
pub async fn add_rating(
    State(state): State<AppState>,
    current: CurrentCustomer,
    Json(body): Json<AddRatingInput>,
) -> AppResult<(StatusCode, Json<AddRatingResponse>)> {
    let service = RatingService::new(state.db.clone());
    let rating = service.add(current.0.user_id, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(AddRatingResponse {
            message: "Rating submitted successfully".to_string(),
            rating,
        }),
    ))
}

/// All reviews for a provider, newest first.
pub async fn provider_reviews(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
) -> AppResult<Json<Vec<ReviewView>>> {
    let service = RatingService::new(state.db.clone());
    let reviews = service.reviews(provider_id).await?;
    Ok(Json(reviews))
}

/// Aggregate rating for a provider; zeros when unrated.
pub async fn provider_average_rating(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
) -> AppResult<Json<RatingSummary>> {
    let service = RatingService::new(state.db.clone());
    let summary = service.average(provider_id).await?;
    Ok(Json(summary))
}
