//! Service request lifecycle handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentCustomer, CurrentProvider};
use crate::services::request::{CreateRequestInput, CustomerRequestView};
use crate::services::RequestService;
use crate::AppState;
use shared::ServiceRequest;

#[derive(Serialize)]
pub struct RequestResponse {
    pub message: String,
    pub request: ServiceRequest,
}

/// Create a service request for an online provider.
pub async fn create_request(
    State(state): State<AppState>,
    current: CurrentCustomer,
    Json(body): Json<CreateRequestInput>,
) -> AppResult<(StatusCode, Json<RequestResponse>)> {
    let service = RequestService::new(state.db.clone(), state.registry.clone());
    let request = service.create(current.0.user_id, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(RequestResponse {
            message: "Request sent".to_string(),
            request,
        }),
    ))
}

/// Provider accepts a pending request.
pub async fn accept_request(
    State(state): State<AppState>,
    current: CurrentProvider,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<RequestResponse>> {
    let service = RequestService::new(state.db.clone(), state.registry.clone());
    let request = service.accept(current.0.user_id, request_id).await?;
    Ok(Json(RequestResponse {
        message: "Request accepted".to_string(),
        request,
    }))
}

/// Provider rejects a pending request.
pub async fn reject_request(
    State(state): State<AppState>,
    current: CurrentProvider,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<RequestResponse>> {
    let service = RequestService::new(state.db.clone(), state.registry.clone());
    let request = service.reject(current.0.user_id, request_id).await?;
    Ok(Json(RequestResponse {
        message: "Request rejected".to_string(),
        request,
    }))
}

/// Provider marks a request complete; writes the ledger row.
pub async fn complete_request(
    State(state): State<AppState>,
    current: CurrentProvider,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<RequestResponse>> {
    let service = RequestService::new(state.db.clone(), state.registry.clone());
    let request = service.complete(current.0.user_id, request_id).await?;
    Ok(Json(RequestResponse {
        message: "Request marked as completed".to_string(),
        request,
    }))
}

/// Customer cancels their own request.
pub async fn cancel_request(
    State(state): State<AppState>,
    current: CurrentCustomer,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<RequestResponse>> {
    let service = RequestService::new(state.db.clone(), state.registry.clone());
    let request = service.cancel(current.0.user_id, request_id).await?;
    Ok(Json(RequestResponse {
        message: "Request cancelled successfully".to_string(),
        request,
    }))
}

/// The customer's accepted requests.
pub async fn my_requests(
    State(state): State<AppState>,
    current: CurrentCustomer,
) -> AppResult<Json<Vec<CustomerRequestView>>> {
    let service = RequestService::new(state.db.clone(), state.registry.clone());
    let requests = service.list_accepted_for_customer(current.0.user_id).await?;
    Ok(Json(requests))
}

/// The customer's cancelled requests.
pub async fn cancelled_requests(
    State(state): State<AppState>,
    current: CurrentCustomer,
) -> AppResult<Json<Vec<CustomerRequestView>>> {
    let service = RequestService::new(state.db.clone(), state.registry.clone());
    let requests = service
        .list_cancelled_for_customer(current.0.user_id)
        .await?;
    Ok(Json(requests))
}
