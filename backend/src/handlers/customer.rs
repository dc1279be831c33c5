//! Customer account handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::provider::{LoginResponse, MessageResponse, ResendOtpRequest, VerifyOtpRequest};
use crate::middleware::CurrentCustomer;
use crate::services::auth::RegisterCustomerInput;
use crate::services::{AuthService, NotificationService};
use crate::AppState;
use shared::{GeoPoint, Notification};

#[derive(Serialize)]
pub struct RegisterCustomerResponse {
    pub message: String,
    pub email: String,
}

/// Register a new customer; sends an OTP to the submitted email.
pub async fn register_customer(
    State(state): State<AppState>,
    Json(body): Json<RegisterCustomerInput>,
) -> AppResult<(StatusCode, Json<RegisterCustomerResponse>)> {
    let auth = AuthService::new(state.db.clone(), &state.config);
    let email = body.email.to_lowercase();
    let (_, otp) = auth.register_customer(body).await?;

    if let Err(err) = state.mailer.send_otp(&email, &otp).await {
        tracing::warn!("Failed to send OTP mail to {}: {}", email, err);
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterCustomerResponse {
            message: "OTP sent to email".to_string(),
            email,
        }),
    ))
}

/// Confirm a customer account with the emailed OTP.
pub async fn verify_customer_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    let auth = AuthService::new(state.db.clone(), &state.config);
    auth.verify_customer_otp(&body.email, &body.otp).await?;
    Ok(Json(MessageResponse {
        message: "Email verified successfully".to_string(),
    }))
}

/// Issue and send a fresh customer OTP.
pub async fn resend_customer_otp(
    State(state): State<AppState>,
    Json(body): Json<ResendOtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    let auth = AuthService::new(state.db.clone(), &state.config);
    let otp = auth.resend_customer_otp(&body.email).await?;
    state.mailer.send_otp(&body.email, &otp).await?;
    Ok(Json(MessageResponse {
        message: "OTP resent via email".to_string(),
    }))
}

#[derive(Deserialize)]
pub struct CustomerLoginRequest {
    pub email: String,
    pub password: String,
    pub longitude: f64,
    pub latitude: f64,
}

/// Customer login. Requires the GPS position, which is stored and marks
/// the customer online.
pub async fn login_customer(
    State(state): State<AppState>,
    Json(body): Json<CustomerLoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let auth = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth
        .login_customer(
            &body.email,
            &body.password,
            GeoPoint::new(body.longitude, body.latitude),
        )
        .await?;
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: tokens.token,
        token_type: tokens.token_type,
        expires_in: tokens.expires_in,
        user_id: tokens.user_id,
        role: tokens.role,
    }))
}

#[derive(Deserialize)]
pub struct CustomerLocationRequest {
    pub longitude: f64,
    pub latitude: f64,
}

/// Update the customer's stored position.
pub async fn update_customer_location(
    State(state): State<AppState>,
    current: CurrentCustomer,
    Json(body): Json<CustomerLocationRequest>,
) -> AppResult<Json<MessageResponse>> {
    let auth = AuthService::new(state.db.clone(), &state.config);
    auth.update_customer_location(
        current.0.user_id,
        GeoPoint::new(body.longitude, body.latitude),
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Location updated successfully".to_string(),
    }))
}

#[derive(Serialize)]
pub struct CustomerLocationResponse {
    pub longitude: f64,
    pub latitude: f64,
}

/// Fetch the customer's stored position for the map view.
pub async fn get_customer_location(
    State(state): State<AppState>,
    current: CurrentCustomer,
) -> AppResult<Json<CustomerLocationResponse>> {
    let auth = AuthService::new(state.db.clone(), &state.config);
    let customer = auth.get_customer(current.0.user_id).await?;
    let location = customer
        .location
        .ok_or_else(|| crate::error::AppError::NotFound("Location".to_string()))?;
    Ok(Json(CustomerLocationResponse {
        longitude: location.longitude,
        latitude: location.latitude,
    }))
}

/// Durable notifications for the customer, newest first.
pub async fn list_customer_notifications(
    State(state): State<AppState>,
    current: CurrentCustomer,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = NotificationService::new(state.db.clone(), state.registry.clone());
    let records = notifications.list_for_user(current.0.user_id).await?;
    Ok(Json(records))
}
