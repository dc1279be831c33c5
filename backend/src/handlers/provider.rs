//! Provider account handlers
//!
//! Registration runs the full verification pipeline before any account row
//! is written: field validation, document saves, identity verification
//! (gating), CV verification (stored, non-gating), then the insert and the
//! OTP mail. A failed identity verification returns the structured verdict
//! and persists nothing.

use std::path::Path;

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentProvider;
use crate::services::auth::{RegisterProviderInput, SavedDocuments};
use crate::services::request::ProviderRequestView;
use crate::services::{AuthService, RequestService, UploadStore, VerificationService};
use crate::AppState;
use shared::{
    parse_skill_list, CvClaim, GeoPoint, IdentityClaim, IdentityVerdict, Provider, RequestStatus,
};

/// One uploaded file from the multipart form.
struct UploadedFile {
    file_name: String,
    bytes: Vec<u8>,
}

/// Collected multipart form: text fields plus document uploads.
#[derive(Default)]
struct RegistrationForm {
    fields: std::collections::HashMap<String, String>,
    profile_photo: Option<UploadedFile>,
    id_document: Option<UploadedFile>,
    cv_document: Option<UploadedFile>,
    portfolio: Vec<UploadedFile>,
    extra_certificates: Vec<UploadedFile>,
}

#[derive(Serialize)]
pub struct RegisterProviderResponse {
    pub message: String,
    pub email: String,
}

/// Body returned when identity verification fails. Nothing is persisted.
#[derive(Serialize)]
pub struct VerificationFailedResponse {
    pub success: bool,
    pub message: String,
    pub details: IdentityVerdict,
}

/// Register a new provider (multipart form).
pub async fn register_provider(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = collect_form(multipart).await?;
    let input = build_input(&form)?;

    let auth = AuthService::new(state.db.clone(), &state.config);
    auth.precheck_provider_registration(&input).await?;

    let profile_photo = form
        .profile_photo
        .ok_or_else(|| missing_field("profile_photo"))?;
    let id_document = form
        .id_document
        .ok_or_else(|| missing_field("id_document"))?;
    let cv_document = form
        .cv_document
        .ok_or_else(|| missing_field("cv_document"))?;

    let store = UploadStore::new(&state.config.uploads);
    let documents = SavedDocuments {
        profile_photo: store
            .save("profile", &profile_photo.file_name, &profile_photo.bytes)
            .await?,
        id_document: store
            .save("id", &id_document.file_name, &id_document.bytes)
            .await?,
        cv_document: store
            .save("cv", &cv_document.file_name, &cv_document.bytes)
            .await?,
        portfolio: save_all(&store, "portfolio", form.portfolio).await?,
        extra_certificates: save_all(&store, "certificates", form.extra_certificates).await?,
    };

    // Identity verification gates the registration.
    let verification = VerificationService::new(state.extractor.clone());
    let identity_claim = IdentityClaim {
        full_name: input.full_name.clone(),
        ward_no: input.ward_no.clone(),
        id_type: input.id_type.clone(),
        sex: input.sex.clone(),
    };
    let (identity_verdict, ocr_text) = verification
        .verify_identity_document(Path::new(&documents.id_document), &identity_claim)
        .await;

    if !identity_verdict.passed {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(VerificationFailedResponse {
                success: false,
                message: "ID Verification Failed".to_string(),
                details: identity_verdict,
            }),
        )
            .into_response());
    }

    // CV verification is stored for audit but never gates.
    let cv_claim = CvClaim {
        full_name: input.full_name.clone(),
        service: input.service.clone(),
        skills: input.skills.iter().map(|s| s.name.clone()).collect(),
        years_of_experience: input.years_of_experience,
    };
    let cv_verdict = verification
        .verify_cv_document(Path::new(&documents.cv_document), &cv_claim)
        .await;

    let email = input.email.clone();
    let (_, otp) = auth
        .create_provider(input, documents, &identity_verdict, &ocr_text, &cv_verdict)
        .await?;

    // OTP mail is best-effort; the resend endpoint covers lost mail.
    if let Err(err) = state.mailer.send_otp(&email, &otp).await {
        tracing::warn!("Failed to send OTP mail to {}: {}", email, err);
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterProviderResponse {
            message: "Registered successfully, OTP sent via email".to_string(),
            email,
        }),
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Confirm a provider account with the emailed OTP.
pub async fn verify_provider_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    let auth = AuthService::new(state.db.clone(), &state.config);
    auth.verify_provider_otp(&body.email, &body.otp).await?;
    Ok(Json(MessageResponse {
        message: "OTP verified successfully".to_string(),
    }))
}

#[derive(Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
}

/// Issue and send a fresh provider OTP.
pub async fn resend_provider_otp(
    State(state): State<AppState>,
    Json(body): Json<ResendOtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    let auth = AuthService::new(state.db.clone(), &state.config);
    let otp = auth.resend_provider_otp(&body.email).await?;
    state.mailer.send_otp(&body.email, &otp).await?;
    Ok(Json(MessageResponse {
        message: "OTP resent via email".to_string(),
    }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: uuid::Uuid,
    pub role: String,
}

/// Provider login. Refused until the account is OTP-verified.
pub async fn login_provider(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let auth = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth.login_provider(&body.email, &body.password).await?;
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: tokens.token,
        token_type: tokens.token_type,
        expires_in: tokens.expires_in,
        user_id: tokens.user_id,
        role: tokens.role,
    }))
}

/// Get the authenticated provider's own profile.
pub async fn provider_me(
    State(state): State<AppState>,
    current: CurrentProvider,
) -> AppResult<Json<Provider>> {
    let auth = AuthService::new(state.db.clone(), &state.config);
    let provider = auth.get_provider(current.0.user_id).await?;
    Ok(Json(provider))
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub longitude: f64,
    pub latitude: f64,
}

/// Update the provider's live GPS position.
pub async fn update_provider_location(
    State(state): State<AppState>,
    current: CurrentProvider,
    Json(body): Json<UpdateLocationRequest>,
) -> AppResult<Json<MessageResponse>> {
    let auth = AuthService::new(state.db.clone(), &state.config);
    auth.update_provider_location(
        current.0.user_id,
        GeoPoint::new(body.longitude, body.latitude),
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Location updated".to_string(),
    }))
}

#[derive(Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<RequestStatus>,
}

/// Requests addressed to the authenticated provider, pending by default.
pub async fn list_provider_requests(
    State(state): State<AppState>,
    current: CurrentProvider,
    Query(query): Query<ListRequestsQuery>,
) -> AppResult<Json<Vec<ProviderRequestView>>> {
    let service = RequestService::new(state.db.clone(), state.registry.clone());
    let status = query.status.unwrap_or(RequestStatus::Pending);
    let requests = service.list_for_provider(current.0.user_id, status).await?;
    Ok(Json(requests))
}

async fn collect_form(mut multipart: Multipart) -> AppResult<RegistrationForm> {
    let mut form = RegistrationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if field.file_name().is_some() {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::ValidationError(format!("Failed to read upload: {}", e)))?
                .to_vec();
            let upload = UploadedFile { file_name, bytes };
            match name.as_str() {
                "profile_photo" => form.profile_photo = Some(upload),
                "id_document" => form.id_document = Some(upload),
                "cv_document" => form.cv_document = Some(upload),
                "portfolio" => form.portfolio.push(upload),
                "extra_certificate" => form.extra_certificates.push(upload),
                other => {
                    return Err(AppError::ValidationError(format!(
                        "Unknown file field: {}",
                        other
                    )))
                }
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::ValidationError(format!("Failed to read field: {}", e)))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

fn build_input(form: &RegistrationForm) -> AppResult<RegisterProviderInput> {
    let text = |field: &str| -> AppResult<String> {
        form.fields
            .get(field)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| missing_field(field))
    };

    let years_of_experience = text("years_of_experience")?
        .parse::<i32>()
        .map_err(|_| AppError::Validation {
            field: "years_of_experience".to_string(),
            message: "Years of experience must be a number".to_string(),
        })?;

    let skills = parse_skill_list(&text("skills")?).map_err(|msg| AppError::Validation {
        field: "skills".to_string(),
        message: msg.to_string(),
    })?;

    Ok(RegisterProviderInput {
        full_name: text("full_name")?,
        email: text("email")?,
        phone: text("phone")?,
        sex: text("sex")?,
        password: text("password")?,
        confirm_password: text("confirm_password")?,
        service: text("service")?,
        years_of_experience,
        skills,
        short_bio: form.fields.get("short_bio").map(|v| v.trim().to_string()),
        province: text("province")?,
        district: text("district")?,
        municipality: text("municipality")?,
        ward_no: text("ward_no")?,
        id_type: text("id_type")?,
    })
}

async fn save_all(
    store: &UploadStore,
    folder: &str,
    files: Vec<UploadedFile>,
) -> AppResult<Vec<String>> {
    let mut paths = Vec::with_capacity(files.len());
    for file in files {
        paths.push(store.save(folder, &file.file_name, &file.bytes).await?);
    }
    Ok(paths)
}

fn missing_field(field: &str) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        message: format!("Missing mandatory field: {}", field),
    }
}
