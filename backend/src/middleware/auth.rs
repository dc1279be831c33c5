//! Authentication middleware
//!
//! JWT validation plus role-scoped extractors. Tokens are only ever issued
//! to verified accounts, so a decoded claim implies the OTP sequence
//! completed.

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{ErrorDetail, ErrorResponse};

/// Role carried in the token, mirroring the two account kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Provider,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Provider => "service_provider",
            Role::Customer => "customer",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "service_provider" => Some(Role::Provider),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }
}

/// Authenticated user information extracted from the JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
    pub role: Role,
    pub email: String,
}

/// Authentication middleware that validates JWT tokens.
/// Note: the token is decoded inline against the environment secret to
/// avoid state dependency issues in the middleware layer.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let jwt_secret = std::env::var("PRC__JWT__SECRET")
        .or_else(|_| std::env::var("PRC_JWT_SECRET"))
        .unwrap_or_else(|_| "development-secret-key".to_string());

    let claims = match decode_jwt(token, &jwt_secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    let user_id = match uuid::Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid user ID in token"),
    };

    let role = match Role::parse(&claims.role) {
        Some(role) => role,
        None => return unauthorized_response("Invalid role in token"),
    };

    let auth_user = AuthUser {
        user_id,
        role,
        email: claims.email,
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: String,
    role: String,
    email: String,
    exp: i64,
    iat: i64,
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

fn forbidden_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "FORBIDDEN".to_string(),
            message: message.to_string(),
            field: None,
        },
    };

    (StatusCode::FORBIDDEN, Json(error)).into_response()
}

/// Extractor for any authenticated user, either role.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        require_auth_user(parts).map(CurrentUser)
    }
}

/// Extractor for an authenticated provider. Rejects customer tokens.
#[derive(Clone, Debug)]
pub struct CurrentProvider(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentProvider
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = require_auth_user(parts)?;
        if user.role != Role::Provider {
            return Err(forbidden_response("Access denied"));
        }
        Ok(CurrentProvider(user))
    }
}

/// Extractor for an authenticated customer. Rejects provider tokens.
#[derive(Clone, Debug)]
pub struct CurrentCustomer(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentCustomer
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = require_auth_user(parts)?;
        if user.role != Role::Customer {
            return Err(forbidden_response("Access denied"));
        }
        Ok(CurrentCustomer(user))
    }
}

fn require_auth_user(parts: &mut axum::http::request::Parts) -> Result<AuthUser, Response> {
    parts
        .extensions
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| unauthorized_response("Authentication required"))
}
