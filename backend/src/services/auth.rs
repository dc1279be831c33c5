//! Authentication and account service
//!
//! Registration, OTP confirmation, login, and profile/location access for
//! both account kinds. Accounts stay `is_verified = false` until the OTP
//! sequence completes, and login is refused until then.

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::Role;
use shared::{
    validate_email, validate_nepal_phone, validate_password, Customer, CvVerdict, GeoPoint,
    HomeAddress, IdType, IdentityVerdict, Provider, RatingSummary, Sex, Skill,
};

/// OTP validity window.
const OTP_VALIDITY_MINUTES: i64 = 5;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    token_expiry: i64,
}

/// Profile fields submitted with a provider registration.
#[derive(Debug, Clone)]
pub struct RegisterProviderInput {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub sex: String,
    pub password: String,
    pub confirm_password: String,
    pub service: String,
    pub years_of_experience: i32,
    pub skills: Vec<Skill>,
    pub short_bio: Option<String>,
    pub province: String,
    pub district: String,
    pub municipality: String,
    pub ward_no: String,
    pub id_type: String,
}

/// Stored paths of the documents saved for a provider registration.
#[derive(Debug, Clone)]
pub struct SavedDocuments {
    pub profile_photo: String,
    pub id_document: String,
    pub cv_document: String,
    pub portfolio: Vec<String>,
    pub extra_certificates: Vec<String>,
}

/// Input for registering a new customer.
#[derive(Debug, Deserialize)]
pub struct RegisterCustomerInput {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
    pub profile_photo: Option<String>,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: Uuid,
    pub role: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    email: String,
    password_hash: String,
    is_verified: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct OtpRow {
    is_verified: bool,
    otp_code: Option<String>,
    otp_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct ProviderRow {
    id: Uuid,
    full_name: String,
    email: String,
    phone: String,
    sex: String,
    service: String,
    years_of_experience: i32,
    skills: sqlx::types::Json<Vec<Skill>>,
    short_bio: Option<String>,
    province: String,
    district: String,
    municipality: String,
    ward_no: String,
    id_type: String,
    profile_photo: String,
    id_document: String,
    cv_document: String,
    portfolio: sqlx::types::Json<Vec<String>>,
    extra_certificates: sqlx::types::Json<Vec<String>>,
    id_verified: bool,
    cv_verified: bool,
    longitude: Option<f64>,
    latitude: Option<f64>,
    is_online: bool,
    is_verified: bool,
    avg_rating: f64,
    total_ratings: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProviderRow> for Provider {
    fn from(row: ProviderRow) -> Self {
        Provider {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            sex: row.sex.parse().unwrap_or(Sex::Other),
            service: row.service,
            years_of_experience: row.years_of_experience,
            skills: row.skills.0,
            short_bio: row.short_bio,
            home_address: HomeAddress {
                province: row.province,
                district: row.district,
                municipality: row.municipality,
                ward_no: row.ward_no,
            },
            id_type: row.id_type.parse().unwrap_or(IdType::Unknown),
            profile_photo: row.profile_photo,
            id_document: row.id_document,
            cv_document: row.cv_document,
            portfolio: row.portfolio.0,
            extra_certificates: row.extra_certificates.0,
            id_verified: row.id_verified,
            cv_verified: row.cv_verified,
            current_location: geo_point(row.longitude, row.latitude),
            is_online: row.is_online,
            is_verified: row.is_verified,
            rating: RatingSummary {
                avg_rating: row.avg_rating,
                total_ratings: row.total_ratings,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    full_name: String,
    email: String,
    phone: String,
    profile_photo: Option<String>,
    longitude: Option<f64>,
    latitude: Option<f64>,
    is_online: bool,
    is_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            profile_photo: row.profile_photo,
            location: geo_point(row.longitude, row.latitude),
            is_online: row.is_online,
            is_verified: row.is_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn geo_point(longitude: Option<f64>, latitude: Option<f64>) -> Option<GeoPoint> {
    match (longitude, latitude) {
        (Some(longitude), Some(latitude)) => Some(GeoPoint::new(longitude, latitude)),
        _ => None,
    }
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            token_expiry: config.jwt.token_expiry,
        }
    }

    // ========================================================================
    // Provider registration
    // ========================================================================

    /// Validate profile fields and email availability before any file is
    /// saved or any extraction call is made. Nothing is persisted here.
    pub async fn precheck_provider_registration(
        &self,
        input: &RegisterProviderInput,
    ) -> AppResult<()> {
        input.sex.parse::<Sex>().map_err(|msg| AppError::Validation {
            field: "sex".to_string(),
            message: msg.to_string(),
        })?;

        if input.password != input.confirm_password {
            return Err(AppError::ValidationError("Passwords do not match".to_string()));
        }
        validate_password(&input.password).map_err(|msg| AppError::Validation {
            field: "password".to_string(),
            message: msg.to_string(),
        })?;
        validate_email(&input.email).map_err(|msg| AppError::Validation {
            field: "email".to_string(),
            message: msg.to_string(),
        })?;
        validate_nepal_phone(&input.phone).map_err(|msg| AppError::Validation {
            field: "phone".to_string(),
            message: msg.to_string(),
        })?;
        input
            .id_type
            .parse::<IdType>()
            .map_err(|msg| AppError::Validation {
                field: "id_type".to_string(),
                message: msg.to_string(),
            })?;
        if input.skills.is_empty() {
            return Err(AppError::Validation {
                field: "skills".to_string(),
                message: "Skills/Expertise must be a non-empty list".to_string(),
            });
        }
        if input.years_of_experience < 0 {
            return Err(AppError::Validation {
                field: "years_of_experience".to_string(),
                message: "Years of experience cannot be negative".to_string(),
            });
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM providers WHERE email = $1",
        )
        .bind(&input.email)
        .fetch_one(&self.db)
        .await?;
        if existing > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        Ok(())
    }

    /// Persist a provider whose identity verification already passed.
    /// The account is created unverified; the returned OTP must reach the
    /// email owner before login becomes possible.
    pub async fn create_provider(
        &self,
        input: RegisterProviderInput,
        documents: SavedDocuments,
        identity: &IdentityVerdict,
        ocr_text: &str,
        cv: &CvVerdict,
    ) -> AppResult<(Uuid, String)> {
        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let otp = generate_otp();
        let otp_expires_at = Utc::now() + Duration::minutes(OTP_VALIDITY_MINUTES);

        let identity_details = serde_json::to_value(identity)
            .map_err(|e| AppError::Internal(format!("Failed to serialize verdict: {}", e)))?;
        let cv_details = serde_json::to_value(cv)
            .map_err(|e| AppError::Internal(format!("Failed to serialize verdict: {}", e)))?;

        let provider_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO providers (
                full_name, email, phone, sex, password_hash,
                service, years_of_experience, skills, short_bio,
                province, district, municipality, ward_no, id_type,
                profile_photo, id_document, cv_document, portfolio, extra_certificates,
                id_text_ocr, id_verified, id_verification_details,
                cv_verified, cv_verification_details,
                otp_code, otp_expires_at
            )
            VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9,
                $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19,
                $20, $21, $22,
                $23, $24,
                $25, $26
            )
            RETURNING id
            "#,
        )
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.sex)
        .bind(&password_hash)
        .bind(&input.service)
        .bind(input.years_of_experience)
        .bind(sqlx::types::Json(&input.skills))
        .bind(&input.short_bio)
        .bind(&input.province)
        .bind(&input.district)
        .bind(&input.municipality)
        .bind(&input.ward_no)
        .bind(&input.id_type)
        .bind(&documents.profile_photo)
        .bind(&documents.id_document)
        .bind(&documents.cv_document)
        .bind(sqlx::types::Json(&documents.portfolio))
        .bind(sqlx::types::Json(&documents.extra_certificates))
        .bind(ocr_text)
        .bind(identity.passed)
        .bind(&identity_details)
        .bind(cv.verified)
        .bind(&cv_details)
        .bind(&otp)
        .bind(otp_expires_at)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Provider registered: {}", input.email);
        Ok((provider_id, otp))
    }

    // ========================================================================
    // Customer registration
    // ========================================================================

    /// Register a new customer. Returns the account id and the OTP to send.
    pub async fn register_customer(&self, input: RegisterCustomerInput) -> AppResult<(Uuid, String)> {
        if input.password != input.confirm_password {
            return Err(AppError::ValidationError("Passwords do not match".to_string()));
        }
        validate_email(&input.email).map_err(|msg| AppError::Validation {
            field: "email".to_string(),
            message: msg.to_string(),
        })?;
        validate_nepal_phone(&input.phone).map_err(|msg| AppError::Validation {
            field: "phone".to_string(),
            message: msg.to_string(),
        })?;

        let email = input.email.to_lowercase();
        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE email = $1")
                .bind(&email)
                .fetch_one(&self.db)
                .await?;
        if existing > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
        let otp = generate_otp();
        let otp_expires_at = Utc::now() + Duration::minutes(OTP_VALIDITY_MINUTES);

        let customer_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO customers (full_name, email, phone, password_hash, profile_photo, otp_code, otp_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&input.full_name)
        .bind(&email)
        .bind(&input.phone)
        .bind(&password_hash)
        .bind(&input.profile_photo)
        .bind(&otp)
        .bind(otp_expires_at)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Customer registered: {}", email);
        Ok((customer_id, otp))
    }

    // ========================================================================
    // OTP confirmation
    // ========================================================================

    /// Confirm a provider account with the emailed code.
    pub async fn verify_provider_otp(&self, email: &str, otp: &str) -> AppResult<()> {
        let row = sqlx::query_as::<_, OtpRow>(
            "SELECT is_verified, otp_code, otp_expires_at FROM providers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        check_otp(&row, otp)?;

        sqlx::query(
            "UPDATE providers SET is_verified = TRUE, otp_code = NULL, otp_expires_at = NULL, updated_at = NOW() WHERE email = $1",
        )
        .bind(email)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Confirm a customer account with the emailed code.
    pub async fn verify_customer_otp(&self, email: &str, otp: &str) -> AppResult<()> {
        let row = sqlx::query_as::<_, OtpRow>(
            "SELECT is_verified, otp_code, otp_expires_at FROM customers WHERE email = $1",
        )
        .bind(&email.to_lowercase())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        check_otp(&row, otp)?;

        sqlx::query(
            "UPDATE customers SET is_verified = TRUE, otp_code = NULL, otp_expires_at = NULL, updated_at = NOW() WHERE email = $1",
        )
        .bind(&email.to_lowercase())
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Issue a fresh provider OTP. Returns the code to send.
    pub async fn resend_provider_otp(&self, email: &str) -> AppResult<String> {
        self.resend_otp("providers", email).await
    }

    /// Issue a fresh customer OTP. Returns the code to send.
    pub async fn resend_customer_otp(&self, email: &str) -> AppResult<String> {
        self.resend_otp("customers", email).await
    }

    async fn resend_otp(&self, table: &str, email: &str) -> AppResult<String> {
        let row = sqlx::query_as::<_, OtpRow>(&format!(
            "SELECT is_verified, otp_code, otp_expires_at FROM {} WHERE email = $1",
            table
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::EmailNotRegistered)?;

        if row.is_verified {
            return Err(AppError::AlreadyVerified);
        }

        let otp = generate_otp();
        let otp_expires_at = Utc::now() + Duration::minutes(OTP_VALIDITY_MINUTES);
        sqlx::query(&format!(
            "UPDATE {} SET otp_code = $1, otp_expires_at = $2, updated_at = NOW() WHERE email = $3",
            table
        ))
        .bind(&otp)
        .bind(otp_expires_at)
        .bind(email)
        .execute(&self.db)
        .await?;

        Ok(otp)
    }

    // ========================================================================
    // Login
    // ========================================================================

    /// Authenticate a provider. Unverified accounts are refused before the
    /// password is even checked.
    pub async fn login_provider(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, email, password_hash, is_verified FROM providers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::EmailNotRegistered)?;

        if !row.is_verified {
            return Err(AppError::AccountNotVerified);
        }
        self.check_password(password, &row.password_hash)?;

        self.generate_token(row.id, Role::Provider, &row.email)
    }

    /// Authenticate a customer, storing the submitted GPS position and
    /// marking the account online.
    pub async fn login_customer(
        &self,
        email: &str,
        password: &str,
        location: GeoPoint,
    ) -> AppResult<AuthTokens> {
        let email = email.to_lowercase();
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, email, password_hash, is_verified FROM customers WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::EmailNotRegistered)?;

        if !row.is_verified {
            return Err(AppError::AccountNotVerified);
        }
        self.check_password(password, &row.password_hash)?;

        sqlx::query(
            "UPDATE customers SET longitude = $1, latitude = $2, is_online = TRUE, updated_at = NOW() WHERE id = $3",
        )
        .bind(location.longitude)
        .bind(location.latitude)
        .bind(row.id)
        .execute(&self.db)
        .await?;

        self.generate_token(row.id, Role::Customer, &row.email)
    }

    fn check_password(&self, password: &str, password_hash: &str) -> AppResult<()> {
        let valid = verify(password, password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if valid {
            Ok(())
        } else {
            Err(AppError::InvalidCredentials)
        }
    }

    fn generate_token(&self, user_id: Uuid, role: Role, email: &str) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            email: email.to_string(),
            exp: (now + Duration::seconds(self.token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_expiry,
            user_id,
            role: role.as_str().to_string(),
        })
    }

    // ========================================================================
    // Profiles and locations
    // ========================================================================

    /// Fetch a provider's own profile (secrets never leave the database).
    pub async fn get_provider(&self, provider_id: Uuid) -> AppResult<Provider> {
        let row = sqlx::query_as::<_, ProviderRow>(
            r#"
            SELECT id, full_name, email, phone, sex, service, years_of_experience,
                   skills, short_bio, province, district, municipality, ward_no,
                   id_type, profile_photo, id_document, cv_document, portfolio,
                   extra_certificates, id_verified, cv_verified, longitude, latitude,
                   is_online, is_verified, avg_rating, total_ratings, created_at, updated_at
            FROM providers
            WHERE id = $1
            "#,
        )
        .bind(provider_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(row.into())
    }

    /// Update a provider's live GPS position.
    pub async fn update_provider_location(
        &self,
        provider_id: Uuid,
        location: GeoPoint,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE providers SET longitude = $1, latitude = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(location.longitude)
        .bind(location.latitude)
        .bind(provider_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }
        Ok(())
    }

    /// Update a customer's stored position.
    pub async fn update_customer_location(
        &self,
        customer_id: Uuid,
        location: GeoPoint,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET longitude = $1, latitude = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(location.longitude)
        .bind(location.latitude)
        .bind(customer_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer".to_string()));
        }
        Ok(())
    }

    /// Fetch a customer's stored position, if any was ever set.
    pub async fn get_customer(&self, customer_id: Uuid) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT id, full_name, email, phone, profile_photo, longitude, latitude,
                   is_online, is_verified, created_at, updated_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(row.into())
    }
}

fn check_otp(row: &OtpRow, otp: &str) -> AppResult<()> {
    if row.is_verified {
        return Err(AppError::AlreadyVerified);
    }
    match &row.otp_code {
        Some(code) if code == otp => {}
        _ => return Err(AppError::InvalidOtp),
    }
    // Expiry is a passive predicate checked only here, at use time.
    match row.otp_expires_at {
        Some(expires_at) if expires_at >= Utc::now() => Ok(()),
        _ => Err(AppError::OtpExpired),
    }
}

/// Generate a 6-digit one-time code.
fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn otp_row(code: &str, expires_in_minutes: i64, is_verified: bool) -> OtpRow {
        OtpRow {
            is_verified,
            otp_code: Some(code.to_string()),
            otp_expires_at: Some(Utc::now() + Duration::minutes(expires_in_minutes)),
        }
    }

    #[test]
    fn generated_otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn otp_accepts_matching_unexpired_code() {
        assert!(check_otp(&otp_row("123456", 5, false), "123456").is_ok());
    }

    #[test]
    fn otp_rejects_wrong_code() {
        assert!(matches!(
            check_otp(&otp_row("123456", 5, false), "654321"),
            Err(AppError::InvalidOtp)
        ));
    }

    #[test]
    fn otp_rejects_expired_code() {
        assert!(matches!(
            check_otp(&otp_row("123456", -1, false), "123456"),
            Err(AppError::OtpExpired)
        ));
    }

    #[test]
    fn otp_rejects_already_verified_account() {
        assert!(matches!(
            check_otp(&otp_row("123456", 5, true), "123456"),
            Err(AppError::AlreadyVerified)
        ));
    }

    #[test]
    fn otp_rejects_cleared_code() {
        let row = OtpRow {
            is_verified: false,
            otp_code: None,
            otp_expires_at: None,
        };
        assert!(matches!(check_otp(&row, "123456"), Err(AppError::InvalidOtp)));
    }
}
