//! Service provider aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::IdType;
use crate::types::GeoPoint;

/// A registered service provider.
///
/// `is_verified` stays false until the OTP confirmation sequence completes;
/// an unverified provider cannot authenticate for operational endpoints.
/// `current_location` is None until the first GPS update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub sex: Sex,
    pub service: String,
    pub years_of_experience: i32,
    pub skills: Vec<Skill>,
    pub short_bio: Option<String>,
    pub home_address: HomeAddress,
    pub id_type: IdType,
    pub profile_photo: String,
    pub id_document: String,
    pub cv_document: String,
    pub portfolio: Vec<String>,
    pub extra_certificates: Vec<String>,
    pub id_verified: bool,
    pub cv_verified: bool,
    pub current_location: Option<GeoPoint>,
    pub is_online: bool,
    pub is_verified: bool,
    pub rating: RatingSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A declared skill with an optional asking price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

impl Skill {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: None,
        }
    }
}

/// Declared home address (administrative units, not GPS).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeAddress {
    pub province: String,
    pub district: String,
    pub municipality: String,
    pub ward_no: String,
}

/// Aggregate rating kept denormalized on the provider row.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    pub avg_rating: f64,
    pub total_ratings: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Other => "Other",
        }
    }
}

impl std::str::FromStr for Sex {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Sex::Male),
            "Female" => Ok(Sex::Female),
            "Other" => Ok(Sex::Other),
            _ => Err("Sex must be one of Male, Female, Other"),
        }
    }
}
