//! Customer aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::GeoPoint;

/// A registered customer.
///
/// Created unverified and activated by OTP confirmation. The location is
/// refreshed on every login and by explicit location updates; the live
/// connection handle is process state and never persisted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub profile_photo: Option<String>,
    pub location: Option<GeoPoint>,
    pub is_online: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
