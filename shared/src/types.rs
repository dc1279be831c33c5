//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// A geographic point in decimal degrees.
///
/// Serialized as (longitude, latitude) to match the coordinate order used
/// by the persistence layer. An unset location is always represented as
/// `Option<GeoPoint>::None`, never as a (0, 0) sentinel — a user standing
/// at the equator/prime meridian is a legitimate position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}
