//! Ratings and the completed-service ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::provider::RatingSummary;
use crate::types::GeoPoint;

/// A customer's rating of a provider. At most one per
/// (provider, customer) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub customer_id: Uuid,
    pub score: i32,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a finished engagement. Written exactly once per
/// completed request and never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedService {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub service: String,
    pub location: GeoPoint,
    pub completed_by: CompletedBy,
    pub completed_at: DateTime<Utc>,
}

/// Which party marked the engagement complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletedBy {
    Customer,
    Provider,
}

impl CompletedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletedBy::Customer => "customer",
            CompletedBy::Provider => "provider",
        }
    }
}

/// Compute the aggregate published on the provider row: arithmetic mean
/// rounded to one decimal, plus the count. An empty score set yields the
/// zeroed summary.
pub fn rating_aggregate(scores: &[i32]) -> RatingSummary {
    if scores.is_empty() {
        return RatingSummary::default();
    }
    let sum: i64 = scores.iter().map(|s| *s as i64).sum();
    let avg = sum as f64 / scores.len() as f64;
    RatingSummary {
        avg_rating: (avg * 10.0).round() / 10.0,
        total_ratings: scores.len() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_of_empty_set_is_zero() {
        let summary = rating_aggregate(&[]);
        assert_eq!(summary.avg_rating, 0.0);
        assert_eq!(summary.total_ratings, 0);
    }

    #[test]
    fn aggregate_is_exact_mean_rounded_to_one_decimal() {
        let summary = rating_aggregate(&[5, 4, 4]);
        assert_eq!(summary.avg_rating, 4.3);
        assert_eq!(summary.total_ratings, 3);
    }

    #[test]
    fn aggregate_of_single_score() {
        let summary = rating_aggregate(&[3]);
        assert_eq!(summary.avg_rating, 3.0);
        assert_eq!(summary.total_ratings, 1);
    }
}
