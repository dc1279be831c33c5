//! Provider discovery
//!
//! Finds online, verified providers for a service and ranks them by
//! rating, then distance, from the customer's stored position. Optionally
//! fans a live alert out to every ranked provider that has a connection
//! handle; offline providers are skipped silently.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::realtime::{ConnectionRegistry, LiveEvent};
use shared::{rank_providers, round_km, EventKind, GeoPoint, GeoRanked, Skill};

/// Provider discovery service
#[derive(Clone)]
pub struct DiscoveryService {
    db: PgPool,
    registry: ConnectionRegistry,
}

/// A ranked provider as returned to the customer.
#[derive(Debug, Serialize)]
pub struct NearbyProvider {
    pub id: Uuid,
    pub full_name: String,
    pub profile_photo: String,
    pub avg_rating: f64,
    pub total_ratings: i64,
    pub services_done: i64,
    pub distance_km: f64,
    pub years_of_experience: i32,
    pub skills: Vec<Skill>,
}

#[derive(Debug, sqlx::FromRow)]
struct CandidateRow {
    id: Uuid,
    full_name: String,
    profile_photo: String,
    avg_rating: f64,
    total_ratings: i64,
    years_of_experience: i32,
    skills: sqlx::types::Json<Vec<Skill>>,
    longitude: Option<f64>,
    latitude: Option<f64>,
}

impl GeoRanked for CandidateRow {
    fn location(&self) -> Option<GeoPoint> {
        match (self.longitude, self.latitude) {
            (Some(longitude), Some(latitude)) => Some(GeoPoint::new(longitude, latitude)),
            _ => None,
        }
    }

    fn rating(&self) -> f64 {
        self.avg_rating
    }
}

impl DiscoveryService {
    pub fn new(db: PgPool, registry: ConnectionRegistry) -> Self {
        Self { db, registry }
    }

    /// Rank the online, verified providers of `service` around the
    /// customer's stored position. With `notify` set, each ranked provider
    /// with a live connection also receives a `service-alert` event.
    pub async fn nearby(
        &self,
        customer_id: Uuid,
        service: &str,
        notify: bool,
    ) -> AppResult<Vec<NearbyProvider>> {
        let customer = sqlx::query_as::<_, (Option<f64>, Option<f64>)>(
            "SELECT longitude, latitude FROM customers WHERE id = $1",
        )
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        let origin = match customer {
            (Some(longitude), Some(latitude)) => GeoPoint::new(longitude, latitude),
            _ => {
                return Err(AppError::ValidationError(
                    "Customer location not set".to_string(),
                ))
            }
        };

        let candidates = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT id, full_name, profile_photo, avg_rating, total_ratings,
                   years_of_experience, skills, longitude, latitude
            FROM providers
            WHERE LOWER(service) = LOWER($1)
              AND is_online = TRUE
              AND is_verified = TRUE
            "#,
        )
        .bind(service)
        .fetch_all(&self.db)
        .await?;

        if candidates.is_empty() {
            return Err(AppError::NotFound(format!("Providers for {}", service)));
        }

        let ranked = rank_providers(origin, candidates);

        let ids: Vec<Uuid> = ranked.iter().map(|r| r.candidate.id).collect();
        let done_counts = self.services_done(&ids).await?;

        if notify {
            for entry in &ranked {
                // Best-effort, at-most-once; no handle means no delivery.
                self.registry.send(
                    entry.candidate.id,
                    LiveEvent::new(
                        EventKind::ServiceAlert,
                        "A customer is looking for your service",
                    )
                    .with_service(service)
                    .with_peer(customer_id),
                );
            }
        }

        Ok(ranked
            .into_iter()
            .map(|entry| {
                let services_done = done_counts
                    .iter()
                    .find(|(id, _)| *id == entry.candidate.id)
                    .map(|(_, count)| *count)
                    .unwrap_or(0);
                NearbyProvider {
                    id: entry.candidate.id,
                    full_name: entry.candidate.full_name,
                    profile_photo: entry.candidate.profile_photo,
                    avg_rating: entry.candidate.avg_rating,
                    total_ratings: entry.candidate.total_ratings,
                    services_done,
                    distance_km: round_km(entry.distance_km),
                    years_of_experience: entry.candidate.years_of_experience,
                    skills: entry.candidate.skills.0,
                }
            })
            .collect())
    }

    async fn services_done(&self, provider_ids: &[Uuid]) -> AppResult<Vec<(Uuid, i64)>> {
        let counts = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT provider_id, COUNT(*)
            FROM completed_services
            WHERE provider_id = ANY($1)
            GROUP BY provider_id
            "#,
        )
        .bind(provider_ids)
        .fetch_all(&self.db)
        .await?;
        Ok(counts)
    }
}
