//! Service request lifecycle
//!
//! Drives the pending → accepted/rejected → completed/cancelled state
//! machine. Every transition checks the pure transition table first and
//! then updates with a status guard in the WHERE clause, so a concurrent
//! transition loses cleanly as a conflict instead of overwriting state.
//!
//! Ownership lookups are by (request id, caller id): a request that exists
//! but belongs to someone else reads as not found, never as forbidden.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::realtime::{ConnectionRegistry, LiveEvent};
use crate::services::NotificationService;
use shared::{haversine_km, round_km, EventKind, GeoPoint, RequestStatus, ServiceRequest};

/// Request lifecycle service
#[derive(Clone)]
pub struct RequestService {
    db: PgPool,
    notifications: NotificationService,
}

/// Input for creating a service request.
#[derive(Debug, Deserialize)]
pub struct CreateRequestInput {
    pub provider_id: Uuid,
    pub service: String,
}

/// A provider's view of a request, with the distance to the customer's
/// snapshotted position when the provider has a live location.
#[derive(Debug, Serialize)]
pub struct ProviderRequestView {
    pub request_id: Uuid,
    pub service: String,
    pub status: RequestStatus,
    pub customer_name: String,
    pub customer_phone: String,
    pub distance_km: Option<f64>,
    pub requested_at: DateTime<Utc>,
}

/// A customer's view of a request.
#[derive(Debug, Serialize)]
pub struct CustomerRequestView {
    pub request_id: Uuid,
    pub service: String,
    pub status: RequestStatus,
    pub provider_name: String,
    pub provider_phone: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    customer_id: Uuid,
    provider_id: Uuid,
    service: String,
    status: String,
    longitude: f64,
    latitude: f64,
    cancelled_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RequestRow {
    fn status(&self) -> AppResult<RequestStatus> {
        self.status
            .parse()
            .map_err(|_| AppError::Internal(format!("Unknown request status: {}", self.status)))
    }
}

impl TryFrom<RequestRow> for ServiceRequest {
    type Error = AppError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let status = row.status()?;
        Ok(ServiceRequest {
            id: row.id,
            customer_id: row.customer_id,
            provider_id: row.provider_id,
            service: row.service,
            status,
            location: GeoPoint::new(row.longitude, row.latitude),
            cancelled_at: row.cancelled_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const REQUEST_COLUMNS: &str = "id, customer_id, provider_id, service, status, \
                               longitude, latitude, cancelled_at, completed_at, \
                               created_at, updated_at";

impl RequestService {
    pub fn new(db: PgPool, registry: ConnectionRegistry) -> Self {
        let notifications = NotificationService::new(db.clone(), registry);
        Self { db, notifications }
    }

    /// Create a request in `pending`. Requires the provider to be online
    /// and the customer to have a real stored location; the customer's
    /// position is snapshotted onto the request.
    pub async fn create(
        &self,
        customer_id: Uuid,
        input: CreateRequestInput,
    ) -> AppResult<ServiceRequest> {
        let customer = sqlx::query_as::<_, (String, String, Option<f64>, Option<f64>)>(
            "SELECT full_name, phone, longitude, latitude FROM customers WHERE id = $1",
        )
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        let (customer_name, customer_phone, longitude, latitude) = customer;
        let location = match (longitude, latitude) {
            (Some(longitude), Some(latitude)) => GeoPoint::new(longitude, latitude),
            _ => {
                return Err(AppError::ValidationError(
                    "Customer location not set. Enable GPS or update location.".to_string(),
                ))
            }
        };

        let provider = sqlx::query_as::<_, (bool,)>(
            "SELECT is_online FROM providers WHERE id = $1 AND is_verified = TRUE",
        )
        .bind(input.provider_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service provider".to_string()))?;

        if !provider.0 {
            return Err(AppError::Conflict("Provider is offline".to_string()));
        }

        let row = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            INSERT INTO service_requests (customer_id, provider_id, service, status, longitude, latitude)
            VALUES ($1, $2, $3, 'pending', $4, $5)
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(customer_id)
        .bind(input.provider_id)
        .bind(&input.service)
        .bind(location.longitude)
        .bind(location.latitude)
        .fetch_one(&self.db)
        .await?;

        let request: ServiceRequest = row.try_into()?;

        // Durable record for the provider, live push if connected.
        self.notifications
            .notify(
                request.provider_id,
                LiveEvent::new(
                    EventKind::ServiceRequest,
                    format!(
                        "New {} request from {} ({})",
                        request.service, customer_name, customer_phone
                    ),
                )
                .with_request(request.id)
                .with_service(request.service.as_str())
                .with_peer(customer_id),
            )
            .await?;

        // The customer keeps a durable confirmation record as well.
        self.notifications
            .record(
                customer_id,
                EventKind::ServiceRequest,
                &format!("Request for {} sent successfully", request.service),
                Some(request.id),
            )
            .await?;

        Ok(request)
    }

    /// Provider accepts a pending request.
    pub async fn accept(&self, provider_id: Uuid, request_id: Uuid) -> AppResult<ServiceRequest> {
        let request = self
            .provider_transition(provider_id, request_id, RequestStatus::Accepted)
            .await?;

        self.notifications
            .notify(
                request.customer_id,
                LiveEvent::new(
                    EventKind::RequestAccepted,
                    "Service provider accepted your request",
                )
                .with_request(request.id)
                .with_status(RequestStatus::Accepted.as_str())
                .with_peer(provider_id),
            )
            .await?;

        Ok(request)
    }

    /// Provider rejects a pending request.
    pub async fn reject(&self, provider_id: Uuid, request_id: Uuid) -> AppResult<ServiceRequest> {
        let request = self
            .provider_transition(provider_id, request_id, RequestStatus::Rejected)
            .await?;

        self.notifications
            .notify(
                request.customer_id,
                LiveEvent::new(
                    EventKind::RequestRejected,
                    "Service provider rejected your request",
                )
                .with_request(request.id)
                .with_status(RequestStatus::Rejected.as_str())
                .with_peer(provider_id),
            )
            .await?;

        Ok(request)
    }

    /// Provider marks an accepted request complete: one ledger row is
    /// written and the request is finalized (kept, not deleted, so its
    /// terminal status remains the rating-eligibility gate). Rating
    /// aggregates are not touched here.
    pub async fn complete(&self, provider_id: Uuid, request_id: Uuid) -> AppResult<ServiceRequest> {
        let row = self.fetch_owned(provider_id, request_id).await?;
        let current = row.status()?;
        if !current.can_transition_to(RequestStatus::Completed) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot complete a {} request",
                current
            )));
        }

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO completed_services (customer_id, provider_id, service, longitude, latitude, completed_by)
            VALUES ($1, $2, $3, $4, $5, 'provider')
            "#,
        )
        .bind(row.customer_id)
        .bind(row.provider_id)
        .bind(&row.service)
        .bind(row.longitude)
        .bind(row.latitude)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            UPDATE service_requests
            SET status = 'completed', completed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(request_id)
        .bind(current.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            // Lost a race with another transition; the ledger insert rolls
            // back with the transaction.
            return Err(AppError::InvalidStateTransition(
                "Request is no longer completable".to_string(),
            ));
        };

        tx.commit().await?;

        let request: ServiceRequest = updated.try_into()?;

        self.notifications
            .notify(
                request.customer_id,
                LiveEvent::new(EventKind::RequestCompleted, "Your service has been completed")
                    .with_request(request.id)
                    .with_status(RequestStatus::Completed.as_str())
                    .with_peer(provider_id),
            )
            .await?;

        Ok(request)
    }

    /// Customer cancels their own request. Legal from pending, accepted,
    /// or in-progress; stamps the cancellation time. The resulting status
    /// is rating-eligible, as if the service occurred.
    pub async fn cancel(&self, customer_id: Uuid, request_id: Uuid) -> AppResult<ServiceRequest> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM service_requests WHERE id = $1 AND customer_id = $2",
        ))
        .bind(request_id)
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Request".to_string()))?;

        let current = row.status()?;
        if !current.cancellable_by_customer() {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot cancel a {} request",
                current
            )));
        }

        let updated = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            UPDATE service_requests
            SET status = 'customer-cancelled', cancelled_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(request_id)
        .bind(current.as_str())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| {
            AppError::InvalidStateTransition("Request is no longer cancellable".to_string())
        })?;

        updated.try_into()
    }

    /// Requests addressed to a provider, filtered by status, newest first.
    pub async fn list_for_provider(
        &self,
        provider_id: Uuid,
        status: RequestStatus,
    ) -> AppResult<Vec<ProviderRequestView>> {
        let provider_location = sqlx::query_as::<_, (Option<f64>, Option<f64>)>(
            "SELECT longitude, latitude FROM providers WHERE id = $1",
        )
        .bind(provider_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service provider".to_string()))?;

        let origin = match provider_location {
            (Some(longitude), Some(latitude)) => Some(GeoPoint::new(longitude, latitude)),
            _ => None,
        };

        let rows = sqlx::query_as::<_, ProviderRequestRow>(
            r#"
            SELECT r.id, r.service, r.status, r.longitude, r.latitude, r.created_at,
                   c.full_name AS customer_name, c.phone AS customer_phone
            FROM service_requests r
            JOIN customers c ON c.id = r.customer_id
            WHERE r.provider_id = $1 AND r.status = $2
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(provider_id)
        .bind(status.as_str())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status = row
                    .status
                    .parse()
                    .map_err(|_| AppError::Internal(format!("Unknown request status: {}", row.status)))?;
                let distance_km = origin.map(|origin| {
                    round_km(haversine_km(
                        origin,
                        GeoPoint::new(row.longitude, row.latitude),
                    ))
                });
                Ok(ProviderRequestView {
                    request_id: row.id,
                    service: row.service,
                    status,
                    customer_name: row.customer_name,
                    customer_phone: row.customer_phone,
                    distance_km,
                    requested_at: row.created_at,
                })
            })
            .collect()
    }

    /// A customer's accepted requests, newest first.
    pub async fn list_accepted_for_customer(
        &self,
        customer_id: Uuid,
    ) -> AppResult<Vec<CustomerRequestView>> {
        self.list_for_customer(customer_id, RequestStatus::Accepted)
            .await
    }

    /// A customer's cancelled requests, newest first.
    pub async fn list_cancelled_for_customer(
        &self,
        customer_id: Uuid,
    ) -> AppResult<Vec<CustomerRequestView>> {
        self.list_for_customer(customer_id, RequestStatus::CustomerCancelled)
            .await
    }

    async fn list_for_customer(
        &self,
        customer_id: Uuid,
        status: RequestStatus,
    ) -> AppResult<Vec<CustomerRequestView>> {
        let rows = sqlx::query_as::<_, CustomerRequestRow>(
            r#"
            SELECT r.id, r.service, r.status, r.cancelled_at, r.created_at,
                   p.full_name AS provider_name, p.phone AS provider_phone
            FROM service_requests r
            JOIN providers p ON p.id = r.provider_id
            WHERE r.customer_id = $1 AND r.status = $2
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(customer_id)
        .bind(status.as_str())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status = row
                    .status
                    .parse()
                    .map_err(|_| AppError::Internal(format!("Unknown request status: {}", row.status)))?;
                Ok(CustomerRequestView {
                    request_id: row.id,
                    service: row.service,
                    status,
                    provider_name: row.provider_name,
                    provider_phone: row.provider_phone,
                    cancelled_at: row.cancelled_at,
                    requested_at: row.created_at,
                })
            })
            .collect()
    }

    /// Shared accept/reject path: lookup by (id, provider), transition
    /// check, guarded update.
    async fn provider_transition(
        &self,
        provider_id: Uuid,
        request_id: Uuid,
        next: RequestStatus,
    ) -> AppResult<ServiceRequest> {
        let row = self.fetch_owned(provider_id, request_id).await?;
        let current = row.status()?;
        if !current.can_transition_to(next) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot move a {} request to {}",
                current, next
            )));
        }

        let updated = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            UPDATE service_requests
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(next.as_str())
        .bind(request_id)
        .bind(current.as_str())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| {
            AppError::InvalidStateTransition(format!("Request is no longer {}", current))
        })?;

        updated.try_into()
    }

    /// A request that exists but is not addressed to the caller reads as
    /// not found.
    async fn fetch_owned(&self, provider_id: Uuid, request_id: Uuid) -> AppResult<RequestRow> {
        sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM service_requests WHERE id = $1 AND provider_id = $2",
        ))
        .bind(request_id)
        .bind(provider_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Request".to_string()))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProviderRequestRow {
    id: Uuid,
    service: String,
    status: String,
    longitude: f64,
    latitude: f64,
    created_at: DateTime<Utc>,
    customer_name: String,
    customer_phone: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRequestRow {
    id: Uuid,
    service: String,
    status: String,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    provider_name: String,
    provider_phone: String,
}
