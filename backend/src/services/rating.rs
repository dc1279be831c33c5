//! Rating aggregator
//!
//! A rating is accepted only once per (provider, customer) pair, and only
//! after a qualifying request (completed or customer-cancelled) exists for
//! that pair. The provider aggregate is recomputed from the full rating
//! set in a single server-side statement, so concurrent raters serialize
//! on the provider row and never publish a stale count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{validate_score, Rating, RatingSummary};

/// Rating service
#[derive(Clone)]
pub struct RatingService {
    db: PgPool,
}

/// Input for submitting a rating.
#[derive(Debug, Deserialize)]
pub struct AddRatingInput {
    pub provider_id: Uuid,
    pub score: i32,
    pub review: Option<String>,
}

/// A review as shown on a provider's page.
#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub id: Uuid,
    pub customer_name: String,
    pub score: i32,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct RatingRow {
    id: Uuid,
    provider_id: Uuid,
    customer_id: Uuid,
    score: i32,
    review: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Rating {
            id: row.id,
            provider_id: row.provider_id,
            customer_id: row.customer_id,
            score: row.score,
            review: row.review,
            created_at: row.created_at,
        }
    }
}

impl RatingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Submit a rating and recompute the provider aggregate.
    pub async fn add(&self, customer_id: Uuid, input: AddRatingInput) -> AppResult<Rating> {
        validate_score(input.score).map_err(|msg| AppError::Validation {
            field: "score".to_string(),
            message: msg.to_string(),
        })?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM ratings WHERE provider_id = $1 AND customer_id = $2",
        )
        .bind(input.provider_id)
        .bind(customer_id)
        .fetch_one(&self.db)
        .await?;
        if existing > 0 {
            return Err(AppError::Conflict(
                "You have already rated this provider".to_string(),
            ));
        }

        let qualifying = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM service_requests
            WHERE customer_id = $1
              AND provider_id = $2
              AND status IN ('completed', 'customer-cancelled')
            "#,
        )
        .bind(customer_id)
        .bind(input.provider_id)
        .fetch_one(&self.db)
        .await?;
        if qualifying == 0 {
            return Err(AppError::ValidationError(
                "You can only rate after the service is completed or cancelled by you".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, RatingRow>(
            r#"
            INSERT INTO ratings (provider_id, customer_id, score, review)
            VALUES ($1, $2, $3, $4)
            RETURNING id, provider_id, customer_id, score, review, created_at
            "#,
        )
        .bind(input.provider_id)
        .bind(customer_id)
        .bind(input.score)
        .bind(&input.review)
        .fetch_one(&self.db)
        .await
        .map_err(|err| {
            // Unique-constraint backstop for two concurrent first ratings.
            if let sqlx::Error::Database(db_err) = &err {
                if db_err.constraint() == Some("ratings_one_per_pair") {
                    return AppError::Conflict("You have already rated this provider".to_string());
                }
            }
            AppError::from(err)
        })?;

        self.recompute_aggregate(input.provider_id).await?;

        Ok(row.into())
    }

    /// Recompute the denormalized aggregate from the full rating set in one
    /// statement; the row lock serializes concurrent writers.
    async fn recompute_aggregate(&self, provider_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE providers
            SET avg_rating = COALESCE(
                    (SELECT ROUND(AVG(score)::numeric, 1) FROM ratings WHERE provider_id = $1),
                    0
                )::DOUBLE PRECISION,
                total_ratings = (SELECT COUNT(*) FROM ratings WHERE provider_id = $1),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(provider_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// All reviews for a provider, newest first.
    pub async fn reviews(&self, provider_id: Uuid) -> AppResult<Vec<ReviewView>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT r.id, r.score, r.review, r.created_at, c.full_name AS customer_name
            FROM ratings r
            JOIN customers c ON c.id = r.customer_id
            WHERE r.provider_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ReviewView {
                id: row.id,
                customer_name: row.customer_name,
                score: row.score,
                review: row.review,
                created_at: row.created_at,
            })
            .collect())
    }

    /// Aggregate for a provider, computed from the rating set. An unrated
    /// provider reads as zeros.
    pub async fn average(&self, provider_id: Uuid) -> AppResult<RatingSummary> {
        let (avg_rating, total_ratings) = sqlx::query_as::<_, (f64, i64)>(
            r#"
            SELECT COALESCE(ROUND(AVG(score)::numeric, 1), 0)::DOUBLE PRECISION, COUNT(*)
            FROM ratings
            WHERE provider_id = $1
            "#,
        )
        .bind(provider_id)
        .fetch_one(&self.db)
        .await?;

        Ok(RatingSummary {
            avg_rating,
            total_ratings,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    score: i32,
    review: Option<String>,
    created_at: DateTime<Utc>,
    customer_name: String,
}
