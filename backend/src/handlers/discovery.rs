//! Provider discovery handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::CurrentCustomer;
use crate::services::discovery::NearbyProvider;
use crate::services::DiscoveryService;
use crate::AppState;

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub service: String,
    /// When set, ranked providers with a live connection also get a
    /// service-alert event.
    #[serde(default)]
    pub notify: bool,
}

#[derive(Serialize)]
pub struct NearbyResponse {
    pub count: usize,
    pub providers: Vec<NearbyProvider>,
}

/// Online, verified providers of a service ranked by rating, then
/// distance from the customer's stored position.
pub async fn nearby_providers(
    State(state): State<AppState>,
    current: CurrentCustomer,
    Query(query): Query<NearbyQuery>,
) -> AppResult<Json<NearbyResponse>> {
    let service = DiscoveryService::new(state.db.clone(), state.registry.clone());
    let providers = service
        .nearby(current.0.user_id, &query.service, query.notify)
        .await?;
    Ok(Json(NearbyResponse {
        count: providers.len(),
        providers,
    }))
}
