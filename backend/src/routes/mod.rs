//! Route definitions for the Pro Connect backend

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Provider account routes
        .nest("/providers", provider_routes())
        // Customer account routes
        .nest("/customers", customer_routes())
        // Request lifecycle routes (all authenticated)
        .nest("/requests", request_routes())
        // Rating routes
        .nest("/ratings", rating_routes())
        // Realtime channel (authenticated, either role)
        .route(
            "/events",
            get(handlers::stream_events).route_layer(middleware::from_fn(auth_middleware)),
        )
}

/// Provider routes: public registration/login plus protected profile,
/// location, request listing, and the customer-facing nearby query.
fn provider_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(handlers::register_provider))
        .route("/verify-otp", post(handlers::verify_provider_otp))
        .route("/resend-otp", post(handlers::resend_provider_otp))
        .route("/login", post(handlers::login_provider));

    let protected = Router::new()
        .route("/me", get(handlers::provider_me))
        .route("/location", post(handlers::update_provider_location))
        .route("/requests", get(handlers::list_provider_requests))
        .route("/nearby", get(handlers::nearby_providers))
        .route_layer(middleware::from_fn(auth_middleware));

    public.merge(protected)
}

/// Customer routes: public registration/login plus protected location and
/// notification access.
fn customer_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(handlers::register_customer))
        .route("/verify-otp", post(handlers::verify_customer_otp))
        .route("/resend-otp", post(handlers::resend_customer_otp))
        .route("/login", post(handlers::login_customer));

    let protected = Router::new()
        .route(
            "/location",
            post(handlers::update_customer_location).get(handlers::get_customer_location),
        )
        .route("/notifications", get(handlers::list_customer_notifications))
        .route_layer(middleware::from_fn(auth_middleware));

    public.merge(protected)
}

/// Request lifecycle routes (protected)
fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_request))
        .route("/mine", get(handlers::my_requests))
        .route("/cancelled", get(handlers::cancelled_requests))
        .route("/:id/accept", post(handlers::accept_request))
        .route("/:id/reject", post(handlers::reject_request))
        .route("/:id/complete", post(handlers::complete_request))
        .route("/:id/cancel", post(handlers::cancel_request))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Rating routes: submission is protected, reads are public.
fn rating_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/reviews/:provider_id", get(handlers::provider_reviews))
        .route("/average/:provider_id", get(handlers::provider_average_rating));

    let protected = Router::new()
        .route("/", post(handlers::add_rating))
        .route_layer(middleware::from_fn(auth_middleware));

    public.merge(protected)
}
