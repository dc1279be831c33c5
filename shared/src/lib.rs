//! Shared types and domain logic for the Pro Connect marketplace
//!
//! This crate contains the pure, database-free parts of the platform:
//! document verification matchers, geospatial ranking, the service-request
//! state machine, and input validation helpers. The backend crate wires
//! these into HTTP handlers and persistence.

pub mod credential;
pub mod geo;
pub mod identity;
pub mod models;
pub mod types;
pub mod validation;

pub use credential::*;
pub use geo::*;
pub use identity::*;
pub use models::*;
pub use types::*;
pub use validation::*;
