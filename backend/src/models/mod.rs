//! Database models for the Pro Connect backend
//!
//! Re-exports models from the shared crate; row structs specific to the
//! persistence layer live next to the services that read them.

pub use shared::models::*;
