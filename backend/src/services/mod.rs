//! Business logic services for the Pro Connect backend

pub mod auth;
pub mod discovery;
pub mod notification;
pub mod rating;
pub mod request;
pub mod storage;
pub mod verification;

pub use auth::AuthService;
pub use discovery::DiscoveryService;
pub use notification::NotificationService;
pub use rating::RatingService;
pub use request::RequestService;
pub use storage::UploadStore;
pub use verification::VerificationService;
