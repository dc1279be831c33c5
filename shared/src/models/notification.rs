//! Durable notifications and live event kinds

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A durable notification record. Written for every lifecycle event
/// regardless of whether the recipient had a live connection; this is the
/// source of truth for offline recipients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event: EventKind,
    pub message: String,
    pub request_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Event kinds published on the realtime channel. The serialized names are
/// the wire-level event names consumed by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "service-alert")]
    ServiceAlert,
    #[serde(rename = "service-request")]
    ServiceRequest,
    #[serde(rename = "requestAccepted")]
    RequestAccepted,
    #[serde(rename = "requestRejected")]
    RequestRejected,
    #[serde(rename = "requestCompleted")]
    RequestCompleted,
    #[serde(rename = "service-completed")]
    ServiceCompleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ServiceAlert => "service-alert",
            EventKind::ServiceRequest => "service-request",
            EventKind::RequestAccepted => "requestAccepted",
            EventKind::RequestRejected => "requestRejected",
            EventKind::RequestCompleted => "requestCompleted",
            EventKind::ServiceCompleted => "service-completed",
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service-alert" => Ok(EventKind::ServiceAlert),
            "service-request" => Ok(EventKind::ServiceRequest),
            "requestAccepted" => Ok(EventKind::RequestAccepted),
            "requestRejected" => Ok(EventKind::RequestRejected),
            "requestCompleted" => Ok(EventKind::RequestCompleted),
            "service-completed" => Ok(EventKind::ServiceCompleted),
            _ => Err("unknown event kind"),
        }
    }
}
