//! Service request and its lifecycle state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::GeoPoint;

/// A service request connecting a customer to a provider.
///
/// The location is a snapshot of the customer's position at creation time,
/// kept so the provider sees where the request came from even after the
/// customer moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub service: String,
    pub status: RequestStatus,
    pub location: GeoPoint,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle states of a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    InProgress,
    Rejected,
    Completed,
    CustomerCancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::InProgress => "in-progress",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
            RequestStatus::CustomerCancelled => "customer-cancelled",
        }
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Rejected | RequestStatus::Completed | RequestStatus::CustomerCancelled
        )
    }

    /// The lifecycle transition table. Everything not listed here is
    /// illegal, including re-entering the current state.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Pending, CustomerCancelled)
                | (Accepted, InProgress)
                | (Accepted, Completed)
                | (Accepted, CustomerCancelled)
                | (InProgress, Completed)
                | (InProgress, CustomerCancelled)
        )
    }

    /// States from which the customer may cancel.
    pub fn cancellable_by_customer(&self) -> bool {
        self.can_transition_to(RequestStatus::CustomerCancelled)
    }

    /// Terminal states that make the (customer, provider) pair eligible
    /// for a rating. A customer cancellation counts as if the service
    /// occurred.
    pub fn rating_eligible(&self) -> bool {
        matches!(
            self,
            RequestStatus::Completed | RequestStatus::CustomerCancelled
        )
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "in-progress" => Ok(RequestStatus::InProgress),
            "rejected" => Ok(RequestStatus::Rejected),
            "completed" => Ok(RequestStatus::Completed),
            "customer-cancelled" => Ok(RequestStatus::CustomerCancelled),
            _ => Err("unknown request status"),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RequestStatus::*;

    const ALL: [RequestStatus; 6] = [
        Pending,
        Accepted,
        InProgress,
        Rejected,
        Completed,
        CustomerCancelled,
    ];

    #[test]
    fn pending_fans_out() {
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(CustomerCancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(InProgress));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [Rejected, Completed, CustomerCancelled] {
            assert!(terminal.is_terminal());
            for next in ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn no_state_reenters_itself() {
        for state in ALL {
            assert!(!state.can_transition_to(state));
        }
    }

    #[test]
    fn cancellation_windows() {
        assert!(Pending.cancellable_by_customer());
        assert!(Accepted.cancellable_by_customer());
        assert!(InProgress.cancellable_by_customer());
        assert!(!Completed.cancellable_by_customer());
        assert!(!Rejected.cancellable_by_customer());
    }

    #[test]
    fn rating_eligibility() {
        assert!(Completed.rating_eligible());
        assert!(CustomerCancelled.rating_eligible());
        assert!(!Rejected.rating_eligible());
        assert!(!Pending.rating_eligible());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for state in ALL {
            assert_eq!(state.as_str().parse::<RequestStatus>().unwrap(), state);
        }
    }
}
