//! Tests for the request lifecycle transition table
//!
//! The service layer enforces these rules with status-guarded updates; the
//! table itself is pure and exhaustively checkable here.

use shared::RequestStatus;
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
fn pending_can_be_accepted_rejected_or_cancelled() {
    assert!(Pending.can_transition_to(Accepted));
    assert!(Pending.can_transition_to(Rejected));
    assert!(Pending.can_transition_to(CustomerCancelled));
    assert!(!Pending.can_transition_to(InProgress));
    assert!(!Pending.can_transition_to(Completed));
}

#[test]
fn accepted_can_progress_complete_or_be_cancelled() {
    assert!(Accepted.can_transition_to(InProgress));
    assert!(Accepted.can_transition_to(Completed));
    assert!(Accepted.can_transition_to(CustomerCancelled));
    assert!(!Accepted.can_transition_to(Rejected));
    assert!(!Accepted.can_transition_to(Pending));
}

#[test]
fn in_progress_can_complete_or_be_cancelled() {
    assert!(InProgress.can_transition_to(Completed));
    assert!(InProgress.can_transition_to(CustomerCancelled));
    assert!(!InProgress.can_transition_to(Accepted));
    assert!(!InProgress.can_transition_to(Rejected));
}

#[test]
fn terminal_states_are_dead_ends() {
    for terminal in [Rejected, Completed, CustomerCancelled] {
        assert!(terminal.is_terminal());
        for next in ALL {
            assert!(
                !terminal.can_transition_to(next),
                "{terminal} must not transition to {next}"
            );
        }
    }
}

#[test]
fn accepting_an_already_accepted_request_is_illegal() {
    // The second accept call finds the request in `accepted` and must be
    // refused; the guarded update in the service turns this into a 409.
    assert!(Pending.can_transition_to(Accepted));
    assert!(!Accepted.can_transition_to(Accepted));
}

#[test]
fn no_self_transitions_anywhere() {
    for state in ALL {
        assert!(!state.can_transition_to(state));
    }
}

#[test]
fn one_directional_lifecycle() {
    // Nothing ever returns to pending.
    for state in [Accepted, InProgress, Rejected, Completed, CustomerCancelled] {
        assert!(!state.can_transition_to(Pending));
    }
}

#[test]
fn customer_cancellation_window() {
    assert!(Pending.cancellable_by_customer());
    assert!(Accepted.cancellable_by_customer());
    assert!(InProgress.cancellable_by_customer());
    assert!(!Rejected.cancellable_by_customer());
    assert!(!Completed.cancellable_by_customer());
    assert!(!CustomerCancelled.cancellable_by_customer());
}

#[test]
fn completed_and_cancelled_gate_ratings() {
    // A customer cancellation is rated as if the service occurred.
    assert!(Completed.rating_eligible());
    assert!(CustomerCancelled.rating_eligible());
    assert!(!Pending.rating_eligible());
    assert!(!Accepted.rating_eligible());
    assert!(!InProgress.rating_eligible());
    assert!(!Rejected.rating_eligible());
}

#[test]
fn wire_names_round_trip() {
    for state in ALL {
        assert_eq!(state.as_str().parse::<RequestStatus>().unwrap(), state);
    }
    assert_eq!(CustomerCancelled.as_str(), "customer-cancelled");
    assert_eq!(InProgress.as_str(), "in-progress");
}
