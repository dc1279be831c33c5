//! Tests for the geospatial ranking engine
//!
//! Includes the discovery scenario: two equally-rated plumbers at 0.8 km
//! and 1.2 km from the customer must rank closest-first.

use proptest::prelude::*;
use shared::{haversine_km, rank_providers, round_km, GeoPoint, GeoRanked};

#[derive(Debug, Clone)]
struct Plumber {
    name: &'static str,
    rating: f64,
    location: Option<GeoPoint>,
}

impl GeoRanked for Plumber {
    fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    fn rating(&self) -> f64 {
        self.rating
    }
}

// Customer position used throughout (longitude, latitude).
const CUSTOMER: GeoPoint = GeoPoint {
    longitude: 85.3,
    latitude: 27.7,
};

/// A point roughly `km` kilometers east of the customer.
fn east_of_customer(km: f64) -> GeoPoint {
    // One longitude degree at 27.7° N is ~98.6 km.
    GeoPoint::new(CUSTOMER.longitude + km / 98.6, CUSTOMER.latitude)
}

#[test]
fn haversine_is_zero_at_the_origin() {
    assert_eq!(haversine_km(CUSTOMER, CUSTOMER), 0.0);
}

#[test]
fn haversine_matches_known_city_distance() {
    // Kathmandu to Pokhara, ~145 km great-circle.
    let pokhara = GeoPoint::new(83.9856, 28.2096);
    let km = haversine_km(CUSTOMER, pokhara);
    assert!((140.0..150.0).contains(&km), "got {km}");
}

#[test]
fn display_rounding_is_two_decimals() {
    assert_eq!(round_km(1.2345), 1.23);
    assert_eq!(round_km(0.799), 0.8);
}

#[test]
fn equal_ratings_rank_by_distance() {
    // Two online verified plumbers, both 4.5 stars, at ~1.2 km and ~0.8 km:
    // the 0.8 km provider must be listed first.
    let farther = Plumber {
        name: "farther",
        rating: 4.5,
        location: Some(east_of_customer(1.2)),
    };
    let closer = Plumber {
        name: "closer",
        rating: 4.5,
        location: Some(east_of_customer(0.8)),
    };

    let ranked = rank_providers(CUSTOMER, vec![farther, closer]);
    assert_eq!(ranked[0].candidate.name, "closer");
    assert_eq!(ranked[1].candidate.name, "farther");
    assert!((round_km(ranked[0].distance_km) - 0.8).abs() < 0.05);
    assert!((round_km(ranked[1].distance_km) - 1.2).abs() < 0.05);
}

#[test]
fn rating_dominates_distance() {
    let near_but_low = Plumber {
        name: "near-low",
        rating: 3.9,
        location: Some(east_of_customer(0.2)),
    };
    let far_but_high = Plumber {
        name: "far-high",
        rating: 4.8,
        location: Some(east_of_customer(5.0)),
    };

    let ranked = rank_providers(CUSTOMER, vec![near_but_low, far_but_high]);
    assert_eq!(ranked[0].candidate.name, "far-high");
}

#[test]
fn unlocated_candidates_are_dropped_silently() {
    let located = Plumber {
        name: "located",
        rating: 4.0,
        location: Some(east_of_customer(1.0)),
    };
    let unlocated = Plumber {
        name: "unlocated",
        rating: 5.0,
        location: None,
    };

    let ranked = rank_providers(CUSTOMER, vec![unlocated, located]);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].candidate.name, "located");
}

#[test]
fn stable_for_identical_candidates() {
    let a = Plumber {
        name: "first",
        rating: 4.0,
        location: Some(east_of_customer(1.0)),
    };
    let b = Plumber {
        name: "second",
        rating: 4.0,
        location: Some(east_of_customer(1.0)),
    };

    let ranked = rank_providers(CUSTOMER, vec![a, b]);
    assert_eq!(ranked[0].candidate.name, "first");
    assert_eq!(ranked[1].candidate.name, "second");
}

proptest! {
    /// For any ranked pair A before B: A.rating > B.rating, or equal
    /// ratings with A no farther than B.
    #[test]
    fn ranking_invariant(
        specs in prop::collection::vec((0u8..=50, -50i32..=50, -50i32..=50), 0..20)
    ) {
        let candidates: Vec<Plumber> = specs
            .iter()
            .map(|(rating, dx, dy)| Plumber {
                name: "p",
                rating: *rating as f64 / 10.0,
                location: Some(GeoPoint::new(
                    CUSTOMER.longitude + *dx as f64 / 1000.0,
                    CUSTOMER.latitude + *dy as f64 / 1000.0,
                )),
            })
            .collect();

        let ranked = rank_providers(CUSTOMER, candidates);
        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.candidate.rating() > b.candidate.rating()
                    || (a.candidate.rating() == b.candidate.rating()
                        && a.distance_km <= b.distance_km)
            );
        }
    }
}
