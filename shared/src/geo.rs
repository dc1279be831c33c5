//! Geospatial ranking engine
//!
//! Great-circle distance plus the rating-then-distance ordering used by
//! provider discovery. Candidates without a location are skipped rather
//! than treated as errors.

use crate::types::GeoPoint;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A candidate the ranking engine can place.
pub trait GeoRanked {
    fn location(&self) -> Option<GeoPoint>;
    fn rating(&self) -> f64;
}

/// A ranked candidate with its computed distance from the origin.
#[derive(Debug, Clone)]
pub struct Ranked<T> {
    pub candidate: T,
    pub distance_km: f64,
}

/// Haversine great-circle distance between two points, in kilometers.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Round a distance to two decimal places for display.
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Rank candidates by descending rating, breaking ties by ascending
/// distance from `origin`. Candidates with no location are dropped. The
/// sort is stable, so equally-rated equidistant candidates keep their
/// input order.
pub fn rank_providers<T: GeoRanked>(origin: GeoPoint, candidates: Vec<T>) -> Vec<Ranked<T>> {
    let mut ranked: Vec<Ranked<T>> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let location = candidate.location()?;
            Some(Ranked {
                distance_km: haversine_km(origin, location),
                candidate,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.candidate
            .rating()
            .total_cmp(&a.candidate.rating())
            .then(a.distance_km.total_cmp(&b.distance_km))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Candidate {
        name: &'static str,
        rating: f64,
        location: Option<GeoPoint>,
    }

    impl GeoRanked for Candidate {
        fn location(&self) -> Option<GeoPoint> {
            self.location
        }

        fn rating(&self) -> f64 {
            self.rating
        }
    }

    const KATHMANDU: GeoPoint = GeoPoint {
        longitude: 85.3,
        latitude: 27.7,
    };

    #[test]
    fn haversine_known_distance() {
        // Kathmandu to Pokhara is roughly 145 km as the crow flies.
        let pokhara = GeoPoint::new(83.9856, 28.2096);
        let km = haversine_km(KATHMANDU, pokhara);
        assert!((140.0..150.0).contains(&km), "got {km}");
    }

    #[test]
    fn haversine_zero_for_same_point() {
        assert_eq!(haversine_km(KATHMANDU, KATHMANDU), 0.0);
    }

    #[test]
    fn round_km_two_decimals() {
        assert_eq!(round_km(1.23456), 1.23);
        assert_eq!(round_km(0.005), 0.01);
    }

    #[test]
    fn higher_rating_wins_regardless_of_distance() {
        let near_low = Candidate {
            name: "near",
            rating: 3.0,
            location: Some(GeoPoint::new(85.301, 27.701)),
        };
        let far_high = Candidate {
            name: "far",
            rating: 4.5,
            location: Some(GeoPoint::new(85.4, 27.8)),
        };
        let ranked = rank_providers(KATHMANDU, vec![near_low, far_high]);
        assert_eq!(ranked[0].candidate.name, "far");
        assert_eq!(ranked[1].candidate.name, "near");
    }

    #[test]
    fn equal_rating_ties_break_by_distance() {
        // Two plumbers at 4.5 stars, ~1.2 km and ~0.8 km away: the closer
        // one must come first.
        let farther = Candidate {
            name: "farther",
            rating: 4.5,
            location: Some(GeoPoint::new(85.3122, 27.7)),
        };
        let closer = Candidate {
            name: "closer",
            rating: 4.5,
            location: Some(GeoPoint::new(85.3081, 27.7)),
        };
        let ranked = rank_providers(KATHMANDU, vec![farther.clone(), closer.clone()]);
        assert_eq!(ranked[0].candidate.name, "closer");
        assert!(ranked[0].distance_km < ranked[1].distance_km);
    }

    #[test]
    fn missing_location_is_skipped_not_an_error() {
        let located = Candidate {
            name: "located",
            rating: 4.0,
            location: Some(GeoPoint::new(85.31, 27.71)),
        };
        let unlocated = Candidate {
            name: "unlocated",
            rating: 5.0,
            location: None,
        };
        let ranked = rank_providers(KATHMANDU, vec![unlocated, located]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate.name, "located");
    }

    #[test]
    fn ranking_invariant_holds_pairwise() {
        let candidates = vec![
            Candidate {
                name: "a",
                rating: 4.0,
                location: Some(GeoPoint::new(85.32, 27.72)),
            },
            Candidate {
                name: "b",
                rating: 5.0,
                location: Some(GeoPoint::new(85.35, 27.75)),
            },
            Candidate {
                name: "c",
                rating: 4.0,
                location: Some(GeoPoint::new(85.31, 27.71)),
            },
            Candidate {
                name: "d",
                rating: 2.5,
                location: Some(GeoPoint::new(85.3, 27.7)),
            },
        ];
        let ranked = rank_providers(KATHMANDU, candidates);
        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.candidate.rating() > b.candidate.rating()
                    || (a.candidate.rating() == b.candidate.rating()
                        && a.distance_km <= b.distance_km)
            );
        }
    }
}
