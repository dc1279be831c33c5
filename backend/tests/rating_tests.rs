//! Tests for the rating aggregate computation

use proptest::prelude::*;
use shared::rating_aggregate;

#[test]
fn no_ratings_reads_as_zeros() {
    let summary = rating_aggregate(&[]);
    assert_eq!(summary.avg_rating, 0.0);
    assert_eq!(summary.total_ratings, 0);
}

#[test]
fn single_rating_is_its_own_mean() {
    let summary = rating_aggregate(&[4]);
    assert_eq!(summary.avg_rating, 4.0);
    assert_eq!(summary.total_ratings, 1);
}

#[test]
fn mean_is_exact_within_one_decimal_rounding() {
    // mean(5, 4, 4) = 4.333… → 4.3
    let summary = rating_aggregate(&[5, 4, 4]);
    assert_eq!(summary.avg_rating, 4.3);
    assert_eq!(summary.total_ratings, 3);

    // mean(5, 4) = 4.5 stays 4.5
    let summary = rating_aggregate(&[5, 4]);
    assert_eq!(summary.avg_rating, 4.5);

    // mean(2, 3, 3) = 2.666… → 2.7
    let summary = rating_aggregate(&[2, 3, 3]);
    assert_eq!(summary.avg_rating, 2.7);
}

#[test]
fn count_tracks_every_submission() {
    let scores = [5, 5, 4, 3, 2, 1, 5];
    let summary = rating_aggregate(&scores);
    assert_eq!(summary.total_ratings, scores.len() as i64);
}

proptest! {
    /// avg == mean(scores) rounded to one decimal and count == N, for any
    /// set of valid scores.
    #[test]
    fn aggregate_matches_arithmetic_mean(scores in prop::collection::vec(1i32..=5, 1..100)) {
        let summary = rating_aggregate(&scores);

        let exact: f64 = scores.iter().map(|s| *s as f64).sum::<f64>() / scores.len() as f64;
        let rounded = (exact * 10.0).round() / 10.0;

        prop_assert_eq!(summary.avg_rating, rounded);
        prop_assert_eq!(summary.total_ratings, scores.len() as i64);
        prop_assert!((1.0..=5.0).contains(&summary.avg_rating));
    }
}
