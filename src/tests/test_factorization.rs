use approx::assert_abs_diff_eq;

use crate::config::{Aggregation, InteractionWeights};
use crate::dataset::{InteractionRecord, InteractionType::*};
use crate::error::RecommendError;
use crate::factorization::LatentFactors;
use crate::interaction::InteractionMatrix;

fn matrix(log: Vec<InteractionRecord>) -> InteractionMatrix {
    let weights = InteractionWeights::default().with(Viewed, Some(0.0));
    InteractionMatrix::from_records(log, &weights, Aggregation::Sum)
        .unwrap()
        .0
}

fn square() -> InteractionMatrix {
    matrix(vec![
        InteractionRecord::new(1, 1, Liked),
        InteractionRecord::new(1, 3, Rated),
        InteractionRecord::new(2, 2, Rated),
        InteractionRecord::new(2, 3, Liked),
        InteractionRecord::new(3, 1, Rated),
        InteractionRecord::new(3, 2, Liked),
    ])
}

#[test]
fn test_full_rank_reconstructs_exactly() {
    crate::tests::init();
    let m = square();
    let f = LatentFactors::fit(&m, 3).unwrap();
    assert_eq!(f.rank, 3);
    assert!(!f.was_clamped());

    let rebuilt = f.reconstruct();
    for (a, b) in rebuilt.iter().zip(&m.data) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-9);
    }
}

#[test]
fn test_rank_is_clamped() {
    crate::tests::init();
    let m = square();
    let f = LatentFactors::fit(&m, 50).unwrap();
    assert_eq!(f.rank, 3);
    assert_eq!(f.requested_rank, 50);
    assert!(f.was_clamped());
    assert_eq!(f.user_factors.len(), 3 * 3);
    assert_eq!(f.item_factors.len(), 3 * 3);
}

#[test]
fn test_zero_rank_rejected() {
    let err = LatentFactors::fit(&square(), 0).unwrap_err();
    assert!(matches!(err, RecommendError::Factorization(_)));
}

#[test]
fn test_singular_values_descending() {
    let f = LatentFactors::fit(&square(), 3).unwrap();
    assert!(f
        .singular_values
        .windows(2)
        .all(|w| w[0] >= w[1]));
    assert!(f.singular_values[0] > 0.0);
}

#[test]
fn test_wide_matrix_uses_transpose() {
    crate::tests::init();
    // 2 users × 4 posts
    let m = matrix(vec![
        InteractionRecord::new(1, 1, Liked),
        InteractionRecord::new(1, 2, Rated),
        InteractionRecord::new(1, 4, Liked),
        InteractionRecord::new(2, 3, Rated),
        InteractionRecord::new(2, 4, Liked),
    ]);
    assert_eq!(m.shape(), (2, 4));
    let f = LatentFactors::fit(&m, 10).unwrap();
    assert_eq!(f.rank, 2);

    for u in 0..2 {
        let predicted = f.predict(u);
        assert_eq!(predicted.len(), 4);
        for (a, b) in predicted.iter().zip(m.user_row(u)) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_truncation_keeps_dominant_direction() {
    // rank-1 matrix: every row a multiple of [1, 2, 0]
    let m = matrix(vec![
        InteractionRecord::new(1, 1, Liked),
        InteractionRecord::new(1, 2, Rated),
        InteractionRecord::new(2, 1, Rated),
        InteractionRecord::new(2, 2, Rated),
        InteractionRecord::new(2, 2, Rated),
        InteractionRecord::new(3, 1, Liked),
        InteractionRecord::new(3, 2, Rated),
        InteractionRecord::new(3, 3, Viewed),
    ]);
    let f = LatentFactors::fit(&m, 1).unwrap();
    assert_eq!(f.rank, 1);
    for (a, b) in f.reconstruct().iter().zip(&m.data) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-9);
    }
}

#[test]
fn test_zero_row_predicts_zero() {
    // user 2 only viewed, and viewed weighs 0 here
    let m = matrix(vec![
        InteractionRecord::new(1, 1, Liked),
        InteractionRecord::new(1, 2, Rated),
        InteractionRecord::new(2, 1, Viewed),
        InteractionRecord::new(3, 2, Liked),
    ]);
    let f = LatentFactors::fit(&m, 2).unwrap();
    let row = m.user_index(2).unwrap();
    for p in f.predict(row) {
        assert_abs_diff_eq!(p, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn test_all_zero_matrix_skips_decomposition() {
    let m = matrix(vec![
        InteractionRecord::new(1, 1, Viewed),
        InteractionRecord::new(2, 2, Viewed),
    ]);
    let f = LatentFactors::fit(&m, 5).unwrap();
    assert_eq!(f.rank, 2);
    assert!(f.reconstruct().iter().all(|&x| x == 0.0));
}
