use approx::assert_abs_diff_eq;

use crate::config::StopWordLanguage;
use crate::error::RecommendError;
use crate::similarity::{align, pairwise_cosine, ContentSimilarity};
use crate::stopwords::StopWords;
use crate::tfidf::TfIdfVectorizer;

fn english() -> StopWords {
    StopWords::for_language(StopWordLanguage::English)
}

const TITLES: [(u64, &str); 4] = [
    (10, "cats and dogs"),
    (20, "dogs only"),
    (30, "cars"),
    (40, "fast cars and cats"),
];

#[test]
fn test_pairwise_cosine_symmetric_with_unit_diagonal() {
    crate::tests::init();
    let docs: Vec<&str> = TITLES.iter().map(|(_, t)| *t).collect();
    let tfidf = TfIdfVectorizer::new(english()).fit_transform(&docs);
    let s = pairwise_cosine(&tfidf);
    let n = docs.len();
    assert_eq!(s.len(), n * n);
    for i in 0..n {
        assert_eq!(s[i * n + i], 1.0);
        for j in 0..n {
            assert_eq!(s[i * n + j], s[j * n + i]);
            assert!((0.0..=1.0).contains(&s[i * n + j]));
        }
    }
    // cats/dogs vs dogs only share a term, cats/dogs vs cars do not
    assert!(s[1] > 0.0);
    assert_eq!(s[2], 0.0);
}

#[test]
fn test_align_reindexes_by_id() {
    // corpus order [20, 10], axis [10, 20, 30]
    let raw = vec![
        1.0, 0.3, //
        0.3, 1.0,
    ];
    let aligned = align(&raw, &[20, 10], &[10, 20, 30]).unwrap();
    assert_eq!(
        aligned,
        vec![
            1.0, 0.3, 0.0, //
            0.3, 1.0, 0.0, //
            0.0, 0.0, 0.0,
        ]
    );

    let asym = vec![
        1.0, 0.7, //
        0.2, 1.0,
    ];
    let aligned = align(&asym, &[20, 10], &[10, 20]).unwrap();
    // row 10 of the corpus is raw row 1
    assert_eq!(aligned, vec![1.0, 0.2, 0.7, 1.0]);
}

#[test]
fn test_align_rejects_non_square_input() {
    let err = align(&[1.0, 0.0, 0.0], &[1, 2], &[1, 2]).unwrap_err();
    assert!(matches!(err, RecommendError::Alignment(_)));
}

#[test]
fn test_build_independent_of_title_order() {
    crate::tests::init();
    let axis = [10, 20, 30, 40];
    let forward = ContentSimilarity::build(&axis, TITLES.iter().copied(), english()).unwrap();
    let backward =
        ContentSimilarity::build(&axis, TITLES.iter().rev().copied(), english()).unwrap();
    for (a, b) in forward.data.iter().zip(&backward.data) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
    assert!(forward.get(0, 1) > 0.0);
    assert_eq!(forward.get(0, 2), 0.0);
    assert!(forward.get(2, 3) > 0.0);
}

#[test]
fn test_missing_titles_zero_filled() {
    // 50 is on the axis but untitled, 99 is titled but off the axis,
    // 60 keeps no term after stopword removal
    let titles = vec![(10, "cats and dogs"), (99, "cats"), (20, "dogs"), (60, "the only")];
    let s = ContentSimilarity::build(&[10, 20, 50, 60], titles, english()).unwrap();
    assert_eq!(s.nitems, 4);
    assert_eq!(s.has_title, vec![true, true, false, false]);
    assert!(s.row(2).iter().all(|&x| x == 0.0));
    assert!(s.row(3).iter().all(|&x| x == 0.0));
    assert_eq!(s.get(1, 1), 1.0);
}

#[test]
fn test_first_title_wins() {
    let titles = vec![(1, "cars"), (2, "cars"), (1, "boats")];
    let s = ContentSimilarity::build(&[1, 2], titles, english()).unwrap();
    assert_abs_diff_eq!(s.get(0, 1), 1.0, epsilon = 1e-12);
}

#[test]
fn test_mean_of_rows() {
    let s = ContentSimilarity::build(&[10, 20, 30, 40], TITLES.iter().copied(), english()).unwrap();
    let mean = s.mean_of_rows(&[0, 2]);
    for j in 0..4 {
        assert_abs_diff_eq!(mean[j], (s.get(0, j) + s.get(2, j)) / 2.0, epsilon = 1e-12);
    }
    assert_eq!(s.mean_of_rows(&[]), vec![0.0; 4]);
}
