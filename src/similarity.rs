//! Title-based content similarity aligned to the interaction item axis.
//!
//! The similarity is first computed in *corpus order* (the order posts appear
//! in the title corpus) and then re-indexed onto the interaction matrix
//! columns. The two orders generally differ, so re-indexing goes through an
//! explicit `post_id → corpus index` map; positions are never assumed to
//! line up.
//!
//! Posts on the item axis that have no title, or whose title keeps no term
//! after stopword removal, get an all-zero row and column, diagonal included.

use std::collections::{HashMap, HashSet};

use log::{debug, info, trace};
use rayon::prelude::*;

use crate::dataset::PostId;
use crate::error::{RecommendError, Result};
use crate::operators::{mean_rows, sparse_dot};
use crate::stopwords::StopWords;
use crate::tfidf::{TfIdfMatrix, TfIdfVectorizer};

/// Row-major n×n cosine similarity of the TF-IDF rows, in corpus order.
///
/// Values are clamped into [0, 1]; documents with at least one term have an
/// exact 1.0 on the diagonal.
pub fn pairwise_cosine(tfidf: &TfIdfMatrix) -> Vec<f64> {
    let n = tfidf.ndocs();
    debug!("Computing {}×{} pairwise cosine similarities", n, n);
    (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            let (ai, av) = tfidf.row(i);
            (0..n).map(move |j| {
                if i == j {
                    return if ai.is_empty() { 0.0 } else { 1.0 };
                }
                let (bi, bv) = tfidf.row(j);
                sparse_dot(ai, av, bi, bv).clamp(0.0, 1.0)
            })
        })
        .collect()
}

/// Re-index a corpus-ordered similarity matrix onto `axis_ids`.
///
/// Axis posts missing from `corpus_ids` get zero rows and columns. Fails
/// only if `raw` is not square over `corpus_ids`.
pub fn align(raw: &[f64], corpus_ids: &[PostId], axis_ids: &[PostId]) -> Result<Vec<f64>> {
    let m = corpus_ids.len();
    if raw.len() != m * m {
        return Err(RecommendError::Alignment(format!(
            "similarity has {} cells, expected {}×{}",
            raw.len(),
            m,
            m
        )));
    }
    let corpus_index: HashMap<PostId, usize> =
        corpus_ids.iter().enumerate().map(|(i, &p)| (p, i)).collect();
    let resolved: Vec<Option<usize>> = axis_ids
        .iter()
        .map(|p| corpus_index.get(p).copied())
        .collect();
    let missing = resolved.iter().filter(|r| r.is_none()).count();
    if missing > 0 {
        debug!("{} posts have no title vector, zero-filling", missing);
    }

    let n = axis_ids.len();
    let mut aligned = vec![0.0; n * n];
    for (i, ri) in resolved.iter().enumerate() {
        let Some(ci) = *ri else { continue };
        for (j, rj) in resolved.iter().enumerate() {
            if let Some(cj) = *rj {
                aligned[i * n + j] = raw[ci * m + cj];
            }
        }
    }
    Ok(aligned)
}

/// Item×item similarity sharing the interaction matrix column order.
#[derive(Debug, Clone)]
pub struct ContentSimilarity {
    pub nitems: usize,
    /// Row-major nitems × nitems.
    pub data: Vec<f64>,
    /// Whether each axis item has a non-empty title vector.
    pub has_title: Vec<bool>,
}

impl ContentSimilarity {
    /// Vectorize the titles of the posts on `axis_ids` and align the result.
    ///
    /// `titles` may name posts outside the axis; those are ignored. The first
    /// title seen for a post wins.
    pub fn build<'a, I>(axis_ids: &[PostId], titles: I, stopwords: StopWords) -> Result<Self>
    where
        I: IntoIterator<Item = (PostId, &'a str)>,
    {
        info!("Building content similarity for {} posts", axis_ids.len());
        let on_axis: HashSet<PostId> = axis_ids.iter().copied().collect();
        let mut seen = HashSet::new();
        let (corpus_ids, docs): (Vec<PostId>, Vec<&str>) = titles
            .into_iter()
            .filter(|(p, t)| on_axis.contains(p) && !t.trim().is_empty())
            .filter(|(p, _)| seen.insert(*p))
            .unzip();
        trace!("Title corpus order: {:?}", corpus_ids);

        let tfidf = TfIdfVectorizer::new(stopwords).fit_transform(&docs);
        let raw = pairwise_cosine(&tfidf);
        let data = align(&raw, &corpus_ids, axis_ids)?;

        let n = axis_ids.len();
        let has_title: Vec<bool> = (0..n).map(|i| data[i * n + i] > 0.0).collect();
        info!(
            "Content similarity aligned: {} of {} posts carry a title vector",
            has_title.iter().filter(|&&h| h).count(),
            n
        );

        Ok(Self {
            nitems: n,
            data,
            has_title,
        })
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.nitems && j < self.nitems, "Index out of bounds");
        self.data[i * self.nitems + j]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.nitems, "Index out of bounds");
        &self.data[i * self.nitems..(i + 1) * self.nitems]
    }

    /// Column-wise mean of the rows in `items`; zeros for an empty set.
    pub fn mean_of_rows(&self, items: &[usize]) -> Vec<f64> {
        mean_rows(&self.data, self.nitems, items)
    }
}
