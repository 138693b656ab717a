//! Hybrid scoring: collaborative prediction blended with content similarity.
//!
//! For a user `u` with interacted items `I(u)` (weight > 0):
//!
//! ```text
//! predicted = U[u,·] · V
//! content   = mean_{i ∈ I(u)} S[i,·]          (zeros if I(u) is empty)
//! combined  = alpha · predicted + (1 − alpha) · content
//! ```
//!
//! `alpha = 1` ranks purely by the factor model, `alpha = 0` purely by title
//! similarity. Ranking is by combined score descending with ascending
//! `post_id` breaking ties.

use log::{debug, trace};
use serde::Serialize;

use crate::dataset::{PostId, UserId};
use crate::error::{RecommendError, Result};
use crate::factorization::LatentFactors;
use crate::interaction::InteractionMatrix;
use crate::operators::{blend, top_k_by};
use crate::similarity::ContentSimilarity;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredPost {
    pub post_id: PostId,
    pub score: f64,
}

/// All three score vectors of one user, over the full item axis.
#[derive(Debug, Clone)]
pub struct UserScores {
    pub user_id: UserId,
    pub predicted: Vec<f64>,
    pub content: Vec<f64>,
    pub combined: Vec<f64>,
    /// No interacted item: `content` is all zeros.
    pub cold_start: bool,
}

pub fn check_alpha(alpha: f64) -> Result<()> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(RecommendError::InvalidAlpha(alpha))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HybridScorer<'a> {
    matrix: &'a InteractionMatrix,
    factors: &'a LatentFactors,
    similarity: &'a ContentSimilarity,
}

impl<'a> HybridScorer<'a> {
    /// # Panics
    ///
    /// Panics if the three structures do not share the same item axis.
    pub fn new(
        matrix: &'a InteractionMatrix,
        factors: &'a LatentFactors,
        similarity: &'a ContentSimilarity,
    ) -> Self {
        assert_eq!(matrix.nitems, factors.nitems, "factor item axis mismatch");
        assert_eq!(matrix.nusers, factors.nusers, "factor user axis mismatch");
        assert_eq!(matrix.nitems, similarity.nitems, "similarity item axis mismatch");
        Self {
            matrix,
            factors,
            similarity,
        }
    }

    /// Score vectors for `user_id` over every item.
    pub fn score_vector(&self, user_id: UserId, alpha: f64) -> Result<UserScores> {
        check_alpha(alpha)?;
        let row = self
            .matrix
            .user_index(user_id)
            .ok_or(RecommendError::UnknownUser(user_id))?;

        let predicted = self.factors.predict(row);
        let interacted = self.matrix.interacted_items(row);
        let content = self.similarity.mean_of_rows(&interacted);
        let combined = blend(&predicted, &content, alpha);
        trace!(
            "user {}: {} interacted items, alpha {}",
            user_id,
            interacted.len(),
            alpha
        );

        Ok(UserScores {
            user_id,
            predicted,
            content,
            combined,
            cold_start: interacted.is_empty(),
        })
    }

    /// Top `k` posts for `user_id` (fewer only when the catalogue is smaller).
    ///
    /// A cold-start user yields `EmptyInteractionSet` instead of a ranking of
    /// near-zero noise.
    pub fn score(&self, user_id: UserId, k: usize, alpha: f64) -> Result<Vec<ScoredPost>> {
        let scores = self.score_vector(user_id, alpha)?;
        if scores.cold_start {
            debug!("user {} is cold-start, no recommendations", user_id);
            return Err(RecommendError::EmptyInteractionSet(user_id));
        }
        Ok(self.rank(&scores.combined, k))
    }

    /// Rank an arbitrary score vector over the item axis.
    pub fn rank(&self, scores: &[f64], k: usize) -> Vec<ScoredPost> {
        let post_ids = self.matrix.post_ids();
        top_k_by(scores, k, |i| post_ids[i])
            .into_iter()
            .map(|i| ScoredPost {
                post_id: post_ids[i],
                score: scores[i],
            })
            .collect()
    }

    /// Top `k` for every user on the matrix, in row order. Cold-start users
    /// get an empty list.
    pub fn recommend_all(&self, k: usize, alpha: f64) -> Result<Vec<(UserId, Vec<ScoredPost>)>> {
        check_alpha(alpha)?;
        self.matrix
            .user_ids()
            .iter()
            .map(|&u| match self.score(u, k, alpha) {
                Ok(list) => Ok((u, list)),
                Err(RecommendError::EmptyInteractionSet(_)) => Ok((u, Vec::new())),
                Err(e) => Err(e),
            })
            .collect()
    }
}
