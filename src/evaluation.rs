//! Offline ranking metrics over every user of a model.
//!
//! Ground truth for a user is the set of items with a positive weight in the
//! interaction matrix. Each metric is computed per user at cutoff `k` and
//! averaged:
//!
//! - Precision@K = hits / k
//! - Recall@K    = hits / |relevant| (0 when nothing is relevant)
//! - MRR         = 1 / rank of the first hit (0 without a hit)
//! - NDCG@K      = DCG / IDCG with gain `1 / log2(position + 2)`

use std::collections::HashSet;

use log::info;
use serde::Serialize;

use crate::builder::RecommenderModel;
use crate::dataset::PostId;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub users: usize,
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub mrr: f64,
    pub ndcg_at_k: f64,
}

/// Metrics of one ranked list against one relevant set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UserMetrics {
    pub precision: f64,
    pub recall: f64,
    pub reciprocal_rank: f64,
    pub ndcg: f64,
}

pub fn user_metrics(recommended: &[PostId], relevant: &HashSet<PostId>, k: usize) -> UserMetrics {
    if k == 0 {
        return UserMetrics::default();
    }
    let top = &recommended[..recommended.len().min(k)];
    let hits = top.iter().filter(|p| relevant.contains(p)).count();

    let precision = hits as f64 / k as f64;
    let recall = if relevant.is_empty() {
        0.0
    } else {
        hits as f64 / relevant.len() as f64
    };
    let reciprocal_rank = top
        .iter()
        .position(|p| relevant.contains(p))
        .map(|i| 1.0 / (i + 1) as f64)
        .unwrap_or(0.0);

    let gain = |i: usize| 1.0 / ((i + 2) as f64).log2();
    let dcg: f64 = top
        .iter()
        .enumerate()
        .filter(|(_, p)| relevant.contains(p))
        .map(|(i, _)| gain(i))
        .sum();
    let idcg: f64 = (0..relevant.len().min(k)).map(gain).sum();
    let ndcg = if idcg > 0.0 { dcg / idcg } else { 0.0 };

    UserMetrics {
        precision,
        recall,
        reciprocal_rank,
        ndcg,
    }
}

/// Score every user at cutoff `k` with blend weight `alpha` and average.
pub fn evaluate(model: &RecommenderModel, k: usize, alpha: f64) -> Result<EvaluationReport> {
    info!("Evaluating recommendations at k={} alpha={}", k, alpha);
    let scorer = model.scorer();
    let all = scorer.recommend_all(k, alpha)?;
    let post_ids = model.matrix.post_ids();

    let mut sums = UserMetrics::default();
    for (row, (_, recs)) in all.iter().enumerate() {
        let relevant: HashSet<PostId> = model
            .matrix
            .interacted_items(row)
            .into_iter()
            .map(|i| post_ids[i])
            .collect();
        let ids: Vec<PostId> = recs.iter().map(|s| s.post_id).collect();
        let m = user_metrics(&ids, &relevant, k);
        sums.precision += m.precision;
        sums.recall += m.recall;
        sums.reciprocal_rank += m.reciprocal_rank;
        sums.ndcg += m.ndcg;
    }

    let users = all.len();
    let n = users.max(1) as f64;
    let report = EvaluationReport {
        k,
        users,
        precision_at_k: sums.precision / n,
        recall_at_k: sums.recall / n,
        mrr: sums.reciprocal_rank / n,
        ndcg_at_k: sums.ndcg / n,
    };
    info!("Evaluation: {:?}", report);
    Ok(report)
}
