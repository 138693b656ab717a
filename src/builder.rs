use std::sync::Arc;

use crate::config::{Aggregation, InteractionWeights, RecommenderConfig, StopWordLanguage};
use crate::dataset::{Dataset, PostId, PostMetadata, UserId};
use crate::error::Result;
use crate::factorization::LatentFactors;
use crate::interaction::{BuildReport, InteractionMatrix};
use crate::scorer::{HybridScorer, ScoredPost, UserScores};
use crate::similarity::ContentSimilarity;
use crate::stopwords::StopWords;

use log::{debug, info, trace};

/// One immutable snapshot of everything derived from a dataset.
///
/// Built once by [`RecommenderBuilder::build`]; a refresh builds a new one.
#[derive(Debug)]
pub struct RecommenderModel {
    pub config: RecommenderConfig,
    pub dataset: Arc<Dataset>,
    pub matrix: InteractionMatrix,
    pub factors: LatentFactors,
    pub similarity: ContentSimilarity,
    pub report: BuildReport,
}

impl RecommenderModel {
    pub fn scorer(&self) -> HybridScorer<'_> {
        HybridScorer::new(&self.matrix, &self.factors, &self.similarity)
    }

    /// Top `k` posts for `user_id` with blend weight `alpha`.
    pub fn score(&self, user_id: UserId, k: usize, alpha: f64) -> Result<Vec<ScoredPost>> {
        self.scorer().score(user_id, k, alpha)
    }

    /// Top posts using the configured `default_k` and `default_alpha`.
    pub fn recommend(&self, user_id: UserId) -> Result<Vec<ScoredPost>> {
        self.score(user_id, self.config.default_k, self.config.default_alpha)
    }

    pub fn score_vector(&self, user_id: UserId, alpha: f64) -> Result<UserScores> {
        self.scorer().score_vector(user_id, alpha)
    }

    pub fn user_id_for(&self, username: &str) -> Option<UserId> {
        self.dataset.user_id_for(username)
    }

    pub fn post(&self, post_id: PostId) -> Option<&PostMetadata> {
        self.dataset.post(post_id)
    }
}

pub struct RecommenderBuilder {
    config: RecommenderConfig,
}

impl Default for RecommenderBuilder {
    fn default() -> Self {
        debug!("Creating RecommenderBuilder with default parameters");
        Self {
            config: RecommenderConfig::default(),
        }
    }
}

impl RecommenderBuilder {
    pub fn new() -> Self {
        info!("Initializing new RecommenderBuilder");
        Self::default()
    }

    pub fn from_config(config: RecommenderConfig) -> Self {
        Self { config }
    }

    // -------------------- Interaction matrix --------------------

    pub fn with_weights(mut self, weights: InteractionWeights) -> Self {
        info!("Configuring interaction weights: {:?}", weights);
        self.config.weights = weights;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        info!("Configuring duplicate aggregation: {:?}", aggregation);
        self.config.aggregation = aggregation;
        self
    }

    // -------------------- Factorization --------------------

    /// Requested rank; clamped to `min(users, items)` during build.
    pub fn with_rank(mut self, rank: usize) -> Self {
        info!("Setting factorization rank: {}", rank);
        self.config.rank = rank;
        self
    }

    // -------------------- Content --------------------

    pub fn with_stopwords(mut self, language: StopWordLanguage) -> Self {
        info!("Setting stopword language: {:?}", language);
        self.config.stopwords = language;
        self
    }

    // -------------------- Scoring defaults --------------------

    pub fn with_default_k(mut self, k: usize) -> Self {
        self.config.default_k = k;
        self
    }

    pub fn with_default_alpha(mut self, alpha: f64) -> Self {
        self.config.default_alpha = alpha;
        self
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    // -------------------- Build --------------------

    /// Build the full snapshot from `dataset`.
    ///
    /// Stages:
    ///   1) interaction matrix (bad records dropped and counted)
    ///   2) truncated SVD factors
    ///   3) title TF-IDF similarity aligned to the matrix item axis
    pub fn build(self, dataset: Arc<Dataset>) -> Result<RecommenderModel> {
        self.config.validate()?;
        info!("Building recommender from {} dataset rows", dataset.len());
        debug!("Build configuration: {:?}", self.config);

        trace!("Creating interaction matrix");
        let (matrix, report) = InteractionMatrix::from_records(
            dataset.interactions(),
            &self.config.weights,
            self.config.aggregation,
        )?;

        trace!("Fitting latent factors");
        let factors = LatentFactors::fit(&matrix, self.config.rank)?;
        debug!(
            "Factors fitted with rank {} (requested {})",
            factors.rank, factors.requested_rank
        );

        trace!("Building aligned content similarity");
        let similarity = ContentSimilarity::build(
            matrix.post_ids(),
            dataset.titles(),
            StopWords::for_language(self.config.stopwords),
        )?;

        info!(
            "Recommender build completed: {} users, {} posts, rank {}",
            matrix.nusers, matrix.nitems, factors.rank
        );
        Ok(RecommenderModel {
            config: self.config,
            dataset,
            matrix,
            factors,
            similarity,
            report,
        })
    }
}
