//! # postrec
//!
//! Hybrid post recommender. Collaborative filtering over a user×post
//! interaction matrix (truncated SVD) is blended with TF-IDF title
//! similarity aligned onto the same item axis.
//!
//! ```text
//! dataset ─► InteractionMatrix ─┬─► LatentFactors ─────┐
//!                               └─► ContentSimilarity ─┴─► HybridScorer ─► RecommendationService
//! ```
//!
//! Everything derived from the dataset is rebuilt as one immutable
//! [`builder::RecommenderModel`] snapshot.

pub mod builder;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod factorization;
pub mod interaction;
pub mod operators;
pub mod scorer;
pub mod service;
pub mod similarity;
pub mod stopwords;
pub mod tfidf;

pub use builder::{RecommenderBuilder, RecommenderModel};
pub use config::RecommenderConfig;
pub use error::{RecommendError, Result};
pub use service::{FeedQuery, FeedReply, RecommendationService};

#[cfg(test)]
mod tests;
