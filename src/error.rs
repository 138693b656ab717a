//! Error taxonomy for building and querying the recommender.
//!
//! Record-level problems found while building (`Schema`) are absorbed by the
//! builders and only counted; query-level problems (`UnknownUser`,
//! `UserNotFound`, `EmptyInteractionSet`) are recoverable and surface to the
//! caller as typed values.

use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::UserId;

pub type Result<T, E = RecommendError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// A single upstream record is malformed (missing ids, unparsable field).
    #[error("schema error at record {record}: {message}")]
    Schema { record: usize, message: String },

    /// Two structures that must share an item axis disagree.
    #[error("alignment error: {0}")]
    Alignment(String),

    /// The user id is not on the interaction matrix row axis.
    #[error("unknown user id {0}")]
    UnknownUser(UserId),

    /// The username does not appear in the dataset.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// The user exists but has no positive interaction to build content signal from.
    #[error("user {0} has no recorded interactions")]
    EmptyInteractionSet(UserId),

    #[error("dataset has no usable interaction records")]
    EmptyDataset,

    #[error("alpha must lie in [0, 1], got {0}")]
    InvalidAlpha(f64),

    #[error("factorization failed: {0}")]
    Factorization(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl RecommendError {
    /// True for errors that describe a missing signal rather than a fault.
    pub fn is_no_signal(&self) -> bool {
        matches!(
            self,
            RecommendError::UnknownUser(_) | RecommendError::EmptyInteractionSet(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for `{param}`: {value} ({constraint})")]
    Invalid {
        param: String,
        value: String,
        constraint: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(param: &str, value: impl ToString, constraint: &str) -> Self {
        ConfigError::Invalid {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }
}
