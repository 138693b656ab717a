//! Tunable constants of the recommender.
//!
//! Every field has a default so a TOML file only needs to name what it
//! overrides:
//!
//! ```toml
//! rank = 32
//! default_alpha = 0.7
//! aggregation = "max"
//!
//! [weights]
//! viewed = 1.0
//! inspired = 1.5
//! ```

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::dataset::InteractionType;
use crate::error::ConfigError;

pub const DEFAULT_RANK: usize = 50;
pub const DEFAULT_K: usize = 10;
pub const DEFAULT_ALPHA: f64 = 0.5;

/// Strength of each interaction type. `None` means the type carries no
/// signal and records of that type are skipped while building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractionWeights {
    pub liked: Option<f64>,
    pub inspired: Option<f64>,
    pub viewed: Option<f64>,
    pub rated: Option<f64>,
}

impl Default for InteractionWeights {
    fn default() -> Self {
        Self {
            liked: Some(1.0),
            inspired: None,
            viewed: Some(0.5),
            rated: Some(2.0),
        }
    }
}

impl InteractionWeights {
    pub fn weight(&self, kind: InteractionType) -> Option<f64> {
        match kind {
            InteractionType::Liked => self.liked,
            InteractionType::Inspired => self.inspired,
            InteractionType::Viewed => self.viewed,
            InteractionType::Rated => self.rated,
        }
    }

    pub fn with(mut self, kind: InteractionType, weight: Option<f64>) -> Self {
        match kind {
            InteractionType::Liked => self.liked = weight,
            InteractionType::Inspired => self.inspired = weight,
            InteractionType::Viewed => self.viewed = weight,
            InteractionType::Rated => self.rated = weight,
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for kind in InteractionType::ALL {
            if let Some(w) = self.weight(kind) {
                if !w.is_finite() || w < 0.0 {
                    return Err(ConfigError::invalid(
                        &format!("weights.{}", kind.as_str()),
                        w,
                        "must be finite and non-negative",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// How repeated (user, post) interactions collapse into one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Mean,
    Max,
    /// The record appearing last in the log wins.
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopWordLanguage {
    #[default]
    English,
    /// Keep every token.
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecommenderConfig {
    pub weights: InteractionWeights,
    pub aggregation: Aggregation,
    /// Requested factorization rank, clamped to `min(users, items)` at fit time.
    pub rank: usize,
    pub default_k: usize,
    pub default_alpha: f64,
    pub stopwords: StopWordLanguage,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            weights: InteractionWeights::default(),
            aggregation: Aggregation::default(),
            rank: DEFAULT_RANK,
            default_k: DEFAULT_K,
            default_alpha: DEFAULT_ALPHA,
            stopwords: StopWordLanguage::default(),
        }
    }
}

impl RecommenderConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: RecommenderConfig =
            toml::from_str(contents).map_err(|source| ConfigError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading recommender config from {}", path.display());
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents, path)?;
        debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rank == 0 {
            return Err(ConfigError::invalid("rank", self.rank, "must be at least 1"));
        }
        if self.default_k == 0 {
            return Err(ConfigError::invalid(
                "default_k",
                self.default_k,
                "must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.default_alpha) {
            return Err(ConfigError::invalid(
                "default_alpha",
                self.default_alpha,
                "must lie in [0, 1]",
            ));
        }
        self.weights.validate()
    }
}
