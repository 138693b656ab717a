//! Query boundary of the recommender.
//!
//! The service owns exactly one active [`RecommenderModel`] snapshot. Queries
//! clone the `Arc` under a read lock held for the clone only, so they never
//! wait on each other. A refresh builds the next snapshot with no lock held
//! and then swaps the pointer; queries already running keep the snapshot they
//! started with.
//!
//! [`RecommendationService::feed`] is the transport-agnostic contract: it
//! never fails, it returns a [`FeedReply`] carrying an HTTP-style status and a
//! JSON-serialisable body.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::builder::{RecommenderBuilder, RecommenderModel};
use crate::config::RecommenderConfig;
use crate::dataset::{Dataset, PostId, NO_VIDEO_AVAILABLE};
use crate::error::{RecommendError, Result};

/// Where a refresh reloads the dataset from.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    Csv(PathBuf),
    InMemory(Arc<Dataset>),
}

impl DatasetSource {
    pub fn load(&self) -> Result<Arc<Dataset>> {
        match self {
            DatasetSource::Csv(path) => Ok(Arc::new(Dataset::load_csv(path)?)),
            DatasetSource::InMemory(dataset) => Ok(Arc::clone(dataset)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedQuery {
    pub username: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default, alias = "Mood")]
    pub mood: Option<String>,
}

impl FeedQuery {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_mood(mut self, mood: &str) -> Self {
        self.mood = Some(mood.to_string());
        self
    }
}

/// Outcome of a successful query.
#[derive(Debug, Clone, PartialEq)]
pub enum Feed {
    /// Posts in rank order with positionally matching links.
    Recommended {
        post_ids: Vec<PostId>,
        video_links: Vec<String>,
    },
    /// The user is known but there is no signal to rank with.
    NoRecommendations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    Ok,
    NoRecommendations,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeedBody {
    Feed {
        username: String,
        recommended_posts: Vec<PostId>,
        video_links: Vec<String>,
        status: FeedStatus,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        username: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedReply {
    pub status: u16,
    pub body: FeedBody,
}

impl FeedReply {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.body)
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

pub struct RecommendationService {
    source: DatasetSource,
    config: RecommenderConfig,
    snapshot: RwLock<Arc<RecommenderModel>>,
    refreshing: Mutex<()>,
}

impl RecommendationService {
    /// Load the dataset and build the first snapshot. Failure here is the one
    /// fatal error of the system.
    pub fn start(source: DatasetSource, config: RecommenderConfig) -> Result<Self> {
        info!("Starting recommendation service");
        let model = Self::build_snapshot(&source, &config)?;
        Ok(Self {
            source,
            config,
            snapshot: RwLock::new(Arc::new(model)),
            refreshing: Mutex::new(()),
        })
    }

    fn build_snapshot(source: &DatasetSource, config: &RecommenderConfig) -> Result<RecommenderModel> {
        let dataset = source.load()?;
        RecommenderBuilder::from_config(config.clone()).build(dataset)
    }

    /// The snapshot currently served.
    pub fn snapshot(&self) -> Arc<RecommenderModel> {
        self.snapshot.read().clone()
    }

    /// Rebuild from the configured source and swap the new snapshot in.
    /// On failure the previous snapshot stays active.
    pub fn refresh(&self) -> Result<()> {
        let _guard = self.refreshing.lock();
        info!("Refreshing recommender snapshot");
        let model = Self::build_snapshot(&self.source, &self.config)?;
        *self.snapshot.write() = Arc::new(model);
        info!("Snapshot swapped");
        Ok(())
    }

    /// Rebuild from an explicit dataset instead of the configured source.
    pub fn refresh_with(&self, dataset: Arc<Dataset>) -> Result<()> {
        let _guard = self.refreshing.lock();
        let model = RecommenderBuilder::from_config(self.config.clone()).build(dataset)?;
        *self.snapshot.write() = Arc::new(model);
        info!("Snapshot swapped from supplied dataset");
        Ok(())
    }

    /// Typed query: resolve the user, score, filter, dedup, resolve links.
    pub fn recommend(&self, query: &FeedQuery) -> Result<Feed> {
        let model = self.snapshot();
        let user_id = model
            .user_id_for(&query.username)
            .ok_or_else(|| RecommendError::UserNotFound(query.username.clone()))?;

        let scored = match model.recommend(user_id) {
            Ok(scored) => scored,
            Err(e) if e.is_no_signal() => {
                debug!("{}: {}", query.username, e);
                return Ok(Feed::NoRecommendations);
            }
            Err(e) => return Err(e),
        };

        if query.mood.is_some() && !model.dataset.has_mood() {
            warn!("Mood filter requested but the dataset has no mood column; ignoring");
        }

        let mut seen = HashSet::new();
        let post_ids: Vec<PostId> = scored
            .iter()
            .map(|s| s.post_id)
            .filter(|&p| Self::matches(&model, p, query))
            .filter(|&p| seen.insert(p))
            .collect();
        let video_links = post_ids
            .iter()
            .map(|&p| {
                model
                    .post(p)
                    .map(|meta| meta.link_or_sentinel())
                    .unwrap_or_else(|| NO_VIDEO_AVAILABLE.to_string())
            })
            .collect();

        Ok(Feed::Recommended {
            post_ids,
            video_links,
        })
    }

    fn matches(model: &RecommenderModel, post_id: PostId, query: &FeedQuery) -> bool {
        let mood = query.mood.as_ref().filter(|_| model.dataset.has_mood());
        if query.category_id.is_none() && mood.is_none() {
            return true;
        }
        let Some(meta) = model.post(post_id) else {
            return false;
        };
        if let Some(category) = query.category_id {
            if meta.category_id != Some(category) {
                return false;
            }
        }
        if let Some(mood) = mood {
            if meta.mood.as_ref() != Some(mood) {
                return false;
            }
        }
        true
    }

    /// Transport-facing query. Never fails; errors become 404/500 replies.
    pub fn feed(&self, query: &FeedQuery) -> FeedReply {
        match self.recommend(query) {
            Ok(Feed::Recommended {
                post_ids,
                video_links,
            }) => FeedReply {
                status: 200,
                body: FeedBody::Feed {
                    username: query.username.clone(),
                    recommended_posts: post_ids,
                    video_links,
                    status: FeedStatus::Ok,
                },
            },
            Ok(Feed::NoRecommendations) => FeedReply {
                status: 200,
                body: FeedBody::Feed {
                    username: query.username.clone(),
                    recommended_posts: Vec::new(),
                    video_links: Vec::new(),
                    status: FeedStatus::NoRecommendations,
                },
            },
            Err(RecommendError::UserNotFound(username)) => FeedReply {
                status: 404,
                body: FeedBody::Error {
                    error: "User not found".to_string(),
                    username: Some(username),
                },
            },
            Err(e) => {
                error!("feed query for {} failed: {}", query.username, e);
                FeedReply {
                    status: 500,
                    body: FeedBody::Error {
                        error: e.to_string(),
                        username: None,
                    },
                }
            }
        }
    }
}
