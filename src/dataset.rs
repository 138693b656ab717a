//! The merged upstream dataset: one CSV row per (user, post, interaction).
//!
//! Only `user_id` and `post_id` are structurally required; every other column
//! may be empty. Ids are accepted either as integers or as integral floats
//! (`"42.0"`), which is how tabular exports write integer columns that
//! contain gaps.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info, trace, warn};
use serde::Deserialize;

use crate::error::{RecommendError, Result};

pub type UserId = u64;
pub type PostId = u64;

/// Sentinel returned in place of a missing playable link.
pub const NO_VIDEO_AVAILABLE: &str = "No video available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InteractionType {
    Liked,
    Inspired,
    Viewed,
    Rated,
}

impl InteractionType {
    pub const ALL: [InteractionType; 4] = [
        InteractionType::Liked,
        InteractionType::Inspired,
        InteractionType::Viewed,
        InteractionType::Rated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Liked => "liked",
            InteractionType::Inspired => "inspired",
            InteractionType::Viewed => "viewed",
            InteractionType::Rated => "rated",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "liked" => Ok(InteractionType::Liked),
            "inspired" => Ok(InteractionType::Inspired),
            "viewed" => Ok(InteractionType::Viewed),
            "rated" => Ok(InteractionType::Rated),
            other => Err(format!("unknown interaction type `{}`", other)),
        }
    }
}

/// One entry of the interaction log. Ids are optional because the upstream
/// merge does not guarantee them; the matrix builder drops incomplete records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionRecord {
    pub user_id: Option<UserId>,
    pub post_id: Option<PostId>,
    pub kind: Option<InteractionType>,
}

impl InteractionRecord {
    pub fn new(user_id: UserId, post_id: PostId, kind: InteractionType) -> Self {
        Self {
            user_id: Some(user_id),
            post_id: Some(post_id),
            kind: Some(kind),
        }
    }
}

/// Read-only reference data about a post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostMetadata {
    pub post_id: PostId,
    pub title: Option<String>,
    pub video_link: Option<String>,
    pub category_id: Option<i64>,
    pub category_description: Option<String>,
    pub view_count: Option<u64>,
    pub upvote_count: Option<u64>,
    pub average_rating: Option<f64>,
    pub mood: Option<String>,
}

impl PostMetadata {
    fn new(post_id: PostId) -> Self {
        Self {
            post_id,
            ..Default::default()
        }
    }

    /// Fill fields that are still empty from a later row of the same post.
    fn absorb(&mut self, row: &DatasetRow) {
        fill(&mut self.title, &row.title);
        fill(&mut self.video_link, &row.video_link);
        fill(&mut self.category_id, &row.category_id);
        fill(&mut self.category_description, &row.category_description);
        fill(&mut self.view_count, &row.view_count);
        fill(&mut self.upvote_count, &row.upvote_count);
        fill(&mut self.average_rating, &row.average_rating);
        fill(&mut self.mood, &row.mood);
    }

    /// The playable link, or the "unavailable" sentinel.
    pub fn link_or_sentinel(&self) -> String {
        self.video_link
            .clone()
            .unwrap_or_else(|| NO_VIDEO_AVAILABLE.to_string())
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(value);
    }
}

/// A typed dataset row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetRow {
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub post_id: Option<PostId>,
    pub title: Option<String>,
    pub view_count: Option<u64>,
    pub average_rating: Option<f64>,
    pub upvote_count: Option<u64>,
    pub interaction_type: Option<InteractionType>,
    pub video_link: Option<String>,
    pub category_id: Option<i64>,
    pub category_description: Option<String>,
    pub mood: Option<String>,
}

impl DatasetRow {
    pub fn interaction(user_id: UserId, post_id: PostId, kind: InteractionType) -> Self {
        Self {
            user_id: Some(user_id),
            post_id: Some(post_id),
            interaction_type: Some(kind),
            ..Default::default()
        }
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_video_link(mut self, link: &str) -> Self {
        self.video_link = Some(link.to_string());
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_mood(mut self, mood: &str) -> Self {
        self.mood = Some(mood.to_string());
        self
    }

    pub fn record(&self) -> InteractionRecord {
        InteractionRecord {
            user_id: self.user_id,
            post_id: self.post_id,
            kind: self.interaction_type,
        }
    }
}

/// Row as it comes off the CSV reader; parsed leniently field by field.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRow {
    user_id: Option<String>,
    username: Option<String>,
    post_id: Option<String>,
    title: Option<String>,
    view_count: Option<String>,
    average_rating: Option<String>,
    upvote_count: Option<String>,
    interaction_type: Option<String>,
    video_link: Option<String>,
    category_id: Option<String>,
    category_description: Option<String>,
    #[serde(alias = "Mood")]
    mood: Option<String>,
}

impl RawRow {
    fn into_row(self, line: usize) -> DatasetRow {
        DatasetRow {
            user_id: parse_integral(self.user_id.as_deref(), "user_id", line),
            username: non_empty(self.username),
            post_id: parse_integral(self.post_id.as_deref(), "post_id", line),
            title: non_empty(self.title),
            view_count: parse_integral(self.view_count.as_deref(), "view_count", line),
            average_rating: parse_float(self.average_rating.as_deref(), "average_rating", line),
            upvote_count: parse_integral(self.upvote_count.as_deref(), "upvote_count", line),
            interaction_type: self
                .interaction_type
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .and_then(|s| match s.parse() {
                    Ok(kind) => Some(kind),
                    Err(e) => {
                        trace!("line {}: {}", line, e);
                        None
                    }
                }),
            video_link: non_empty(self.video_link),
            category_id: parse_integral(self.category_id.as_deref(), "category_id", line),
            category_description: non_empty(self.category_description),
            mood: non_empty(self.mood),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("nan"))
}

/// Parse an integer column, accepting integral floats such as `"7.0"`.
fn parse_integral<T>(value: Option<&str>, field: &str, line: usize) -> Option<T>
where
    T: FromStr + TryFrom<i64>,
{
    let raw = value.map(str::trim).filter(|s| !s.is_empty())?;
    if let Ok(v) = raw.parse::<T>() {
        return Some(v);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            T::try_from(f as i64).ok()
        }
        _ => {
            trace!("line {}: cannot parse {} from `{}`", line, field, raw);
            None
        }
    }
}

fn parse_float(value: Option<&str>, field: &str, line: usize) -> Option<f64> {
    let raw = value.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f),
        _ => {
            trace!("line {}: cannot parse {} from `{}`", line, field, raw);
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    /// Rows the CSV reader could not split into fields at all.
    pub malformed_rows: usize,
}

/// The merged dataset plus the lookups derived from it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
    posts: BTreeMap<PostId, PostMetadata>,
    usernames: HashMap<String, UserId>,
    has_mood: bool,
    report: LoadReport,
}

impl Dataset {
    /// Build from typed rows. The mood column counts as present when any row
    /// carries a mood.
    pub fn from_rows(rows: Vec<DatasetRow>) -> Self {
        let has_mood = rows.iter().any(|r| r.mood.is_some());
        let report = LoadReport {
            rows_read: rows.len(),
            malformed_rows: 0,
        };
        Self::index(rows, has_mood, report)
    }

    /// Read the merged CSV. Only an unreadable file or header is fatal;
    /// individual bad rows are skipped and counted.
    pub fn load_csv(path: &Path) -> Result<Self> {
        info!("Loading dataset from {}", path.display());
        let file = std::fs::File::open(path).map_err(|source| RecommendError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let has_mood = headers.iter().any(|h| h.eq_ignore_ascii_case("mood"));
        debug!("Dataset columns: {:?}", headers.iter().collect::<Vec<_>>());

        let mut rows = Vec::new();
        let mut report = LoadReport::default();
        for (i, result) in csv_reader.deserialize::<RawRow>().enumerate() {
            report.rows_read += 1;
            // header is line 1
            let line = i + 2;
            match result {
                Ok(raw) => rows.push(raw.into_row(line)),
                Err(e) => {
                    report.malformed_rows += 1;
                    trace!("line {}: skipping malformed row: {}", line, e);
                }
            }
        }
        if report.malformed_rows > 0 {
            warn!(
                "Skipped {} malformed rows out of {}",
                report.malformed_rows, report.rows_read
            );
        }
        Ok(Self::index(rows, has_mood, report))
    }

    fn index(rows: Vec<DatasetRow>, has_mood: bool, report: LoadReport) -> Self {
        let mut posts: BTreeMap<PostId, PostMetadata> = BTreeMap::new();
        let mut usernames: HashMap<String, UserId> = HashMap::new();

        for row in &rows {
            if let Some(post_id) = row.post_id {
                posts
                    .entry(post_id)
                    .or_insert_with(|| PostMetadata::new(post_id))
                    .absorb(row);
            }
            if let (Some(name), Some(user_id)) = (row.username.as_ref(), row.user_id) {
                usernames.entry(name.clone()).or_insert(user_id);
            }
        }

        info!(
            "Dataset indexed: {} rows, {} posts, {} usernames, mood column: {}",
            rows.len(),
            posts.len(),
            usernames.len(),
            has_mood
        );

        Self {
            rows,
            posts,
            usernames,
            has_mood,
            report,
        }
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn interactions(&self) -> impl Iterator<Item = InteractionRecord> + '_ {
        self.rows.iter().map(DatasetRow::record)
    }

    pub fn post(&self, post_id: PostId) -> Option<&PostMetadata> {
        self.posts.get(&post_id)
    }

    pub fn posts(&self) -> impl Iterator<Item = &PostMetadata> {
        self.posts.values()
    }

    /// Titles of every post that has one, ascending by post id.
    pub fn titles(&self) -> impl Iterator<Item = (PostId, &str)> {
        self.posts
            .values()
            .filter_map(|p| p.title.as_deref().map(|t| (p.post_id, t)))
    }

    /// The user id of the first row carrying `username`.
    pub fn user_id_for(&self, username: &str) -> Option<UserId> {
        self.usernames.get(username).copied()
    }

    pub fn has_mood(&self) -> bool {
        self.has_mood
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
