//! Dense user×item interaction matrix.
//!
//! Rows are users in ascending `user_id` order, columns are posts in
//! ascending `post_id` order. Both orders are fixed for the lifetime of the
//! matrix and every downstream structure (factors, aligned similarity) is
//! indexed by them.
//!
//! Storage is a flattened row-major `Vec<f64>`: `data[u * nitems + i]`.
//! Absent cells are `0.0`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, info, trace, warn};
use smartcore::linalg::basic::arrays::Array2;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::config::{Aggregation, InteractionWeights};
use crate::dataset::{InteractionRecord, InteractionType, PostId, UserId};
use crate::error::{RecommendError, Result};

/// Counters describing what happened to the interaction log during a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub records_read: usize,
    pub records_used: usize,
    pub skipped_missing_ids: usize,
    pub skipped_unmapped_type: usize,
    /// Records that landed on an already populated (user, post) cell.
    pub duplicates_collapsed: usize,
}

impl BuildReport {
    pub fn skipped(&self) -> usize {
        self.skipped_missing_ids + self.skipped_unmapped_type
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    sum: f64,
    count: usize,
    max: f64,
    last: f64,
}

impl Cell {
    fn push(&mut self, w: f64) {
        self.max = if self.count == 0 { w } else { self.max.max(w) };
        self.sum += w;
        self.last = w;
        self.count += 1;
    }

    fn value(&self, aggregation: Aggregation) -> f64 {
        match aggregation {
            Aggregation::Sum => self.sum,
            Aggregation::Mean => self.sum / self.count as f64,
            Aggregation::Max => self.max,
            Aggregation::Last => self.last,
        }
    }
}

/// Check that a record names both ids; the type is checked separately
/// because an unmapped type is configuration, not a schema problem.
pub fn validate_record(position: usize, record: &InteractionRecord) -> Result<(UserId, PostId)> {
    match (record.user_id, record.post_id) {
        (Some(u), Some(p)) => Ok((u, p)),
        (None, _) => Err(RecommendError::Schema {
            record: position,
            message: "missing user_id".to_string(),
        }),
        (_, None) => Err(RecommendError::Schema {
            record: position,
            message: "missing post_id".to_string(),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    pub nusers: usize,
    pub nitems: usize,
    pub data: Vec<f64>,
    user_ids: Vec<UserId>,
    post_ids: Vec<PostId>,
    user_index: HashMap<UserId, usize>,
    post_index: HashMap<PostId, usize>,
}

impl InteractionMatrix {
    /// Build the matrix from an interaction log.
    ///
    /// Records missing an id are dropped (`Schema`), records whose type has
    /// no configured weight are dropped, repeated (user, post) pairs collapse
    /// through `aggregation`. Fails only when nothing usable remains.
    pub fn from_records<I>(
        records: I,
        weights: &InteractionWeights,
        aggregation: Aggregation,
    ) -> Result<(Self, BuildReport)>
    where
        I: IntoIterator<Item = InteractionRecord>,
    {
        info!("Building interaction matrix (aggregation: {:?})", aggregation);
        let mut report = BuildReport::default();
        let mut cells: BTreeMap<(UserId, PostId), Cell> = BTreeMap::new();

        for (position, record) in records.into_iter().enumerate() {
            report.records_read += 1;
            let (user_id, post_id) = match validate_record(position, &record) {
                Ok(ids) => ids,
                Err(e) => {
                    trace!("{}", e);
                    report.skipped_missing_ids += 1;
                    continue;
                }
            };
            let Some(weight) = record.kind.and_then(|k: InteractionType| weights.weight(k)) else {
                trace!(
                    "record {}: interaction type {:?} has no weight",
                    position,
                    record.kind
                );
                report.skipped_unmapped_type += 1;
                continue;
            };

            let cell = cells.entry((user_id, post_id)).or_default();
            if cell.count > 0 {
                report.duplicates_collapsed += 1;
            }
            cell.push(weight);
            report.records_used += 1;
        }

        if report.skipped() > 0 {
            warn!(
                "Dropped {} of {} interaction records ({} missing ids, {} unmapped types)",
                report.skipped(),
                report.records_read,
                report.skipped_missing_ids,
                report.skipped_unmapped_type
            );
        }
        if cells.is_empty() {
            return Err(RecommendError::EmptyDataset);
        }

        let user_ids: Vec<UserId> = cells
            .keys()
            .map(|&(u, _)| u)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let post_ids: Vec<PostId> = cells
            .keys()
            .map(|&(_, p)| p)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let user_index: HashMap<UserId, usize> =
            user_ids.iter().enumerate().map(|(i, &u)| (u, i)).collect();
        let post_index: HashMap<PostId, usize> =
            post_ids.iter().enumerate().map(|(i, &p)| (p, i)).collect();

        let (nusers, nitems) = (user_ids.len(), post_ids.len());
        let mut data = vec![0.0; nusers * nitems];
        for (&(u, p), cell) in &cells {
            data[user_index[&u] * nitems + post_index[&p]] = cell.value(aggregation);
        }

        info!(
            "Interaction matrix built: {} users × {} posts, {} non-zero cells",
            nusers,
            nitems,
            cells.len()
        );
        debug!("Build report: {:?}", report);

        Ok((
            Self {
                nusers,
                nitems,
                data,
                user_ids,
                post_ids,
                user_index,
                post_index,
            },
            report,
        ))
    }

    /// Returns (nusers, nitems).
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nusers, self.nitems)
    }

    #[inline]
    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    #[inline]
    pub fn post_ids(&self) -> &[PostId] {
        &self.post_ids
    }

    #[inline]
    pub fn user_index(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    #[inline]
    pub fn post_index(&self, post_id: PostId) -> Option<usize> {
        self.post_index.get(&post_id).copied()
    }

    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn get(&self, user: usize, item: usize) -> f64 {
        assert!(
            user < self.nusers && item < self.nitems,
            "Index out of bounds: ({}, {}) for shape {:?}",
            user,
            item,
            self.shape()
        );
        self.data[user * self.nitems + item]
    }

    /// Zero-copy view of one user's weights over all items.
    #[inline]
    pub fn user_row(&self, user: usize) -> &[f64] {
        assert!(user < self.nusers, "User index out of bounds");
        let start = user * self.nitems;
        &self.data[start..start + self.nitems]
    }

    /// Item indices with a strictly positive weight for `user`.
    pub fn interacted_items(&self, user: usize) -> Vec<usize> {
        self.user_row(user)
            .iter()
            .enumerate()
            .filter(|(_, &w)| w > 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Copy into a smartcore matrix, users as rows.
    pub fn to_dense(&self) -> DenseMatrix<f64> {
        DenseMatrix::from_iterator(self.data.iter().copied(), self.nusers, self.nitems, 0)
    }

    /// Copy into a smartcore matrix, items as rows.
    pub fn to_dense_transposed(&self) -> DenseMatrix<f64> {
        let nitems = self.nitems;
        let nusers = self.nusers;
        let flat = (0..nitems).flat_map(|i| (0..nusers).map(move |u| (u, i)));
        DenseMatrix::from_iterator(
            flat.map(|(u, i)| self.data[u * nitems + i]),
            nitems,
            nusers,
            0,
        )
    }
}
