//! # Truncated SVD for collaborative prediction
//!
//! The interaction matrix `A` (users × items) is decomposed with a full
//! SVD and truncated to the `r` largest singular triplets:
//!
//! ```text
//! A ≈ U_r · diag(s_r) · V_rᵀ
//! ```
//!
//! The singular values are folded into the user side, so the stored factors
//! are `U = U_r · diag(s_r)` (users × r) and `V = V_rᵀ` (r × items), and the
//! predicted affinity of user `u` for item `i` is the plain dot product
//! `U[u,·] · V[·,i]`.
//!
//! ## Orientation
//!
//! The decomposition always runs on the tall orientation of `A` (more rows
//! than columns). When there are fewer users than items the transpose is
//! decomposed, `Aᵀ = U' S V'ᵀ`, and the roles of the two orthogonal factors
//! are swapped (`A = V' S U'ᵀ`). The product is identical either way.
//!
//! ## Degenerate input
//!
//! All-zero rows or columns (users or posts without any usable weight) carry
//! no energy in any singular direction, so their predictions are zero rather
//! than undefined. A matrix that is zero everywhere skips the decomposition.

use log::{debug, info, trace, warn};
use rayon::prelude::*;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::traits::svd::SVDDecomposable;

use crate::error::{RecommendError, Result};
use crate::interaction::InteractionMatrix;

/// Low-rank factor pair reproducing the interaction matrix.
#[derive(Clone, Debug)]
pub struct LatentFactors {
    pub nusers: usize,
    pub nitems: usize,
    /// Rank actually used.
    pub rank: usize,
    /// Rank asked for before clamping.
    pub requested_rank: usize,
    /// Row-major users × rank.
    pub user_factors: Vec<f64>,
    /// Row-major rank × items.
    pub item_factors: Vec<f64>,
    /// Retained singular values, descending.
    pub singular_values: Vec<f64>,
}

impl LatentFactors {
    /// Fit factors of rank `min(rank, nusers, nitems)`.
    ///
    /// A rank above the matrix limits is clamped with a warning; a rank of
    /// zero is rejected.
    pub fn fit(matrix: &InteractionMatrix, rank: usize) -> Result<Self> {
        let (nusers, nitems) = matrix.shape();
        if rank == 0 {
            return Err(RecommendError::Factorization(
                "rank must be at least 1".to_string(),
            ));
        }
        let max_rank = nusers.min(nitems);
        let effective = if rank > max_rank {
            warn!(
                "Requested rank {} exceeds min(users, items) = {}; clamping",
                rank, max_rank
            );
            max_rank
        } else {
            rank
        };
        info!(
            "Fitting rank-{} factors for {} users × {} items",
            effective, nusers, nitems
        );

        if matrix.data.iter().all(|&x| x == 0.0) {
            debug!("Interaction matrix is all zeros, skipping decomposition");
            return Ok(Self {
                nusers,
                nitems,
                rank: effective,
                requested_rank: rank,
                user_factors: vec![0.0; nusers * effective],
                item_factors: vec![0.0; effective * nitems],
                singular_values: vec![0.0; effective],
            });
        }

        let transposed = nusers < nitems;
        let tall = if transposed {
            matrix.to_dense_transposed()
        } else {
            matrix.to_dense()
        };
        trace!("Decomposing {:?} matrix (transposed: {})", tall.shape(), transposed);

        let svd = tall
            .svd()
            .map_err(|e| RecommendError::Factorization(e.to_string()))?;

        // Column indices of the singular triplets, largest first.
        let mut order: Vec<usize> = (0..svd.s.len()).collect();
        order.sort_by(|&a, &b| {
            svd.s[b].total_cmp(&svd.s[a]).then_with(|| a.cmp(&b))
        });
        order.truncate(effective);
        let singular_values: Vec<f64> = order.iter().map(|&j| svd.s[j]).collect();
        debug!("Retained singular values: {:?}", singular_values);

        // Left factor of the tall matrix spans its rows, right factor its columns.
        let (left, right) = (&svd.U, &svd.V);
        let mut user_factors = vec![0.0; nusers * effective];
        let mut item_factors = vec![0.0; effective * nitems];
        for (k, &j) in order.iter().enumerate() {
            let s = svd.s[j];
            for u in 0..nusers {
                let basis = if transposed {
                    *right.get((u, j))
                } else {
                    *left.get((u, j))
                };
                user_factors[u * effective + k] = basis * s;
            }
            for i in 0..nitems {
                item_factors[k * nitems + i] = if transposed {
                    *left.get((i, j))
                } else {
                    *right.get((i, j))
                };
            }
        }

        if user_factors
            .iter()
            .chain(item_factors.iter())
            .any(|x| !x.is_finite())
        {
            return Err(RecommendError::Factorization(
                "decomposition produced non-finite factors".to_string(),
            ));
        }

        info!("Factorization completed with rank {}", effective);
        Ok(Self {
            nusers,
            nitems,
            rank: effective,
            requested_rank: rank,
            user_factors,
            item_factors,
            singular_values,
        })
    }

    /// Whether the requested rank had to be reduced.
    pub fn was_clamped(&self) -> bool {
        self.rank < self.requested_rank
    }

    #[inline]
    pub fn user_vector(&self, user: usize) -> &[f64] {
        assert!(user < self.nusers, "User index out of bounds");
        &self.user_factors[user * self.rank..(user + 1) * self.rank]
    }

    /// Predicted affinity of `user` for every item: `U[user,·] · V`.
    ///
    /// # Panics
    ///
    /// Panics if `user >= nusers`.
    pub fn predict(&self, user: usize) -> Vec<f64> {
        let u = self.user_vector(user);
        let mut out = vec![0.0; self.nitems];
        for (k, &uk) in u.iter().enumerate() {
            if uk == 0.0 {
                continue;
            }
            let row = &self.item_factors[k * self.nitems..(k + 1) * self.nitems];
            out.iter_mut().zip(row).for_each(|(o, &v)| *o += uk * v);
        }
        out
    }

    /// Full reconstruction `U · V`, row-major users × items.
    pub fn reconstruct(&self) -> Vec<f64> {
        (0..self.nusers)
            .into_par_iter()
            .flat_map_iter(|u| self.predict(u))
            .collect()
    }
}
