//! Small numeric kernels shared by the similarity model and the scorer.
//!
//! - L2 norm and dense dot without allocation
//! - Sorted-index sparse dot (merge join over two index lists)
//! - Column-wise mean of selected rows
//! - Deterministic top-k selection: score descending, then key ascending

use std::cmp::Ordering;

/// Computes the Euclidean norm (L2) without allocating.
#[inline]
pub fn norm(a: &[f64]) -> f64 {
    a.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

/// # Panics
///
/// Panics if the lengths differ.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "Dimension mismatch");
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Dot product of two sparse vectors given as (sorted indices, values).
pub fn sparse_dot(a_idx: &[usize], a_val: &[f64], b_idx: &[usize], b_val: &[f64]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut acc = 0.0;
    while i < a_idx.len() && j < b_idx.len() {
        match a_idx[i].cmp(&b_idx[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                acc += a_val[i] * b_val[j];
                i += 1;
                j += 1;
            }
        }
    }
    acc
}

/// Mean of `rows` selected from a row-major `n`-column matrix.
/// An empty selection yields a zero vector.
pub fn mean_rows(data: &[f64], ncols: usize, rows: &[usize]) -> Vec<f64> {
    let mut out = vec![0.0; ncols];
    if rows.is_empty() {
        return out;
    }
    for &r in rows {
        let row = &data[r * ncols..(r + 1) * ncols];
        out.iter_mut().zip(row).for_each(|(o, &v)| *o += v);
    }
    let n = rows.len() as f64;
    out.iter_mut().for_each(|o| *o /= n);
    out
}

/// `alpha * a + (1 - alpha) * b`, element-wise.
pub fn blend(a: &[f64], b: &[f64], alpha: f64) -> Vec<f64> {
    assert_eq!(a.len(), b.len(), "Dimension mismatch");
    a.iter()
        .zip(b)
        .map(|(&x, &y)| alpha * x + (1.0 - alpha) * y)
        .collect()
}

/// Indices of the `k` largest scores. NaN ranks last; ties resolve by ascending
/// `key(index)` so the order is total and repeatable.
pub fn top_k_by<K: Ord>(scores: &[f64], k: usize, key: impl Fn(usize) -> K) -> Vec<usize> {
    let clean: Vec<f64> = scores
        .iter()
        .map(|&s| if s.is_nan() { f64::NEG_INFINITY } else { s + 0.0 })
        .collect();
    let mut idx: Vec<usize> = (0..scores.len()).collect();
    idx.sort_by(|&a, &b| {
        clean[b]
            .total_cmp(&clean[a])
            .then_with(|| key(a).cmp(&key(b)))
    });
    idx.truncate(k);
    idx
}
