//! Pairwise sample dissimilarities.
//!
//! - **chi_squared**: chi-squared distance on the relative frequency table
//! - **bray_curtis**: Bray-Curtis dissimilarity on counts

pub mod bray_curtis;
pub mod chi_squared;

pub use bray_curtis::bray_curtis;
pub use chi_squared::chi_squared;

use crate::error::Result;
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Fill an n×n symmetric zero-diagonal matrix from `f(i, j)` for i < j.
///
/// Each sample i is scored against all later samples in parallel; the lower
/// triangle is a mirror of the upper one.
pub(crate) fn pairwise<F>(n: usize, f: F) -> Result<DMatrix<f64>>
where
    F: Fn(usize, usize) -> Result<f64> + Sync,
{
    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            ((i + 1)..n)
                .map(|j| f(i, j))
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = DMatrix::zeros(n, n);
    for (i, scores) in upper.iter().enumerate() {
        for (k, &d) in scores.iter().enumerate() {
            let j = i + 1 + k;
            out[(i, j)] = d;
            out[(j, i)] = d;
        }
    }
    Ok(out)
}
