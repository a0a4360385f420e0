//! Rarefaction curves: observed richness as a function of sampling depth.

use crate::data::CountMatrix;
use crate::error::{Result, SurveyError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Richness summary at one subsampling depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RarefactionPoint {
    /// Number of observations drawn.
    pub depth: usize,
    /// Mean number of distinct categories over the replicates.
    pub mean_richness: f64,
    /// Sample standard deviation of richness (0 for a single replicate).
    pub std_dev: f64,
}

/// Empirical rarefaction curve for sample `i`.
///
/// Every depth is drawn `replicates` times without replacement. Depths above
/// the sample's total count are skipped, so the curve may be shorter than
/// `depths`.
///
/// # Errors
/// `AlreadyNormalized` for a matrix of relative abundances,
/// `InvalidParameter` for zero replicates, plus the errors of
/// [`CountMatrix::sample_richness`].
pub fn rarefaction_curve<R: Rng + ?Sized>(
    counts: &CountMatrix,
    i: usize,
    depths: &[usize],
    replicates: usize,
    rng: &mut R,
) -> Result<Vec<RarefactionPoint>> {
    if counts.is_normalized() {
        return Err(SurveyError::AlreadyNormalized(
            "rarefaction curve".to_string(),
        ));
    }
    if replicates == 0 {
        return Err(SurveyError::InvalidParameter(
            "replicates must be at least 1".to_string(),
        ));
    }
    let available: u64 = counts.counts_row(i)?.iter().sum();

    let mut curve = Vec::with_capacity(depths.len());
    for &depth in depths {
        if depth as u64 > available {
            tracing::debug!(depth, available, "skipping depth above sample total");
            continue;
        }
        let richness = (0..replicates)
            .map(|_| counts.sample_richness(i, depth, rng).map(|r| r as f64))
            .collect::<Result<Vec<f64>>>()?;

        let mean_richness = (&richness).mean();
        let std_dev = if replicates > 1 {
            (&richness).std_dev()
        } else {
            0.0
        };
        curve.push(RarefactionPoint {
            depth,
            mean_richness,
            std_dev,
        });
    }
    Ok(curve)
}

impl CountMatrix {
    /// Rarefaction curve for sample `i` (see [`rarefaction_curve`]).
    pub fn rarefaction_curve<R: Rng + ?Sized>(
        &self,
        i: usize,
        depths: &[usize],
        replicates: usize,
        rng: &mut R,
    ) -> Result<Vec<RarefactionPoint>> {
        rarefaction_curve(self, i, depths, replicates, rng)
    }
}
