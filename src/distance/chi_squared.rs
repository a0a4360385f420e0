//! Chi-squared distance between samples.
//!
//! With P the relative frequency table (counts divided by the grand total)
//! and pj its column marginals:
//!
//! ```text
//! d(a, b) = sqrt( sum_c (P[a,c] - P[b,c])^2 / pj[c] )
//! ```

use super::pairwise;
use crate::data::{CountMatrix, DissimilarityMatrix, LabeledMatrix, Marginals, Metric};
use crate::error::{Result, SurveyError};

/// Compute the chi-squared distance matrix between the rows of `matrix`.
///
/// Returns the distances together with the row and column marginals of
/// the relative frequency table.
///
/// # Errors
/// - `ZeroTotal` if the grand total is zero (this includes a matrix without
///   columns)
/// - `EmptyColumn` if a column sums to zero
pub fn chi_squared(matrix: &LabeledMatrix) -> Result<(DissimilarityMatrix, Marginals)> {
    let total = matrix.total();
    if total <= 0.0 {
        return Err(SurveyError::ZeroTotal(
            "grand total is zero, cannot build a relative frequency table".to_string(),
        ));
    }

    let freq = matrix.values() / total;
    let row_marginals: Vec<f64> = freq.column_sum().iter().copied().collect();
    let col_marginals: Vec<f64> = freq.row_sum().iter().copied().collect();
    if let Some(c) = col_marginals.iter().position(|&pj| pj <= 0.0) {
        return Err(SurveyError::EmptyColumn {
            label: matrix.col_labels()[c].clone(),
        });
    }

    let distances = pairwise(freq.nrows(), |a, b| {
        let sum: f64 = freq
            .row(a)
            .iter()
            .zip(freq.row(b).iter())
            .zip(&col_marginals)
            .map(|((&pa, &pb), &pj)| (pa - pb) * (pa - pb) / pj)
            .sum();
        Ok(sum.sqrt())
    })?;

    let labels = matrix.row_labels().to_vec();
    let dm = DissimilarityMatrix::new(
        LabeledMatrix::new(distances, labels.clone(), labels)?,
        Some(Metric::ChiSquared),
    )?;
    Ok((
        dm,
        Marginals {
            rows: row_marginals,
            cols: col_marginals,
        },
    ))
}

impl CountMatrix {
    /// Chi-squared distances between samples. The marginals of the
    /// relative frequency table are stored on the matrix for reuse.
    pub fn chi_squared_distance(&mut self) -> Result<DissimilarityMatrix> {
        let (dm, marginals) = chi_squared(self.matrix())?;
        self.set_marginals(marginals);
        Ok(dm)
    }
}
